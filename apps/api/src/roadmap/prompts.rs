/// Roadmap generation. Replace: {goal}, {motivation}, {existing_knowledge},
/// {hours_per_day}, {duration}, {schedule_pattern}, {domain}, {subdomain},
/// {exercises_count}, {extras}
pub const ROADMAP_PROMPT_TEMPLATE: &str = r#"Create a personalized, comprehensive and actionable learning roadmap from the profile below.

User Profile:
- Goal: {goal}
- Motivation: {motivation}
- Existing Knowledge: {existing_knowledge}
- Learning Plan: {hours_per_day} hours per day for {duration}, following a {schedule_pattern} schedule.
- Domain: {domain}
- Subdomain: {subdomain}
- Exercises: include {exercises_count} practical exercises.
- Additional Notes: {extras}

Return a JSON object with a "title" and an array of "milestones".
Each milestone has a "title", a "description" and a "tasks" array.
Each task has a "title", a "description" and a "type", one of "learning", "project" or "assessment".

Example:
{
  "title": "Roadmap to become a Data Scientist in 4 weeks",
  "milestones": [
    {
      "title": "Phase 1: Foundations",
      "description": "Learn the core skills for your domain.",
      "tasks": [
        {
          "title": "Master Python for Data",
          "description": "Cover topics like Pandas, NumPy, and Matplotlib.",
          "type": "learning"
        }
      ]
    }
  ]
}"#;
