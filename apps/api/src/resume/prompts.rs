/// Rewrite of a single resume section. Replace: {section}, {industry}, {current}
pub const IMPROVE_PROMPT_TEMPLATE: &str = r#"As an expert resume writer, improve the following {section} description for a {industry} professional.
Make it more impactful, quantifiable, and aligned with industry standards.
Current content: "{current}"

Requirements:
1. Use action verbs
2. Include metrics and results where possible
3. Highlight relevant technical skills
4. Keep it concise but detailed
5. Focus on achievements over responsibilities
6. Use industry-specific keywords
7. Do not add anything except the improved content

Format the response as a single paragraph without any additional text or explanations."#;

/// ATS analysis. Replace: {resume}, {job_description}
pub const ATS_PROMPT_TEMPLATE: &str = r#"Analyze the resume below against the job description as an ATS (Applicant Tracking System) and an experienced resume reviewer.

Resume Content:
{resume}

Job Description:
{job_description}

Return a JSON object with exactly this structure:
{
  "score": <integer between 0 and 100>,
  "feedback": {
    "summary": "<brief overview>",
    "skillsAlignment": "<skills match analysis>",
    "experienceMatch": "<experience relevance>",
    "improvements": "<key improvement areas>"
  }
}"#;

/// Used when the user has not set an industry yet.
pub const GENERIC_INDUSTRY: &str = "general";
