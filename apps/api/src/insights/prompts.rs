/// Industry analysis. Replace: {industry}
pub const INSIGHTS_PROMPT_TEMPLATE: &str = r#"Analyze the current state of the {industry} industry, with a primary focus on the Indian market (Bengaluru, Mumbai, Delhi-NCR, Hyderabad) and a comparative view of key international markets (USA, Europe).

Return a JSON object in exactly this format:
{
  "salaryRanges": [
    { "role": "string", "min": number, "max": number, "median": number, "location": "string" }
  ],
  "growthRate": number,
  "demandLevel": "HIGH" | "MEDIUM" | "LOW",
  "topSkills": ["skill1", "skill2"],
  "marketOutlook": "POSITIVE" | "NEUTRAL" | "NEGATIVE",
  "keyTrends": ["trend1", "trend2"],
  "recommendedSkills": ["skill1", "skill2"]
}

"salaryRanges" should include at least 5 common roles, mixing major Indian cities and international hubs.
Salaries are in lakhs of rupees. Growth rate is a percentage.
Include at least 5 skills and 5 trends relevant to both the Indian and global markets."#;
