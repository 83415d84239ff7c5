// LLM prompt templates for interview sessions.

/// Question generation prompt. Replace: {question_count}, {role},
/// {focus_instructions}, {session_instructions}, {custom_section},
/// {difficulty}, {industry}, {tech_stack}
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Generate exactly {question_count} interview questions for a {role} position.

{focus_instructions}

{session_instructions}

{custom_section}

Additional context:
- Role: {role}
- Experience level: {difficulty}
- Industry: {industry}
- Tech stack / skills: {tech_stack}
- Question count required: EXACTLY {question_count} questions

Requirements:
- Return ONLY the questions as a JSON array of strings
- Do not include explanations or additional text
- Avoid characters that break voice assistants (/, *, etc.)
- Make questions clear and conversational
- Match the specified experience level
- Follow the interview focus percentages above

Format:
["Question 1", "Question 2", "Question 3"]"#;

pub const BEHAVIORAL_FOCUS: &str = "INTERVIEW FOCUS: BEHAVIORAL
- 90% behavioral questions (STAR scenarios, past experiences, soft skills)
- 10% general questions
- Focus on leadership, teamwork, problem-solving, communication, conflict resolution
- Start questions with phrases like \"Tell me about a time...\", \"Describe a situation...\"";

pub const TECHNICAL_FOCUS: &str = "INTERVIEW FOCUS: TECHNICAL
- 90% technical questions (coding, system design, concepts, debugging)
- 10% general questions
- Include questions about specific technologies, algorithms and technical decisions
- Assess depth and practical application";

pub const MIXED_FOCUS: &str = "INTERVIEW FOCUS: MIXED
- 50% technical questions
- 40% behavioral questions
- 10% general / company-culture questions";

pub const ASSESSMENT_SESSION: &str = "SESSION TYPE: SKILLS ASSESSMENT (about 15 minutes)
- Quick, focused questions that assess core competencies
- Concise and direct; higher difficulty is appropriate";

pub const PRACTICE_SESSION: &str = "SESSION TYPE: PRACTICE (about 20 minutes)
- Moderate complexity with good variety
- Questions should help the candidate improve";

pub const MOCK_SESSION: &str = "SESSION TYPE: FULL MOCK INTERVIEW (30+ minutes)
- Comprehensive, realistic interview flow
- Complexity ranges from basic to advanced, with follow-up style questions";

/// Replace: {instructions}
pub const CUSTOM_INSTRUCTIONS_TEMPLATE: &str = "SPECIAL INSTRUCTIONS FROM THE CANDIDATE:
{instructions}

Incorporate these where relevant. If specific technologies, frameworks or topics are mentioned, include questions about them.";

/// Feedback prompt. Replace: {transcript}
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"You are analyzing a mock interview. Evaluate the candidate's performance based on the transcript below.

TRANSCRIPT:
{transcript}

INSTRUCTIONS:
- Provide scores from 0 to 100 for each category listed below.
- Return ONLY valid JSON in exactly this format:
{
  "totalScore": number,
  "categoryScores": [
    {"name": "Communication Skills", "score": number, "comment": "..."},
    {"name": "Technical Knowledge", "score": number, "comment": "..."},
    {"name": "Problem Solving", "score": number, "comment": "..."},
    {"name": "Cultural Fit", "score": number, "comment": "..."},
    {"name": "Confidence and Clarity", "score": number, "comment": "..."}
  ],
  "strengths": ["..."],
  "areasForImprovement": ["..."],
  "finalAssessment": "..."
}
Be concise."#;

/// System prompt for the voice interviewer. Replace: {role}, {difficulty}, {questions}
pub const INTERVIEWER_SYSTEM_TEMPLATE: &str = "You are a professional job interviewer conducting a real-time voice interview with a candidate.
Interview context:
- Position: {role}
- Level: {difficulty}

Follow this structured question flow:
{questions}

Be professional yet warm. Keep your turns brief and ask follow-ups when needed.";

/// Replace: {role}
pub const INTERVIEWER_FIRST_MESSAGE: &str = "Hello! Thank you for taking the time to speak with me today. \
    I'm excited to learn more about you and your experience for the {role} position.";
