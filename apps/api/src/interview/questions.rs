//! Interview question generation.
//!
//! The model is asked for a JSON array of questions. Whatever comes back is
//! recovered, then normalised to exactly the requested count. If the model
//! call fails or nothing usable comes back, a deterministic question set is
//! built from fixed pools instead.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::prompts::{
    ASSESSMENT_SESSION, BEHAVIORAL_FOCUS, CUSTOM_INSTRUCTIONS_TEMPLATE, MIXED_FOCUS,
    MOCK_SESSION, PRACTICE_SESSION, QUESTIONS_PROMPT_TEMPLATE, TECHNICAL_FOCUS,
};
use crate::llm_client::prompts::coach_json_system;
use crate::llm_client::TextGenerator;
use crate::recovery::{recover, FieldKind, SchemaSpec};

pub const DEFAULT_QUESTION_COUNT: usize = 8;
pub const MAX_QUESTION_COUNT: usize = 12;
pub const DEFAULT_DURATION_MINUTES: i32 = 30;
pub const DEFAULT_DIFFICULTY: &str = "intermediate";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Behavioral,
    Technical,
    #[default]
    Mixed,
}

impl InterviewType {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewType::Behavioral => "behavioral",
            InterviewType::Technical => "technical",
            InterviewType::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Assessment,
    Practice,
    #[default]
    Mock,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Assessment => "assessment",
            SessionType::Practice => "practice",
            SessionType::Mock => "mock",
        }
    }
}

/// Request body shared by question preview and session creation.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewRequest {
    pub role: String,
    #[serde(default)]
    pub interview_type: InterviewType,
    #[serde(default)]
    pub session_type: SessionType,
    pub difficulty: Option<String>,
    pub industry: Option<String>,
    pub tech_stack: Option<String>,
    pub question_count: Option<usize>,
    pub duration_minutes: Option<i32>,
    pub custom_instructions: Option<String>,
}

impl InterviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.role.trim().is_empty() {
            return Err(AppError::Validation("role cannot be empty".to_string()));
        }
        if let Some(count) = self.question_count {
            if !(1..=MAX_QUESTION_COUNT).contains(&count) {
                return Err(AppError::Validation(format!(
                    "question_count must be between 1 and {MAX_QUESTION_COUNT}"
                )));
            }
        }
        if let Some(minutes) = self.duration_minutes {
            if !(1..=180).contains(&minutes) {
                return Err(AppError::Validation(
                    "duration_minutes must be between 1 and 180".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn question_count(&self) -> usize {
        self.question_count.unwrap_or(DEFAULT_QUESTION_COUNT)
    }

    pub fn difficulty(&self) -> &str {
        self.difficulty
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DIFFICULTY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQuestions {
    pub questions: Vec<String>,
    pub source: QuestionSource,
}

/// Generates questions for `request`, never failing: model errors and
/// unusable output both end in the fallback set.
pub async fn generate_questions(
    generator: &dyn TextGenerator,
    request: &InterviewRequest,
    user_skills: &[String],
) -> GeneratedQuestions {
    let count = request.question_count();
    let prompt = build_questions_prompt(request, user_skills);

    let raw = match generator.generate(&prompt, &coach_json_system()).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Question generation failed for role '{}': {e}", request.role);
            return fallback(request);
        }
    };

    let schema = SchemaSpec::list(FieldKind::text(), 1);
    let recovered = recover::<Vec<String>, _>(&raw, &schema, Vec::new);
    if recovered.is_fallback() {
        return fallback(request);
    }

    let generated = recovered.into_payload();
    if generated.len() != count {
        warn!(
            "Model returned {} questions, expected {}; normalising",
            generated.len(),
            count
        );
    }
    let pool = fallback_questions(request.interview_type, count, &request.role);
    let questions = normalize_count(generated, count, &pool);
    info!("Generated {} questions for role '{}'", questions.len(), request.role);

    GeneratedQuestions {
        questions,
        source: QuestionSource::Model,
    }
}

fn fallback(request: &InterviewRequest) -> GeneratedQuestions {
    GeneratedQuestions {
        questions: fallback_questions(
            request.interview_type,
            request.question_count(),
            &request.role,
        ),
        source: QuestionSource::Fallback,
    }
}

pub fn build_questions_prompt(request: &InterviewRequest, user_skills: &[String]) -> String {
    let focus = match request.interview_type {
        InterviewType::Behavioral => BEHAVIORAL_FOCUS,
        InterviewType::Technical => TECHNICAL_FOCUS,
        InterviewType::Mixed => MIXED_FOCUS,
    };
    let session = match request.session_type {
        SessionType::Assessment => ASSESSMENT_SESSION,
        SessionType::Practice => PRACTICE_SESSION,
        SessionType::Mock => MOCK_SESSION,
    };
    let custom = request
        .custom_instructions
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| CUSTOM_INSTRUCTIONS_TEMPLATE.replace("{instructions}", c))
        .unwrap_or_default();
    let tech_stack = request
        .tech_stack
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .or_else(|| (!user_skills.is_empty()).then(|| user_skills.join(", ")))
        .unwrap_or_else(|| "Not specified".to_string());

    QUESTIONS_PROMPT_TEMPLATE
        .replace("{focus_instructions}", focus)
        .replace("{session_instructions}", session)
        .replace("{custom_section}", &custom)
        .replace("{question_count}", &request.question_count().to_string())
        .replace("{role}", request.role.trim())
        .replace("{difficulty}", request.difficulty())
        .replace("{industry}", request.industry.as_deref().unwrap_or("General"))
        .replace("{tech_stack}", &tech_stack)
}

const GENERIC_QUESTIONS: [&str; 5] = [
    "Tell me about a challenging situation you faced and how you handled it.",
    "What motivates you in your work?",
    "How do you handle feedback and criticism?",
    "Describe your ideal work environment.",
    "What questions do you have for me about this role?",
];

/// Truncates to `count`, or pads with generic questions and then from `pool`,
/// skipping duplicates.
pub fn normalize_count(mut questions: Vec<String>, count: usize, pool: &[String]) -> Vec<String> {
    questions.truncate(count);
    let padding = GENERIC_QUESTIONS
        .iter()
        .map(|q| q.to_string())
        .chain(pool.iter().cloned());
    for candidate in padding {
        if questions.len() >= count {
            break;
        }
        if !questions.contains(&candidate) {
            questions.push(candidate);
        }
    }
    questions
}

const BEHAVIORAL_QUESTIONS: [&str; 12] = [
    "Tell me about yourself and your background.",
    "Describe a challenging situation you faced and how you handled it.",
    "Tell me about a time you disagreed with a colleague and how you resolved it.",
    "Give me an example of when you had to work under tight deadlines.",
    "Describe a time when you had to learn something new quickly.",
    "Tell me about a project you're particularly proud of.",
    "How do you handle feedback and criticism?",
    "Describe a situation where you had to work with a difficult team member.",
    "Tell me about a time you failed and what you learned from it.",
    "Give me an example of when you went above and beyond in your work.",
    "How do you prioritize your tasks when you have multiple deadlines?",
    "Tell me about a time you had to make a difficult decision.",
];

const TECHNICAL_QUESTIONS: [&str; 12] = [
    "What technical skills are essential for a {role}?",
    "How do you approach problem-solving in your technical work?",
    "Can you walk me through your development process?",
    "How do you stay current with industry trends and technologies?",
    "Describe a complex technical problem you solved recently.",
    "What are your preferred tools and technologies for this role?",
    "How do you ensure code quality and maintainability?",
    "Explain a technical concept you recently learned.",
    "How do you approach debugging and troubleshooting?",
    "What's your experience with system design and architecture?",
    "How do you handle technical debt and legacy systems?",
    "Describe your testing and quality assurance practices.",
];

const GENERAL_QUESTIONS: [&str; 8] = [
    "What interests you most about working as a {role}?",
    "What are your greatest strengths?",
    "Where do you see yourself in 5 years?",
    "Why should we hire you for this position?",
    "What motivates you in your work?",
    "How do you handle working under pressure?",
    "What questions do you have for us?",
    "What's your ideal work environment?",
];

/// Deterministic question set. Behavioral and technical interviews take
/// their pool plus two general questions; mixed interviews take 50%
/// technical, 40% behavioral and the rest general.
pub fn fallback_questions(interview_type: InterviewType, count: usize, role: &str) -> Vec<String> {
    let fill = |q: &&str| q.replace("{role}", role.trim());

    let questions: Vec<String> = match interview_type {
        InterviewType::Behavioral => BEHAVIORAL_QUESTIONS
            .iter()
            .chain(GENERAL_QUESTIONS.iter().take(2))
            .map(fill)
            .collect(),
        InterviewType::Technical => TECHNICAL_QUESTIONS
            .iter()
            .chain(GENERAL_QUESTIONS.iter().take(2))
            .map(fill)
            .collect(),
        InterviewType::Mixed => {
            let technical = count / 2;
            let behavioral = count * 2 / 5;
            let general = count - technical - behavioral;
            TECHNICAL_QUESTIONS
                .iter()
                .take(technical)
                .chain(BEHAVIORAL_QUESTIONS.iter().take(behavioral))
                .chain(GENERAL_QUESTIONS.iter().take(general))
                .map(fill)
                .collect()
        }
    };

    questions.into_iter().take(count).collect()
}
