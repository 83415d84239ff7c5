//! Interview session lifecycle: create → start → complete.
//!
//! Completion is the one place with an explicit concurrency construct:
//! feedback drafting races a fixed timeout, and whichever finishes first
//! decides whether real feedback or a placeholder lands on the row. Writes
//! happen after the race. Either way the session ends COMPLETED, or FAILED
//! if recording real feedback fails.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::feedback::{
    draft_feedback, format_transcript, record_feedback, FeedbackDraft, InterviewFeedback,
    TranscriptMessage,
};
use crate::interview::prompts::{INTERVIEWER_FIRST_MESSAGE, INTERVIEWER_SYSTEM_TEMPLATE};
use crate::interview::questions::{generate_questions, InterviewRequest, QuestionSource, DEFAULT_DURATION_MINUTES};
use crate::llm_client::TextGenerator;
use crate::models::interview::{CallAnalyticsRow, InterviewSessionRow, SessionStatus};
use crate::models::user::User;
use crate::recovery::DEFAULT_SCORE;

const TIMEOUT_FEEDBACK: &str =
    "Interview completed successfully. Feedback generation encountered an issue.";
const FAILED_FEEDBACK: &str = "Interview encountered an error during completion.";
const NO_TRANSCRIPT: &str = "No transcript available";

// ────────────────────────────────────────────────────────────────────────────
// Create
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub session: InterviewSessionRow,
    pub question_source: QuestionSource,
}

pub async fn create_session(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user: &User,
    request: &InterviewRequest,
) -> Result<CreatedSession, AppError> {
    request.validate()?;

    let generated = generate_questions(generator, request, &user.skills).await;
    info!(
        "Creating {} session for user {} with {} {:?} questions",
        request.session_type.as_str(),
        user.id,
        generated.questions.len(),
        generated.source
    );

    let industry = request
        .industry
        .clone()
        .or_else(|| user.industry.clone());

    let session = sqlx::query_as::<_, InterviewSessionRow>(
        r#"
        INSERT INTO interview_sessions
            (user_id, session_type, interview_type, industry, role, difficulty,
             duration_minutes, status, questions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(request.session_type.as_str())
    .bind(request.interview_type.as_str())
    .bind(industry)
    .bind(request.role.trim())
    .bind(request.difficulty())
    .bind(request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES))
    .bind(SessionStatus::Scheduled.as_str())
    .bind(json!(generated.questions))
    .fetch_one(pool)
    .await?;

    Ok(CreatedSession {
        session,
        question_source: generated.source,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Start
// ────────────────────────────────────────────────────────────────────────────

/// Configuration handed to the voice call SDK on the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    pub first_message: String,
    pub transcriber: TranscriberConfig,
    pub voice: VoiceConfig,
    pub model: AssistantModel,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriberConfig {
    pub provider: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub provider: String,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub speed: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantModel {
    pub provider: String,
    pub model: String,
    pub messages: Vec<AssistantMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

pub fn build_assistant_config(session: &InterviewSessionRow, questions: &[String]) -> AssistantConfig {
    let question_list = questions
        .iter()
        .map(|q| format!("- {q}"))
        .collect::<Vec<_>>()
        .join("\n");

    AssistantConfig {
        name: "AI Interviewer".to_string(),
        first_message: INTERVIEWER_FIRST_MESSAGE.replace("{role}", &session.role),
        transcriber: TranscriberConfig {
            provider: "deepgram".to_string(),
            model: "nova-2".to_string(),
            language: "en".to_string(),
        },
        voice: VoiceConfig {
            provider: "11labs".to_string(),
            voice_id: "sarah".to_string(),
            stability: 0.4,
            similarity_boost: 0.8,
            speed: 0.9,
            style: 0.5,
            use_speaker_boost: true,
        },
        model: AssistantModel {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            messages: vec![AssistantMessage {
                role: "system".to_string(),
                content: INTERVIEWER_SYSTEM_TEMPLATE
                    .replace("{role}", &session.role)
                    .replace("{difficulty}", &session.difficulty)
                    .replace("{questions}", &question_list),
            }],
        },
    }
}

#[derive(Debug, Serialize)]
pub struct StartedSession {
    pub session: InterviewSessionRow,
    pub assistant_config: AssistantConfig,
    pub questions: Vec<String>,
}

pub async fn start_session(
    pool: &PgPool,
    user: &User,
    session_id: Uuid,
) -> Result<StartedSession, AppError> {
    let session = load_session(pool, user.id, session_id).await?;
    if session.status == SessionStatus::Completed.as_str() {
        return Err(AppError::Validation(format!(
            "Interview session {session_id} is already completed"
        )));
    }

    let questions = session.question_texts();
    let assistant_config = build_assistant_config(&session, &questions);

    let updated = sqlx::query_as::<_, InterviewSessionRow>(
        "UPDATE interview_sessions SET status = $1, started_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(SessionStatus::InProgress.as_str())
    .bind(session_id)
    .fetch_one(pool)
    .await;

    let session = match updated {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to start session {session_id}: {e}");
            mark_session(pool, session_id, SessionStatus::Failed, None).await;
            return Err(e.into());
        }
    };

    info!("Session {session_id} started with {} questions", questions.len());
    Ok(StartedSession {
        session,
        assistant_config,
        questions,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Complete
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    pub transcript: Option<String>,
    #[serde(default)]
    pub messages: Vec<TranscriptMessage>,
}

#[derive(Debug, Serialize)]
pub struct CompletedSession {
    pub session: InterviewSessionRow,
    pub analytics: Option<CallAnalyticsRow>,
    /// `None` when feedback timed out or failed; the row then carries a placeholder.
    pub feedback: Option<InterviewFeedback>,
}

#[derive(Debug, Error)]
#[error("timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Awaits `work` for at most `limit`. The losing branch is dropped.
pub async fn race_with_timeout<T, F>(limit: Duration, work: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| TimedOut(limit))
}

/// What completion writes to the session row.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Feedback(FeedbackDraft),
    /// Feedback did not arrive in time.
    Placeholder,
}

impl Completion {
    pub fn from_race(result: Result<FeedbackDraft, TimedOut>) -> Self {
        match result {
            Ok(draft) => Completion::Feedback(draft),
            Err(_) => Completion::Placeholder,
        }
    }

    pub fn overall_score(&self) -> i32 {
        match self {
            Completion::Feedback(draft) => draft.feedback.total_score,
            Completion::Placeholder => DEFAULT_SCORE as i32,
        }
    }

    pub fn detailed_feedback(&self) -> &str {
        match self {
            Completion::Feedback(draft) => &draft.feedback.final_assessment,
            Completion::Placeholder => TIMEOUT_FEEDBACK,
        }
    }

    pub fn into_feedback(self) -> Option<InterviewFeedback> {
        match self {
            Completion::Feedback(draft) => Some(draft.feedback),
            Completion::Placeholder => None,
        }
    }
}

/// Drafts feedback under the completion timeout. Only the model call is
/// raced; nothing is written until the race is decided.
pub async fn decide_completion(
    generator: &dyn TextGenerator,
    transcript: &str,
    feedback_timeout: Duration,
) -> Completion {
    let result = race_with_timeout(feedback_timeout, draft_feedback(generator, transcript)).await;
    if let Err(e) = &result {
        warn!("Feedback generation {e}; completing with placeholder");
    }
    Completion::from_race(result)
}

pub async fn complete_session(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user: &User,
    session_id: Uuid,
    request: CompleteRequest,
    feedback_timeout: Duration,
) -> Result<CompletedSession, AppError> {
    let session = load_session(pool, user.id, session_id).await?;
    info!(
        "Completing session {} (status {}) with {} messages",
        session.id,
        session.status,
        request.messages.len()
    );

    match finish_session(pool, generator, &session, &request, feedback_timeout).await {
        Ok(completed) => Ok(completed),
        Err(e) => {
            error!("Completing session {session_id} failed: {e}");
            mark_session(pool, session_id, SessionStatus::Failed, Some(FAILED_FEEDBACK)).await;
            Err(e)
        }
    }
}

async fn finish_session(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    session: &InterviewSessionRow,
    request: &CompleteRequest,
    feedback_timeout: Duration,
) -> Result<CompletedSession, AppError> {
    let transcript = format_transcript(&request.messages, request.transcript.as_deref());

    if let Err(e) = upsert_call_analytics(pool, session, &transcript, request.messages.len()).await {
        warn!("Call analytics upsert failed for session {}: {e}", session.id);
    }

    let completion = decide_completion(generator, &transcript, feedback_timeout).await;
    match &completion {
        Completion::Feedback(draft) => record_feedback(pool, session.id, draft).await?,
        Completion::Placeholder => write_placeholder_completion(pool, session.id, &completion).await,
    }
    let feedback = completion.into_feedback();

    let session = load_session(pool, session.user_id, session.id).await?;
    let analytics = load_analytics(pool, session.id).await?;

    Ok(CompletedSession {
        session,
        analytics,
        feedback,
    })
}

async fn upsert_call_analytics(
    pool: &PgPool,
    session: &InterviewSessionRow,
    transcript: &str,
    message_count: usize,
) -> Result<(), sqlx::Error> {
    let transcript = if transcript.trim().is_empty() {
        NO_TRANSCRIPT
    } else {
        transcript
    };
    let metadata: Value = json!({ "messages": message_count });

    sqlx::query(
        r#"
        INSERT INTO call_analytics (user_id, session_id, transcript, metadata, started_at, ended_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (session_id) DO UPDATE
        SET transcript = EXCLUDED.transcript,
            metadata = call_analytics.metadata || EXCLUDED.metadata,
            ended_at = EXCLUDED.ended_at
        "#,
    )
    .bind(session.user_id)
    .bind(session.id)
    .bind(transcript)
    .bind(&metadata)
    .bind(session.started_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Best effort. Never overwrites a session that already holds feedback.
async fn write_placeholder_completion(pool: &PgPool, session_id: Uuid, completion: &Completion) {
    let result = sqlx::query(
        r#"
        UPDATE interview_sessions
        SET status = $1, ended_at = now(), detailed_feedback = $2, overall_score = $3
        WHERE id = $4 AND status <> $1
        "#,
    )
    .bind(SessionStatus::Completed.as_str())
    .bind(completion.detailed_feedback())
    .bind(completion.overall_score())
    .bind(session_id)
    .execute(pool)
    .await;

    if let Err(e) = result {
        error!("Could not write placeholder completion for session {session_id}: {e}");
    }
}

/// Best effort status change used on error paths.
async fn mark_session(pool: &PgPool, session_id: Uuid, status: SessionStatus, feedback: Option<&str>) {
    let result = sqlx::query(
        r#"
        UPDATE interview_sessions
        SET status = $1,
            ended_at = now(),
            detailed_feedback = COALESCE($2, detailed_feedback)
        WHERE id = $3
        "#,
    )
    .bind(status.as_str())
    .bind(feedback)
    .bind(session_id)
    .execute(pool)
    .await;

    if let Err(e) = result {
        error!("Could not set session {session_id} to {status}: {e}");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

pub async fn load_session(
    pool: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<InterviewSessionRow, AppError> {
    sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE id = $1 AND user_id = $2",
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Interview session {session_id} not found")))
}

pub async fn load_analytics(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<CallAnalyticsRow>, AppError> {
    Ok(
        sqlx::query_as::<_, CallAnalyticsRow>("SELECT * FROM call_analytics WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn list_sessions(pool: &PgPool, user_id: Uuid) -> Result<Vec<InterviewSessionRow>, AppError> {
    Ok(sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use async_trait::async_trait;
    use chrono::Utc;

    fn session() -> InterviewSessionRow {
        InterviewSessionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_type: "mock".to_string(),
            interview_type: "technical".to_string(),
            industry: Some("fintech".to_string()),
            role: "Platform Engineer".to_string(),
            difficulty: "senior".to_string(),
            duration_minutes: 30,
            status: SessionStatus::Scheduled.to_string(),
            questions: json!(["Why Kubernetes?", "Describe an outage."]),
            overall_score: None,
            technical_score: None,
            communication_score: None,
            confidence_score: None,
            strengths: vec![],
            weaknesses: vec![],
            detailed_feedback: None,
            started_at: None,
            ended_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_assistant_config_lists_questions() {
        let s = session();
        let config = build_assistant_config(&s, &s.question_texts());
        let system = &config.model.messages[0].content;
        assert!(system.contains("- Position: Platform Engineer"));
        assert!(system.contains("- Level: senior"));
        assert!(system.contains("- Why Kubernetes?\n- Describe an outage."));
        assert!(config.first_message.contains("Platform Engineer position"));
    }

    #[test]
    fn test_assistant_config_serializes_camel_case() {
        let s = session();
        let value = serde_json::to_value(build_assistant_config(&s, &[])).unwrap();
        assert!(value["firstMessage"].is_string());
        assert_eq!(value["voice"]["voiceId"], "sarah");
        assert_eq!(value["voice"]["useSpeakerBoost"], true);
        assert_eq!(value["transcriber"]["model"], "nova-2");
    }

    #[test]
    fn test_complete_request_accepts_missing_fields() {
        let req: CompleteRequest = serde_json::from_str("{}").unwrap();
        assert!(req.transcript.is_none());
        assert!(req.messages.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_race_returns_fast_result() {
        let out = race_with_timeout(Duration::from_secs(30), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            7
        })
        .await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_race_times_out_slow_work() {
        let out = race_with_timeout(Duration::from_secs(30), async {
            tokio::time::sleep(Duration::from_secs(31)).await;
            7
        })
        .await;
        assert!(matches!(out, Err(TimedOut(d)) if d == Duration::from_secs(30)));
    }

    /// Answers after `delay`, or fails with `status` when given one.
    struct SlowGenerator {
        delay: Duration,
        reply: Result<&'static str, u16>,
    }

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            tokio::time::sleep(self.delay).await;
            self.reply.map(String::from).map_err(|status| LlmError::Api {
                status,
                message: "unavailable".to_string(),
            })
        }
    }

    const TRANSCRIPT: &str = "Interviewer: Walk me through an outage.\nCandidate: We lost a region.";

    #[tokio::test(start_paused = true)]
    async fn test_timeout_completes_with_placeholder() {
        let generator = SlowGenerator {
            delay: Duration::from_secs(45),
            reply: Ok(r#"{"totalScore": 90}"#),
        };
        let completion = decide_completion(&generator, TRANSCRIPT, Duration::from_secs(30)).await;
        assert_eq!(completion, Completion::Placeholder);
        assert_eq!(completion.overall_score(), DEFAULT_SCORE as i32);
        assert_eq!(completion.detailed_feedback(), TIMEOUT_FEEDBACK);
        assert!(completion.into_feedback().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_error_within_timeout_records_error_placeholder() {
        let generator = SlowGenerator {
            delay: Duration::from_secs(2),
            reply: Err(500),
        };
        let completion = decide_completion(&generator, TRANSCRIPT, Duration::from_secs(30)).await;
        let Completion::Feedback(draft) = &completion else {
            panic!("expected drafted feedback, got {completion:?}");
        };
        assert_eq!(draft.feedback, InterviewFeedback::model_error());
        assert_eq!(completion.overall_score(), DEFAULT_SCORE as i32);
        assert_eq!(
            completion.detailed_feedback(),
            InterviewFeedback::model_error().final_assessment
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_transcript_records_no_transcript_placeholder() {
        let generator = SlowGenerator {
            delay: Duration::from_secs(60),
            reply: Ok(r#"{"totalScore": 90}"#),
        };
        let completion = decide_completion(&generator, "ok", Duration::from_secs(30)).await;
        assert_eq!(
            completion.into_feedback(),
            Some(InterviewFeedback::no_transcript())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_within_timeout_is_recorded() {
        let generator = SlowGenerator {
            delay: Duration::from_secs(29),
            reply: Ok(r#"{"totalScore": 83.6, "finalAssessment": "Hire"}"#),
        };
        let completion = decide_completion(&generator, TRANSCRIPT, Duration::from_secs(30)).await;
        assert_eq!(completion.overall_score(), 84);
        assert_eq!(completion.detailed_feedback(), "Hire");
    }
}
