//! Interview feedback: transcript formatting, the feedback schema and its
//! fallbacks, and persistence of scores onto the session row.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::prompts::FEEDBACK_PROMPT_TEMPLATE;
use crate::llm_client::prompts::coach_json_system;
use crate::llm_client::TextGenerator;
use crate::models::interview::SessionStatus;
use crate::recovery::{recover, FieldKind, FieldSpec, RecoveryOutcome, SchemaSpec, DEFAULT_SCORE};

pub const COMMUNICATION: &str = "Communication Skills";
pub const TECHNICAL: &str = "Technical Knowledge";
pub const PROBLEM_SOLVING: &str = "Problem Solving";
pub const CULTURAL_FIT: &str = "Cultural Fit";
pub const CONFIDENCE: &str = "Confidence and Clarity";

pub const CATEGORIES: [&str; 5] = [COMMUNICATION, TECHNICAL, PROBLEM_SOLVING, CULTURAL_FIT, CONFIDENCE];

/// Transcripts shorter than this are not worth a model call.
const MIN_TRANSCRIPT_CHARS: usize = 10;
/// Raw model output kept in call analytics for debugging.
const RAW_OUTPUT_LIMIT: usize = 5000;

const NOT_ASSESSED: &str = "Not assessed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub score: i32,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewFeedback {
    pub total_score: i32,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
}

impl InterviewFeedback {
    /// Every category at `DEFAULT_SCORE` with the same comment.
    fn placeholder(comment: &str, improvement: &str, assessment: &str) -> Self {
        Self {
            total_score: DEFAULT_SCORE as i32,
            category_scores: CATEGORIES
                .iter()
                .map(|name| CategoryScore {
                    name: name.to_string(),
                    score: DEFAULT_SCORE as i32,
                    comment: comment.to_string(),
                })
                .collect(),
            strengths: vec![],
            areas_for_improvement: vec![improvement.to_string()],
            final_assessment: assessment.to_string(),
        }
    }

    pub fn no_transcript() -> Self {
        Self::placeholder(
            "No transcript provided",
            "Transcript not available",
            "No transcript was provided for analysis. Complete an interview with spoken answers to receive an assessment.",
        )
    }

    pub fn model_error() -> Self {
        Self::placeholder(
            "Could not generate detailed feedback due to a model error",
            "Feedback generation failed",
            "Feedback generation encountered an error. Please retry.",
        )
    }

    pub fn unreadable() -> Self {
        Self::placeholder(
            "The model response could not be interpreted",
            "Feedback could not be read from the model response",
            "The interview was recorded, but the generated feedback could not be interpreted.",
        )
    }

    /// Score of the named category, case-insensitively, or `DEFAULT_SCORE`.
    pub fn category(&self, name: &str) -> i32 {
        self.category_scores
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.score)
            .unwrap_or(DEFAULT_SCORE as i32)
    }
}

pub fn feedback_schema() -> SchemaSpec {
    let default_categories: Value = CATEGORIES
        .iter()
        .map(|name| json!({"name": name, "score": DEFAULT_SCORE, "comment": NOT_ASSESSED}))
        .collect();

    SchemaSpec::object(vec![
        FieldSpec::score("totalScore"),
        FieldSpec::with_default(
            "categoryScores",
            FieldKind::list_of(
                FieldKind::Object(vec![
                    FieldSpec::required("name", FieldKind::text()),
                    FieldSpec::score("score"),
                    FieldSpec::text("comment", NOT_ASSESSED),
                ]),
                1,
            ),
            default_categories,
        ),
        FieldSpec::text_list("strengths"),
        FieldSpec::text_list("areasForImprovement"),
        FieldSpec::text("finalAssessment", "No overall assessment was provided."),
    ])
    .with_salvage("totalScore", Some("finalAssessment"))
}

/// One utterance as delivered by the voice client. Clients disagree on
/// which key carries the text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TranscriptMessage {
    Plain(String),
    Structured {
        role: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
        content: Option<String>,
        text: Option<String>,
        transcript: Option<String>,
    },
}

impl TranscriptMessage {
    fn line(&self) -> Option<String> {
        match self {
            TranscriptMessage::Plain(s) if !s.trim().is_empty() => Some(format!("User: {}", s.trim())),
            TranscriptMessage::Plain(_) => None,
            TranscriptMessage::Structured {
                role,
                kind,
                content,
                text,
                transcript,
            } => {
                let body = [content, text, transcript]
                    .into_iter()
                    .flatten()
                    .map(|s| s.trim())
                    .find(|s| !s.is_empty())?;
                let speaker = match (role.as_deref(), kind.as_deref()) {
                    (Some(r), _) if !r.trim().is_empty() => r.trim(),
                    (_, Some("transcript")) => "User",
                    _ => "System",
                };
                Some(format!("{speaker}: {body}"))
            }
        }
    }
}

/// Messages win over the raw transcript when any are usable.
pub fn format_transcript(messages: &[TranscriptMessage], transcript: Option<&str>) -> String {
    let lines: Vec<String> = messages.iter().filter_map(TranscriptMessage::line).collect();
    if !lines.is_empty() {
        return lines.join("\n");
    }
    transcript.map(str::trim).unwrap_or_default().to_string()
}

pub fn build_feedback_prompt(transcript: &str) -> String {
    FEEDBACK_PROMPT_TEMPLATE.replace("{transcript}", transcript)
}

/// Where a feedback payload came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackSource {
    /// Transcript too short for a model call.
    NoTranscript,
    /// The model call failed; carries the error text.
    ModelError(String),
    /// Model output, possibly patched or replaced by `unreadable()`.
    Model { raw: String },
}

/// Feedback decided for a session but not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackDraft {
    pub feedback: InterviewFeedback,
    pub source: FeedbackSource,
}

/// Produces feedback for a transcript without touching the database.
///
/// Never fails: a short transcript, a failed model call or unreadable output
/// each end in a placeholder payload.
pub async fn draft_feedback(generator: &dyn TextGenerator, transcript: &str) -> FeedbackDraft {
    if transcript.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
        return FeedbackDraft {
            feedback: InterviewFeedback::no_transcript(),
            source: FeedbackSource::NoTranscript,
        };
    }

    let prompt = build_feedback_prompt(transcript);
    let raw = match generator.generate(&prompt, &coach_json_system()).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Feedback model call failed: {e}");
            return FeedbackDraft {
                feedback: InterviewFeedback::model_error(),
                source: FeedbackSource::ModelError(e.to_string()),
            };
        }
    };

    let recovered = recover(&raw, &feedback_schema(), InterviewFeedback::unreadable);
    if let RecoveryOutcome::Patched { fields } = &recovered.outcome {
        info!("Feedback patched fields: {}", fields.join(", "));
    }
    FeedbackDraft {
        feedback: recovered.into_payload(),
        source: FeedbackSource::Model { raw },
    }
}

impl FeedbackDraft {
    /// Debugging data merged into the session's call analytics.
    pub fn analytics_metadata(&self) -> Option<Value> {
        match &self.source {
            FeedbackSource::NoTranscript => None,
            FeedbackSource::ModelError(message) => Some(json!({ "modelError": message })),
            FeedbackSource::Model { raw } => {
                let raw_output: String = raw.chars().take(RAW_OUTPUT_LIMIT).collect();
                Some(json!({ "rawModelOutput": raw_output }))
            }
        }
    }
}

/// Writes a drafted payload to the session row, then merges its debugging
/// metadata into call analytics (best effort).
pub async fn record_feedback(
    pool: &PgPool,
    session_id: Uuid,
    draft: &FeedbackDraft,
) -> Result<(), AppError> {
    persist_feedback(pool, session_id, &draft.feedback).await?;
    if let Some(metadata) = draft.analytics_metadata() {
        merge_analytics_metadata(pool, session_id, metadata).await;
    }
    info!(
        "Feedback written for session {session_id}: overall {}",
        draft.feedback.total_score
    );
    Ok(())
}

/// Score columns of the session row, in the order they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreColumns {
    pub overall: i32,
    pub technical: i32,
    pub communication: i32,
    pub confidence: i32,
}

impl InterviewFeedback {
    pub fn score_columns(&self) -> ScoreColumns {
        ScoreColumns {
            overall: self.total_score,
            technical: self.category(TECHNICAL),
            communication: self.category(COMMUNICATION),
            confidence: self.category(CONFIDENCE),
        }
    }
}

/// Writes every feedback-derived column and marks the session completed.
pub async fn persist_feedback(
    pool: &PgPool,
    session_id: Uuid,
    feedback: &InterviewFeedback,
) -> Result<(), AppError> {
    let scores = feedback.score_columns();
    sqlx::query(
        r#"
        UPDATE interview_sessions
        SET overall_score = $1,
            technical_score = $2,
            communication_score = $3,
            confidence_score = $4,
            strengths = $5,
            weaknesses = $6,
            detailed_feedback = $7,
            status = $8,
            ended_at = now()
        WHERE id = $9
        "#,
    )
    .bind(scores.overall)
    .bind(scores.technical)
    .bind(scores.communication)
    .bind(scores.confidence)
    .bind(&feedback.strengths)
    .bind(&feedback.areas_for_improvement)
    .bind(&feedback.final_assessment)
    .bind(SessionStatus::Completed.as_str())
    .bind(session_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Best effort: merges `patch` into the analytics metadata for the session.
async fn merge_analytics_metadata(pool: &PgPool, session_id: Uuid, patch: Value) {
    let result = sqlx::query(
        "UPDATE call_analytics SET metadata = metadata || $1 WHERE session_id = $2",
    )
    .bind(&patch)
    .bind(session_id)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!("Failed to update call analytics metadata for session {session_id}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use async_trait::async_trait;

    struct CannedGenerator(Result<&'static str, u16>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.0.map(String::from).map_err(|status| LlmError::Api {
                status,
                message: "overloaded".to_string(),
            })
        }
    }

    const TRANSCRIPT: &str = "Interviewer: Tell me about yourself.\nCandidate: I build payment systems.";

    #[tokio::test]
    async fn test_short_transcript_drafts_placeholder_without_model_call() {
        let draft = draft_feedback(&CannedGenerator(Ok("{\"totalScore\": 99}")), "  hi  ").await;
        assert_eq!(draft.source, FeedbackSource::NoTranscript);
        assert_eq!(draft.feedback, InterviewFeedback::no_transcript());
        assert!(draft.analytics_metadata().is_none());
        let scores = draft.feedback.score_columns();
        assert_eq!(scores.overall, DEFAULT_SCORE as i32);
        assert_eq!(scores.technical, DEFAULT_SCORE as i32);
    }

    #[tokio::test]
    async fn test_model_error_drafts_placeholder_and_records_error() {
        let draft = draft_feedback(&CannedGenerator(Err(529)), TRANSCRIPT).await;
        assert_eq!(draft.feedback, InterviewFeedback::model_error());
        let metadata = draft.analytics_metadata().unwrap();
        assert!(metadata["modelError"].as_str().unwrap().contains("529"));
        assert_eq!(draft.feedback.score_columns().overall, DEFAULT_SCORE as i32);
    }

    #[tokio::test]
    async fn test_model_output_drafts_scores_and_keeps_raw_text() {
        let raw = r#"{"totalScore": 74, "categoryScores": [{"name": "Technical Knowledge", "score": 70}]}"#;
        let draft = draft_feedback(&CannedGenerator(Ok(raw)), TRANSCRIPT).await;
        let scores = draft.feedback.score_columns();
        assert_eq!(scores.overall, 74);
        assert_eq!(scores.technical, 70);
        assert_eq!(scores.communication, DEFAULT_SCORE as i32);
        assert_eq!(draft.analytics_metadata().unwrap()["rawModelOutput"], raw);
    }

    #[tokio::test]
    async fn test_unreadable_output_drafts_unreadable_placeholder() {
        let draft = draft_feedback(&CannedGenerator(Ok("No comment.")), TRANSCRIPT).await;
        assert_eq!(draft.feedback, InterviewFeedback::unreadable());
        assert!(matches!(draft.source, FeedbackSource::Model { .. }));
    }

    #[test]
    fn test_well_formed_feedback_is_kept() {
        let raw = r#"```json
{
  "totalScore": 81,
  "categoryScores": [
    {"name": "Communication Skills", "score": 85, "comment": "Clear"},
    {"name": "Technical Knowledge", "score": 78.4, "comment": "Solid"},
    {"name": "Problem Solving", "score": 80, "comment": "Structured"},
    {"name": "Cultural Fit", "score": 82, "comment": "Good"},
    {"name": "Confidence and Clarity", "score": 79, "comment": "Calm"}
  ],
  "strengths": ["Structured answers"],
  "areasForImprovement": ["Quantify impact"],
  "finalAssessment": "Ready for on-site rounds."
}
```"#;
        let out = recover(raw, &feedback_schema(), InterviewFeedback::unreadable);
        assert_eq!(out.outcome, RecoveryOutcome::Parsed);
        let fb = out.payload;
        assert_eq!(fb.total_score, 81);
        assert_eq!(fb.category(TECHNICAL), 78);
        assert_eq!(fb.category("communication skills"), 85);
        assert_eq!(fb.category(CONFIDENCE), 79);
        assert_eq!(fb.areas_for_improvement, vec!["Quantify impact"]);
    }

    #[test]
    fn test_empty_output_is_placeholder() {
        let out = recover("", &feedback_schema(), InterviewFeedback::unreadable);
        assert_eq!(out.payload, InterviewFeedback::unreadable());
        assert!(out.payload.category_scores.iter().all(|c| c.score == 0));
        assert_eq!(out.payload.category_scores.len(), CATEGORIES.len());
    }

    #[test]
    fn test_partial_feedback_gets_default_categories() {
        let out = recover(
            r#"{"totalScore": 64, "finalAssessment": "Needs practice"}"#,
            &feedback_schema(),
            InterviewFeedback::unreadable,
        );
        let fb = out.payload;
        assert_eq!(fb.total_score, 64);
        assert_eq!(fb.category_scores.len(), 5);
        assert!(fb.category_scores.iter().all(|c| c.score == 0 && c.comment == NOT_ASSESSED));
        assert!(fb.strengths.is_empty());
        assert_eq!(fb.final_assessment, "Needs practice");
    }

    #[test]
    fn test_missing_category_reads_as_default() {
        let fb = InterviewFeedback {
            total_score: 70,
            category_scores: vec![CategoryScore {
                name: "Leadership".to_string(),
                score: 90,
                comment: String::new(),
            }],
            strengths: vec![],
            areas_for_improvement: vec![],
            final_assessment: String::new(),
        };
        assert_eq!(fb.category(TECHNICAL), DEFAULT_SCORE as i32);
    }

    #[test]
    fn test_format_prefers_messages() {
        let messages: Vec<TranscriptMessage> = serde_json::from_value(json!([
            {"role": "assistant", "content": "Tell me about yourself."},
            {"type": "transcript", "transcript": "I build data pipelines."},
            {"text": "call ended"},
            "Thanks!",
            {"role": "user", "content": "   "}
        ]))
        .unwrap();
        let out = format_transcript(&messages, Some("ignored"));
        assert_eq!(
            out,
            "assistant: Tell me about yourself.\nUser: I build data pipelines.\nSystem: call ended\nUser: Thanks!"
        );
    }

    #[test]
    fn test_format_falls_back_to_transcript() {
        assert_eq!(format_transcript(&[], Some("  raw text  ")), "raw text");
        assert_eq!(format_transcript(&[], None), "");
        let blank: Vec<TranscriptMessage> = serde_json::from_value(json!(["  "])).unwrap();
        assert_eq!(format_transcript(&blank, Some("raw")), "raw");
    }

    #[test]
    fn test_prompt_embeds_transcript() {
        let prompt = build_feedback_prompt("User: hello there");
        assert!(prompt.contains("TRANSCRIPT:\nUser: hello there"));
        assert!(prompt.contains("\"totalScore\": number"));
    }

    #[test]
    fn test_placeholders_differ_in_explanation() {
        assert_ne!(
            InterviewFeedback::no_transcript().final_assessment,
            InterviewFeedback::model_error().final_assessment
        );
        assert_eq!(InterviewFeedback::model_error().total_score, DEFAULT_SCORE as i32);
    }
}
