//! ATS analysis of a resume against a job description.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::coach_json_system;
use crate::llm_client::TextGenerator;
use crate::recovery::{recover, FieldKind, FieldSpec, RecoveryOutcome, SchemaSpec, DEFAULT_SCORE};
use crate::resume::prompts::ATS_PROMPT_TEMPLATE;

const NOT_ANALYZED: &str = "Not analyzed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsFeedback {
    pub summary: String,
    pub skills_alignment: String,
    pub experience_match: String,
    pub improvements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsAnalysis {
    pub score: i32,
    pub feedback: AtsFeedback,
}

impl AtsAnalysis {
    fn placeholder(summary: &str) -> Self {
        Self {
            score: DEFAULT_SCORE as i32,
            feedback: AtsFeedback {
                summary: summary.to_string(),
                skills_alignment: NOT_ANALYZED.to_string(),
                experience_match: NOT_ANALYZED.to_string(),
                improvements: "Try the analysis again in a moment.".to_string(),
            },
        }
    }

    pub fn model_error() -> Self {
        Self::placeholder("The resume could not be analyzed because the AI service was unavailable.")
    }

    pub fn unreadable() -> Self {
        Self::placeholder("The resume analysis could not be interpreted.")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub resume_content: String,
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: AtsAnalysis,
    pub outcome: &'static str,
}

impl AnalyzeResponse {
    /// `ats_score` and `feedback` column values for the resume row.
    pub fn stored_columns(&self) -> Result<(i32, Value), serde_json::Error> {
        Ok((self.analysis.score, serde_json::to_value(&self.analysis.feedback)?))
    }
}

pub fn ats_schema() -> SchemaSpec {
    SchemaSpec::object(vec![
        FieldSpec::score("score"),
        FieldSpec::with_default(
            "feedback",
            FieldKind::Object(vec![
                FieldSpec::text("summary", NOT_ANALYZED),
                FieldSpec::text("skillsAlignment", NOT_ANALYZED),
                FieldSpec::text("experienceMatch", NOT_ANALYZED),
                FieldSpec::text("improvements", NOT_ANALYZED),
            ]),
            json!({
                "summary": NOT_ANALYZED,
                "skillsAlignment": NOT_ANALYZED,
                "experienceMatch": NOT_ANALYZED,
                "improvements": NOT_ANALYZED,
            }),
        ),
    ])
    .with_salvage("score", None)
}

pub fn validate(request: &AnalyzeRequest) -> Result<(), AppError> {
    if request.resume_content.trim().is_empty() {
        return Err(AppError::Validation("resumeContent cannot be empty".to_string()));
    }
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation("jobDescription cannot be empty".to_string()));
    }
    Ok(())
}

pub fn build_ats_prompt(request: &AnalyzeRequest) -> String {
    ATS_PROMPT_TEMPLATE
        .replace("{resume}", request.resume_content.trim())
        .replace("{job_description}", request.job_description.trim())
}

/// Scores the resume. Never fails: a failed model call or unreadable output
/// yields a placeholder analysis at `DEFAULT_SCORE`.
pub async fn analyze_resume(generator: &dyn TextGenerator, request: &AnalyzeRequest) -> AnalyzeResponse {
    let prompt = build_ats_prompt(request);
    let raw = match generator.generate(&prompt, &coach_json_system()).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("ATS model call failed: {e}");
            return AnalyzeResponse {
                analysis: AtsAnalysis::model_error(),
                outcome: "fallback",
            };
        }
    };

    let recovered = recover(&raw, &ats_schema(), AtsAnalysis::unreadable);
    let outcome = match &recovered.outcome {
        RecoveryOutcome::Parsed => "parsed",
        RecoveryOutcome::Patched { .. } => "patched",
        RecoveryOutcome::Salvaged { .. } => "salvaged",
        RecoveryOutcome::Fallback { .. } => "fallback",
    };
    let analysis = recovered.into_payload();
    info!("ATS analysis finished ({outcome}): score {}", analysis.score);

    AnalyzeResponse { analysis, outcome }
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
                message: "unavailable".to_string(),
            })
        }
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            resume_content: "Rust engineer, 5 years".to_string(),
            job_description: "Senior Rust engineer".to_string(),
        }
    }

    #[tokio::test]
    async fn test_object_embedded_in_prose_is_used() {
        let generator = CannedGenerator(Ok(
            r#"Sure! Here's the analysis: {"score": 85, "feedback": {"summary": "Strong", "skillsAlignment": "Good", "experienceMatch": "Relevant", "improvements": "Add metrics"}} Hope that helps!"#,
        ));
        let out = analyze_resume(&generator, &request()).await;
        assert_eq!(out.outcome, "parsed");
        assert_eq!(out.analysis.score, 85);
        assert_eq!(out.analysis.feedback.improvements, "Add metrics");
    }

    #[tokio::test]
    async fn test_missing_feedback_fields_are_defaulted() {
        let generator = CannedGenerator(Ok(r#"{"score": 150, "feedback": {"summary": "Ok"}}"#));
        let out = analyze_resume(&generator, &request()).await;
        assert_eq!(out.outcome, "patched");
        assert_eq!(out.analysis.score, 100);
        assert_eq!(out.analysis.feedback.summary, "Ok");
        assert_eq!(out.analysis.feedback.skills_alignment, NOT_ANALYZED);
    }

    #[tokio::test]
    async fn test_bare_score_is_salvaged() {
        let generator = CannedGenerator(Ok("I'd rate this resume 72/100 overall."));
        let out = analyze_resume(&generator, &request()).await;
        assert_eq!(out.outcome, "salvaged");
        assert_eq!(out.analysis.score, 72);
        assert_eq!(out.analysis.feedback.summary, NOT_ANALYZED);
    }

    #[tokio::test]
    async fn test_model_error_yields_placeholder() {
        let generator = CannedGenerator(Err(503));
        let out = analyze_resume(&generator, &request()).await;
        assert_eq!(out.outcome, "fallback");
        assert_eq!(out.analysis, AtsAnalysis::model_error());
    }

    #[tokio::test]
    async fn test_model_error_placeholder_is_what_gets_stored() {
        let out = analyze_resume(&CannedGenerator(Err(503)), &request()).await;
        let (score, feedback) = out.stored_columns().unwrap();
        assert_eq!(score, DEFAULT_SCORE as i32);
        assert_eq!(feedback["summary"], AtsAnalysis::model_error().feedback.summary);
        assert_eq!(feedback["skillsAlignment"], NOT_ANALYZED);
    }

    #[tokio::test]
    async fn test_parsed_analysis_is_stored_camel_case() {
        let generator = CannedGenerator(Ok(r#"{"score": 61.5, "feedback": {"summary": "Gaps in Kafka"}}"#));
        let (score, feedback) = analyze_resume(&generator, &request()).await.stored_columns().unwrap();
        assert_eq!(score, 62);
        assert_eq!(feedback["summary"], "Gaps in Kafka");
        assert_eq!(feedback["experienceMatch"], NOT_ANALYZED);
    }

    #[tokio::test]
    async fn test_empty_output_yields_placeholder() {
        let generator = CannedGenerator(Ok("   "));
        let out = analyze_resume(&generator, &request()).await;
        assert_eq!(out.analysis, AtsAnalysis::unreadable());
        assert_eq!(out.analysis.score, DEFAULT_SCORE as i32);
    }

    #[test]
    fn test_validate_rejects_blank_job_description() {
        let mut req = request();
        req.job_description = " ".to_string();
        assert!(matches!(validate(&req), Err(AppError::Validation(_))));
    }
}
