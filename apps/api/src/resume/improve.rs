//! Single-section rewrite. The model answers in plain text, so no recovery
//! step is involved; a failed call is surfaced to the caller.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::COACH_SYSTEM;
use crate::llm_client::TextGenerator;
use crate::resume::prompts::{GENERIC_INDUSTRY, IMPROVE_PROMPT_TEMPLATE};

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    /// Section kind, e.g. "summary" or "experience".
    #[serde(rename = "type")]
    pub section: String,
    pub current: String,
}

#[derive(Debug, Serialize)]
pub struct ImproveResponse {
    pub improved: String,
}

pub fn build_improve_prompt(request: &ImproveRequest, industry: Option<&str>) -> String {
    let section = match request.section.trim() {
        "" => "resume",
        s => s,
    };
    IMPROVE_PROMPT_TEMPLATE
        .replace("{section}", section)
        .replace("{industry}", industry.unwrap_or(GENERIC_INDUSTRY))
        .replace("{current}", request.current.trim())
}

pub async fn improve_section(
    generator: &dyn TextGenerator,
    request: &ImproveRequest,
    industry: Option<&str>,
) -> Result<ImproveResponse, AppError> {
    if request.current.trim().is_empty() {
        return Err(AppError::Validation("current cannot be empty".to_string()));
    }

    let prompt = build_improve_prompt(request, industry);
    let improved = generator.generate(&prompt, COACH_SYSTEM).await?;
    info!("Improved {} section ({} chars)", request.section, improved.len());

    Ok(ImproveResponse {
        improved: improved.trim().to_string(),
    })
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

    fn request(current: &str) -> ImproveRequest {
        ImproveRequest {
            section: "experience".to_string(),
            current: current.to_string(),
        }
    }

    #[test]
    fn test_prompt_uses_industry_or_generic() {
        let req = request("Built APIs");
        assert!(build_improve_prompt(&req, Some("fintech")).contains("for a fintech professional"));
        assert!(build_improve_prompt(&req, None).contains("for a general professional"));
        assert!(build_improve_prompt(&req, None).contains("\"Built APIs\""));
    }

    #[tokio::test]
    async fn test_improve_trims_model_text() {
        let generator = CannedGenerator(Ok("  Led a team of 5 to ship 3 services.\n"));
        let out = improve_section(&generator, &request("Built APIs"), None).await.unwrap();
        assert_eq!(out.improved, "Led a team of 5 to ship 3 services.");
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected_before_model_call() {
        let generator = CannedGenerator(Err(500));
        let err = improve_section(&generator, &request("   "), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let generator = CannedGenerator(Err(529));
        let err = improve_section(&generator, &request("Built APIs"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::Api { status: 529, .. })));
    }
}
