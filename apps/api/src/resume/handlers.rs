//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::resume::ats::{analyze_resume, validate, AnalyzeRequest, AnalyzeResponse};
use crate::resume::improve::{improve_section, ImproveRequest, ImproveResponse};
use crate::resume::store::{get_resume, save_analysis, save_resume};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveResumeRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    pub content: String,
    pub ats_score: Option<i32>,
    pub feedback: Option<Value>,
}

impl From<ResumeRow> for ResumeResponse {
    fn from(row: ResumeRow) -> Self {
        Self {
            content: row.content,
            ats_score: row.ats_score,
            feedback: row.feedback,
        }
    }
}

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Option<ResumeResponse>>, AppError> {
    let resume = get_resume(&state.db, user.id).await?;
    Ok(Json(resume.map(ResumeResponse::from)))
}

/// PUT /api/v1/resume
pub async fn handle_save_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SaveResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    let row = save_resume(&state.db, user.id, &request.content).await?;
    Ok(Json(row.into()))
}

/// POST /api/v1/resume/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, AppError> {
    let improved = improve_section(state.llm.as_ref(), &request, user.industry.as_deref()).await?;
    Ok(Json(improved))
}

/// POST /api/v1/resume/analyze
///
/// Scores the resume against a job description and stores the result.
pub async fn handle_analyze(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    analyze_and_store(&state, &user.id, request).await.map(Json)
}

/// POST /api/v1/resume/analyze/upload
///
/// Multipart form with a `file` (PDF) and a `jobDescription` text field.
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut pdf: Option<Vec<u8>> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("resume.pdf").to_lowercase();
                if !filename.ends_with(".pdf") {
                    return Err(AppError::Validation("Only PDF files are allowed".to_string()));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::Validation("Invalid file".to_string()))?;
                pdf = Some(data.to_vec());
            }
            Some("jobDescription") | Some("job_description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::Validation("Invalid job description".to_string()))?;
                job_description = Some(text);
            }
            _ => {}
        }
    }

    let pdf = pdf.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let job_description =
        job_description.ok_or_else(|| AppError::Validation("jobDescription is required".to_string()))?;

    let resume_content = extract_pdf_text(pdf).await?;
    info!("Extracted {} chars from uploaded resume", resume_content.len());

    let request = AnalyzeRequest {
        resume_content,
        job_description,
    };
    analyze_and_store(&state, &user.id, request).await.map(Json)
}

async fn analyze_and_store(
    state: &AppState,
    user_id: &Uuid,
    request: AnalyzeRequest,
) -> Result<AnalyzeResponse, AppError> {
    validate(&request)?;
    let response = analyze_resume(state.llm.as_ref(), &request).await;

    let (score, feedback) = response
        .stored_columns()
        .map_err(|e| AppError::Internal(e.into()))?;
    save_analysis(&state.db, *user_id, &request.resume_content, score, &feedback).await?;

    Ok(response)
}

/// PDF parsing is CPU-bound, so it runs on the blocking pool.
async fn extract_pdf_text(pdf: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::Validation("The PDF contains no extractable text".to_string()));
    }
    Ok(text)
}
