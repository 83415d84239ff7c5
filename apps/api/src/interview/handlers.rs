//! Axum route handlers for the Interview API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::interview::questions::{generate_questions, GeneratedQuestions, InterviewRequest};
use crate::interview::session::{
    complete_session, create_session, list_sessions, load_analytics, load_session,
    start_session, CompleteRequest, CompletedSession, CreatedSession, StartedSession,
};
use crate::models::interview::{CallAnalyticsRow, InterviewSessionRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<InterviewSessionRow>,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub session: InterviewSessionRow,
    pub analytics: Option<CallAnalyticsRow>,
}

/// POST /api/v1/interviews/questions
///
/// Previews a question set without creating a session.
pub async fn handle_preview_questions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<GeneratedQuestions>, AppError> {
    request.validate()?;
    let generated = generate_questions(state.llm.as_ref(), &request, &user.skills).await;
    Ok(Json(generated))
}

/// POST /api/v1/interviews
pub async fn handle_create_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<CreatedSession>, AppError> {
    let created = create_session(&state.db, state.llm.as_ref(), &user, &request).await?;
    Ok(Json(created))
}

/// GET /api/v1/interviews
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = list_sessions(&state.db, user.id).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    let session = load_session(&state.db, user.id, session_id).await?;
    let analytics = load_analytics(&state.db, session.id).await?;
    Ok(Json(SessionDetailResponse { session, analytics }))
}

/// POST /api/v1/interviews/:id/start
///
/// Marks the session IN_PROGRESS and returns the voice assistant configuration.
pub async fn handle_start_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StartedSession>, AppError> {
    Ok(Json(start_session(&state.db, &user, session_id).await?))
}

/// POST /api/v1/interviews/:id/complete
///
/// Stores the transcript and scores it. Feedback generation is bounded by
/// `FEEDBACK_TIMEOUT_SECS`; on timeout the session still completes with a
/// placeholder and `feedback` is null.
pub async fn handle_complete_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<CompletedSession>, AppError> {
    let completed = complete_session(
        &state.db,
        state.llm.as_ref(),
        &user,
        session_id,
        request,
        state.config.feedback_timeout,
    )
    .await?;
    Ok(Json(completed))
}
