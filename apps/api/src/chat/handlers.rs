//! Axum route handlers for the coaching chat.

use axum::{extract::State, Json};

use crate::auth::CurrentUser;
use crate::chat::coach::{reply, ChatRequest, ChatResponse};
use crate::chat::context::load_user_context;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let ctx = load_user_context(&state.db, &user).await?;
    let response = reply(state.llm.as_ref(), &ctx, &request).await?;
    Ok(Json(response))
}
