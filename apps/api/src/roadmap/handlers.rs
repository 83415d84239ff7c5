//! Axum route handlers for the Roadmap API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::roadmap::RoadmapRow;
use crate::roadmap::generator::{create_roadmap, list_roadmaps, RoadmapInput};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RoadmapListResponse {
    pub roadmaps: Vec<RoadmapRow>,
}

/// POST /api/v1/roadmaps
///
/// Returns the stored row; `status` is FALLBACK when the generic plan was used.
pub async fn handle_create_roadmap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RoadmapInput>,
) -> Result<Json<RoadmapRow>, AppError> {
    let row = create_roadmap(&state.db, state.llm.as_ref(), user.id, &input).await?;
    Ok(Json(row))
}

/// GET /api/v1/roadmaps
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RoadmapListResponse>, AppError> {
    let roadmaps = list_roadmaps(&state.db, user.id).await?;
    Ok(Json(RoadmapListResponse { roadmaps }))
}
