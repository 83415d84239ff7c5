//! Axum route handlers for the Insights API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::insights::generator::{get_insight, refresh_industry};
use crate::models::insight::IndustryInsightRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub insight: IndustryInsightRow,
    /// False when the model output was unusable and the stored row was kept.
    pub refreshed: bool,
}

/// GET /api/v1/insights
///
/// Insights for the current user's industry, generated on first access.
pub async fn handle_get_insights(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<IndustryInsightRow>, AppError> {
    let industry = user
        .industry
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Set your industry to see insights".to_string()))?;

    if let Some(row) = get_insight(&state.db, industry).await? {
        return Ok(Json(row));
    }

    refresh_industry(&state.db, state.llm.as_ref(), industry)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Insights for {industry} are not available yet")))
}

/// POST /api/v1/insights/:industry/refresh
pub async fn handle_refresh_insights(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(industry): Path<String>,
) -> Result<Json<RefreshResponse>, AppError> {
    let industry = industry.trim();
    if industry.is_empty() {
        return Err(AppError::Validation("industry cannot be empty".to_string()));
    }

    if let Some(insight) = refresh_industry(&state.db, state.llm.as_ref(), industry).await? {
        return Ok(Json(RefreshResponse {
            insight,
            refreshed: true,
        }));
    }

    let insight = get_insight(&state.db, industry)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Insights for {industry} are not available yet")))?;
    Ok(Json(RefreshResponse {
        insight,
        refreshed: false,
    }))
}
