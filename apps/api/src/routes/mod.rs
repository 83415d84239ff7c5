pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::insights::handlers as insights;
use crate::interview::handlers as interview;
use crate::resume::handlers as resume;
use crate::roadmap::handlers as roadmap;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume API
        .route(
            "/api/v1/resume",
            get(resume::handle_get_resume).put(resume::handle_save_resume),
        )
        .route("/api/v1/resume/improve", post(resume::handle_improve))
        .route("/api/v1/resume/analyze", post(resume::handle_analyze))
        .route(
            "/api/v1/resume/analyze/upload",
            post(resume::handle_analyze_upload),
        )
        // Interview API
        .route(
            "/api/v1/interviews",
            get(interview::handle_list_sessions).post(interview::handle_create_session),
        )
        .route(
            "/api/v1/interviews/questions",
            post(interview::handle_preview_questions),
        )
        .route("/api/v1/interviews/:id", get(interview::handle_get_session))
        .route(
            "/api/v1/interviews/:id/start",
            post(interview::handle_start_session),
        )
        .route(
            "/api/v1/interviews/:id/complete",
            post(interview::handle_complete_session),
        )
        // Roadmap API
        .route(
            "/api/v1/roadmaps",
            get(roadmap::handle_list_roadmaps).post(roadmap::handle_create_roadmap),
        )
        // Insights API
        .route("/api/v1/insights", get(insights::handle_get_insights))
        .route(
            "/api/v1/insights/:industry/refresh",
            post(insights::handle_refresh_insights),
        )
        // Chat API
        .route("/api/v1/chat", post(chat::handle_chat))
        .with_state(state)
}
