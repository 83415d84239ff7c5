use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Model client. A trait object so tests can substitute canned output.
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
}
