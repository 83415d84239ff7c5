use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadmapRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub domain: String,
    pub subdomain: String,
    pub inputs: Value,
    /// Raw model text, empty when the model call failed.
    pub ai_raw: String,
    pub ai_json: Value,
    /// COMPLETE when the roadmap came from the model, FALLBACK otherwise.
    pub status: String,
    pub created_at: DateTime<Utc>,
}
