use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Identifier issued by the upstream authentication provider.
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}
