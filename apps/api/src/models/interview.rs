use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an interview session.
/// SCHEDULED → IN_PROGRESS → COMPLETED, with FAILED on infrastructure errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "SCHEDULED",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_type: String,
    pub interview_type: String,
    pub industry: Option<String>,
    pub role: String,
    pub difficulty: String,
    pub duration_minutes: i32,
    pub status: String,
    /// JSON array of question strings.
    pub questions: Value,
    pub overall_score: Option<i32>,
    pub technical_score: Option<i32>,
    pub communication_score: Option<i32>,
    pub confidence_score: Option<i32>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub detailed_feedback: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InterviewSessionRow {
    /// Questions as plain strings. Object entries with a `question` or `text`
    /// key are accepted for rows written by older clients.
    pub fn question_texts(&self) -> Vec<String> {
        self.questions
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|q| match q {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(o) => o
                            .get("question")
                            .or_else(|| o.get("text"))
                            .and_then(Value::as_str)
                            .map(String::from),
                        _ => None,
                    })
                    .filter(|q| !q.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CallAnalyticsRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub transcript: String,
    pub metadata: Value,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
