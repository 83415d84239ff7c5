//! Loads everything the coach knows about a user for one chat turn.

use sqlx::PgPool;

use crate::errors::AppError;
use crate::insights::generator::get_insight;
use crate::interview::session::list_sessions;
use crate::models::insight::IndustryInsightRow;
use crate::models::interview::{CallAnalyticsRow, InterviewSessionRow};
use crate::models::resume::ResumeRow;
use crate::models::roadmap::RoadmapRow;
use crate::models::user::User;
use crate::resume::store::get_resume;
use crate::roadmap::generator::list_roadmaps;

/// Sessions and call analytics included in the prompt, newest first.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct UserContext {
    pub user: User,
    pub insight: Option<IndustryInsightRow>,
    pub sessions: Vec<InterviewSessionRow>,
    pub analytics: Vec<CallAnalyticsRow>,
    pub resume: Option<ResumeRow>,
    pub roadmaps: Vec<RoadmapRow>,
}

pub async fn load_user_context(pool: &PgPool, user: &User) -> Result<UserContext, AppError> {
    let insight = match user.industry.as_deref() {
        Some(industry) => get_insight(pool, industry).await?,
        None => None,
    };

    let mut sessions = list_sessions(pool, user.id).await?;
    sessions.truncate(RECENT_LIMIT);

    let analytics = sqlx::query_as::<_, CallAnalyticsRow>(
        "SELECT * FROM call_analytics WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user.id)
    .bind(RECENT_LIMIT as i64)
    .fetch_all(pool)
    .await?;

    Ok(UserContext {
        user: user.clone(),
        insight,
        sessions,
        analytics,
        resume: get_resume(pool, user.id).await?,
        roadmaps: list_roadmaps(pool, user.id).await?,
    })
}
