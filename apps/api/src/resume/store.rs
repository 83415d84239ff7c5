//! Resume persistence. One resume per user; writes are upserts keyed by user.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;

pub async fn save_resume(pool: &PgPool, user_id: Uuid, content: &str) -> Result<ResumeRow, AppError> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (user_id, content)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE
        SET content = EXCLUDED.content, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await?)
}

pub async fn get_resume(pool: &PgPool, user_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
    Ok(
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Stores an ATS result. When the user has no resume yet, the analysed
/// content becomes their resume.
pub async fn save_analysis(
    pool: &PgPool,
    user_id: Uuid,
    content: &str,
    score: i32,
    feedback: &Value,
) -> Result<ResumeRow, AppError> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (user_id, content, ats_score, feedback)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO UPDATE
        SET ats_score = EXCLUDED.ats_score,
            feedback = EXCLUDED.feedback,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(content)
    .bind(score)
    .bind(feedback)
    .fetch_one(pool)
    .await?)
}
