//! Industry insight generation and storage.
//!
//! Insights are shared per industry. A refresh whose output had to fall back
//! entirely is discarded so stale-but-real data is never replaced by
//! placeholders.

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::insights::prompts::INSIGHTS_PROMPT_TEMPLATE;
use crate::llm_client::prompts::coach_json_system;
use crate::llm_client::TextGenerator;
use crate::models::insight::IndustryInsightRow;
use crate::recovery::{recover, FieldKind, FieldSpec, SchemaSpec};

/// Days until the next scheduled refresh of a row.
pub const REFRESH_AFTER_DAYS: i64 = 7;

const DEMAND_LEVELS: &[&str] = &["HIGH", "MEDIUM", "LOW"];
const MARKET_OUTLOOKS: &[&str] = &["POSITIVE", "NEUTRAL", "NEGATIVE"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub role: String,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryInsights {
    pub salary_ranges: Vec<SalaryRange>,
    pub growth_rate: f64,
    pub demand_level: String,
    pub top_skills: Vec<String>,
    pub market_outlook: String,
    pub key_trends: Vec<String>,
    pub recommended_skills: Vec<String>,
}

impl IndustryInsights {
    /// Neutral placeholder. Never persisted.
    pub fn unavailable() -> Self {
        Self {
            salary_ranges: vec![],
            growth_rate: 0.0,
            demand_level: "MEDIUM".to_string(),
            top_skills: vec![],
            market_outlook: "NEUTRAL".to_string(),
            key_trends: vec![],
            recommended_skills: vec![],
        }
    }
}

pub fn insights_schema() -> SchemaSpec {
    let amount = || FieldKind::Number {
        min: 0.0,
        max: f64::MAX,
    };
    let salary_range = FieldKind::Object(vec![
        FieldSpec::required("role", FieldKind::text()),
        FieldSpec::required("min", amount()),
        FieldSpec::required("max", amount()),
        FieldSpec::required("median", amount()),
        FieldSpec::text("location", "Unspecified"),
    ]);

    SchemaSpec::object(vec![
        FieldSpec::with_default("salaryRanges", FieldKind::list_of(salary_range, 0), json!([])),
        FieldSpec::with_default(
            "growthRate",
            FieldKind::Number {
                min: -100.0,
                max: 100.0,
            },
            json!(0.0),
        ),
        FieldSpec::with_default("demandLevel", FieldKind::OneOf(DEMAND_LEVELS), json!("MEDIUM")),
        FieldSpec::text_list("topSkills"),
        FieldSpec::with_default(
            "marketOutlook",
            FieldKind::OneOf(MARKET_OUTLOOKS),
            json!("NEUTRAL"),
        ),
        FieldSpec::text_list("keyTrends"),
        FieldSpec::text_list("recommendedSkills"),
    ])
}

pub fn build_insights_prompt(industry: &str) -> String {
    INSIGHTS_PROMPT_TEMPLATE.replace("{industry}", industry)
}

/// Asks the model for insights. `None` when the call failed or the output
/// could not be recovered.
pub async fn generate_insights(generator: &dyn TextGenerator, industry: &str) -> Option<IndustryInsights> {
    let prompt = build_insights_prompt(industry);
    let raw = match generator.generate(&prompt, &coach_json_system()).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Insight model call failed for {industry}: {e}");
            return None;
        }
    };

    let recovered = recover(&raw, &insights_schema(), IndustryInsights::unavailable);
    if recovered.is_fallback() {
        warn!("Insights for {industry} unusable: {:?}", recovered.outcome);
        return None;
    }
    Some(recovered.into_payload())
}

/// Regenerates one industry and upserts it. `None` means generation produced
/// nothing usable and any existing row was left untouched.
pub async fn refresh_industry(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    industry: &str,
) -> Result<Option<IndustryInsightRow>, AppError> {
    let Some(insights) = generate_insights(generator, industry).await else {
        info!("Keeping existing insights for {industry}");
        return Ok(None);
    };

    let now = Utc::now();
    let row = sqlx::query_as::<_, IndustryInsightRow>(
        r#"
        INSERT INTO industry_insights
            (industry, salary_ranges, growth_rate, demand_level, market_outlook,
             top_skills, key_trends, recommended_skills, last_updated, next_update)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (industry) DO UPDATE
        SET salary_ranges = EXCLUDED.salary_ranges,
            growth_rate = EXCLUDED.growth_rate,
            demand_level = EXCLUDED.demand_level,
            market_outlook = EXCLUDED.market_outlook,
            top_skills = EXCLUDED.top_skills,
            key_trends = EXCLUDED.key_trends,
            recommended_skills = EXCLUDED.recommended_skills,
            last_updated = EXCLUDED.last_updated,
            next_update = EXCLUDED.next_update
        RETURNING *
        "#,
    )
    .bind(industry)
    .bind(json!(insights.salary_ranges))
    .bind(insights.growth_rate)
    .bind(&insights.demand_level)
    .bind(&insights.market_outlook)
    .bind(&insights.top_skills)
    .bind(&insights.key_trends)
    .bind(&insights.recommended_skills)
    .bind(now)
    .bind(now + ChronoDuration::days(REFRESH_AFTER_DAYS))
    .fetch_one(pool)
    .await?;

    info!("Insights for {industry} refreshed");
    Ok(Some(row))
}

/// Refreshes every stored industry. Failures are logged per industry and
/// do not stop the loop. Returns how many rows were rewritten.
pub async fn refresh_all(pool: &PgPool, generator: &dyn TextGenerator) -> Result<usize, AppError> {
    let industries: Vec<String> =
        sqlx::query_scalar("SELECT industry FROM industry_insights ORDER BY industry")
            .fetch_all(pool)
            .await?;

    let mut refreshed = 0;
    for industry in &industries {
        match refresh_industry(pool, generator, industry).await {
            Ok(Some(_)) => refreshed += 1,
            Ok(None) => {}
            Err(e) => error!("Refreshing insights for {industry} failed: {e}"),
        }
    }

    info!("Insight refresh finished: {refreshed}/{} industries updated", industries.len());
    Ok(refreshed)
}

pub async fn get_insight(pool: &PgPool, industry: &str) -> Result<Option<IndustryInsightRow>, AppError> {
    Ok(sqlx::query_as::<_, IndustryInsightRow>(
        "SELECT * FROM industry_insights WHERE industry = $1",
    )
    .bind(industry)
    .fetch_optional(pool)
    .await?)
}
