use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on feedback generation when an interview completes.
    pub feedback_timeout: Duration,
    /// Period of the background industry-insight refresh.
    pub insights_refresh_interval: Duration,
    pub llm_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080_u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            feedback_timeout: Duration::from_secs(optional_env("FEEDBACK_TIMEOUT_SECS", 30_u64)?),
            insights_refresh_interval: hours(optional_env("INSIGHTS_REFRESH_HOURS", 168_u64)?)
                .context("INSIGHTS_REFRESH_HOURS is out of range")?,
            llm_timeout: Duration::from_secs(optional_env("LLM_TIMEOUT_SECS", 120_u64)?),
        })
    }
}

fn hours(count: u64) -> Option<Duration> {
    count.checked_mul(60 * 60).map(Duration::from_secs)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
