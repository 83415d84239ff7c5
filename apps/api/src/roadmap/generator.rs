//! Learning roadmap generation.
//!
//! Inputs are validated up front; after that generation cannot fail on the
//! model's account. Unusable output is replaced by a generic three-phase plan
//! and the row is stored with status FALLBACK.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::coach_json_system;
use crate::llm_client::TextGenerator;
use crate::models::roadmap::RoadmapRow;
use crate::recovery::{recover, FieldKind, FieldSpec, SchemaSpec};
use crate::roadmap::prompts::ROADMAP_PROMPT_TEMPLATE;

pub const STATUS_COMPLETE: &str = "COMPLETE";
pub const STATUS_FALLBACK: &str = "FALLBACK";

const TASK_TYPES: &[&str] = &["learning", "project", "assessment"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapInput {
    pub domain: String,
    pub subdomain: String,
    pub hours_per_day: i64,
    pub duration: String,
    pub goal: String,
    pub schedule_pattern: String,
    pub existing_knowledge: String,
    pub motivation: String,
    pub exercises_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<String>,
}

impl RoadmapInput {
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("Domain", &self.domain),
            ("Subdomain", &self.subdomain),
            ("Duration", &self.duration),
            ("Goal", &self.goal),
            ("Schedule pattern", &self.schedule_pattern),
            ("Existing knowledge", &self.existing_knowledge),
            ("Motivation", &self.motivation),
        ];
        if let Some((label, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::Validation(format!("{label} is required.")));
        }
        if !(1..=24).contains(&self.hours_per_day) {
            return Err(AppError::Validation(
                "Hours per day must be between 1 and 24.".to_string(),
            ));
        }
        if self.exercises_count < 0 {
            return Err(AppError::Validation(
                "Exercises count cannot be negative.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapTask {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub description: String,
    pub tasks: Vec<RoadmapTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub title: String,
    pub milestones: Vec<Milestone>,
}

impl Roadmap {
    /// Generic plan used when the model produced nothing usable.
    pub fn fallback(input: &RoadmapInput) -> Self {
        let phase = |title: &str, description: &str, task: (&str, &str, &str)| Milestone {
            title: title.to_string(),
            description: description.to_string(),
            tasks: vec![RoadmapTask {
                title: task.0.to_string(),
                description: task.1.to_string(),
                kind: task.2.to_string(),
            }],
        };

        Self {
            title: format!("{} roadmap: {}", input.subdomain.trim(), input.goal.trim()),
            milestones: vec![
                phase(
                    "Phase 1: Foundations",
                    "Review the core concepts of the field.",
                    (
                        "Study the fundamentals",
                        "Work through an introductory course or book for the subdomain.",
                        "learning",
                    ),
                ),
                phase(
                    "Phase 2: Practice",
                    "Apply what you learned to something concrete.",
                    (
                        "Build a small project",
                        "Pick a project that exercises the main skills of the subdomain.",
                        "project",
                    ),
                ),
                phase(
                    "Phase 3: Assessment",
                    "Check your progress against the goal.",
                    (
                        "Self-assessment",
                        "Solve practice problems or a mock interview to find gaps.",
                        "assessment",
                    ),
                ),
            ],
        }
    }
}

pub fn roadmap_schema() -> SchemaSpec {
    let task = FieldKind::Object(vec![
        FieldSpec::required("title", FieldKind::text()),
        FieldSpec::text("description", ""),
        FieldSpec::with_default("type", FieldKind::OneOf(TASK_TYPES), json!("learning")),
    ]);
    let milestone = FieldKind::Object(vec![
        FieldSpec::required("title", FieldKind::text()),
        FieldSpec::text("description", ""),
        FieldSpec::with_default("tasks", FieldKind::list_of(task, 0), json!([])),
    ]);

    SchemaSpec::object(vec![
        FieldSpec::text("title", "Personalized learning roadmap"),
        FieldSpec::required("milestones", FieldKind::list_of(milestone, 1)),
    ])
}

pub fn build_roadmap_prompt(input: &RoadmapInput) -> String {
    let extras = input
        .extras
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("None");

    ROADMAP_PROMPT_TEMPLATE
        .replace("{goal}", input.goal.trim())
        .replace("{motivation}", input.motivation.trim())
        .replace("{existing_knowledge}", input.existing_knowledge.trim())
        .replace("{hours_per_day}", &input.hours_per_day.to_string())
        .replace("{duration}", input.duration.trim())
        .replace("{schedule_pattern}", input.schedule_pattern.trim())
        .replace("{domain}", input.domain.trim())
        .replace("{subdomain}", input.subdomain.trim())
        .replace("{exercises_count}", &input.exercises_count.to_string())
        .replace("{extras}", extras)
}

/// Output of one generation before it is stored.
#[derive(Debug, Clone)]
pub struct GeneratedRoadmap {
    pub roadmap: Roadmap,
    /// Raw model text; empty when the call failed.
    pub raw: String,
    pub status: &'static str,
}

pub async fn generate_roadmap(generator: &dyn TextGenerator, input: &RoadmapInput) -> GeneratedRoadmap {
    let prompt = build_roadmap_prompt(input);
    let raw = match generator.generate(&prompt, &coach_json_system()).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Roadmap model call failed: {e}");
            return GeneratedRoadmap {
                roadmap: Roadmap::fallback(input),
                raw: String::new(),
                status: STATUS_FALLBACK,
            };
        }
    };

    let recovered = recover(&raw, &roadmap_schema(), || Roadmap::fallback(input));
    let status = if recovered.is_fallback() {
        STATUS_FALLBACK
    } else {
        STATUS_COMPLETE
    };

    GeneratedRoadmap {
        roadmap: recovered.into_payload(),
        raw,
        status,
    }
}

/// Validates, generates and stores a roadmap for the user.
pub async fn create_roadmap(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
    input: &RoadmapInput,
) -> Result<RoadmapRow, AppError> {
    input.validate()?;

    let generated = generate_roadmap(generator, input).await;
    let inputs: Value = serde_json::to_value(input).map_err(|e| AppError::Internal(e.into()))?;
    let ai_json: Value =
        serde_json::to_value(&generated.roadmap).map_err(|e| AppError::Internal(e.into()))?;

    let row = sqlx::query_as::<_, RoadmapRow>(
        r#"
        INSERT INTO roadmaps (user_id, domain, subdomain, inputs, ai_raw, ai_json, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(input.domain.trim())
    .bind(input.subdomain.trim())
    .bind(&inputs)
    .bind(&generated.raw)
    .bind(&ai_json)
    .bind(generated.status)
    .fetch_one(pool)
    .await?;

    info!(
        "Roadmap {} stored ({}, {} milestones)",
        row.id,
        row.status,
        generated.roadmap.milestones.len()
    );
    Ok(row)
}

pub async fn list_roadmaps(pool: &PgPool, user_id: Uuid) -> Result<Vec<RoadmapRow>, AppError> {
    Ok(sqlx::query_as::<_, RoadmapRow>(
        "SELECT * FROM roadmaps WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}
