//! Structured output recovery.
//!
//! Turns unreliable model text into a value that satisfies a feature's
//! schema, degrading gracefully instead of failing:
//!
//! 1. strip code fences
//! 2. slice to the outermost `{…}` (or `[…]` for list schemas)
//! 3. parse
//! 4. on parse failure, salvage a single bounded score if the schema has one
//! 5. patch missing or mistyped fields with per-field defaults
//! 6. anything still invalid → the caller's fallback, untouched
//!
//! `recover` never returns an error. Collaborator failures (timeouts,
//! transport errors) are the caller's to handle before getting here.

pub mod salvage;
pub mod schema;

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use schema::{FieldKind, FieldSpec, SchemaSpec, DEFAULT_SCORE};

use schema::{conform_root, Conformed};

/// Salvaged free text is cut to this many characters.
const SALVAGED_TEXT_LIMIT: usize = 1000;

/// How the returned payload was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// Parsed and already complete.
    Parsed,
    /// Parsed; the listed fields were replaced by their defaults.
    Patched { fields: Vec<String> },
    /// Not JSON; a score was pulled out of the text.
    Salvaged { score: i64 },
    Fallback { reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyInput,
    Unparsable,
    Unpatchable { field: String },
    Deserialize { message: String },
}

/// A payload that satisfies its schema, plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered<T> {
    pub payload: T,
    pub outcome: RecoveryOutcome,
}

impl<T> Recovered<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, RecoveryOutcome::Fallback { .. })
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

/// Recovers a `T` from raw model text. See the module docs for the pipeline.
pub fn recover<T, F>(raw: &str, schema: &SchemaSpec, fallback: F) -> Recovered<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let (value, outcome) = match recover_value(raw, schema) {
        Ok(recovered) => recovered,
        Err(reason) => return fall_back(reason, fallback),
    };

    match serde_json::from_value::<T>(value) {
        Ok(payload) => {
            debug!("Recovered structured output: {:?}", outcome);
            Recovered { payload, outcome }
        }
        Err(e) => fall_back(
            FallbackReason::Deserialize {
                message: e.to_string(),
            },
            fallback,
        ),
    }
}

fn fall_back<T>(reason: FallbackReason, fallback: impl FnOnce() -> T) -> Recovered<T> {
    warn!("Model output unusable, substituting fallback: {:?}", reason);
    Recovered {
        payload: fallback(),
        outcome: RecoveryOutcome::Fallback { reason },
    }
}

/// The schema-agnostic part of the pipeline, producing a conformed JSON value.
pub fn recover_value(
    raw: &str,
    schema: &SchemaSpec,
) -> Result<(Value, RecoveryOutcome), FallbackReason> {
    let cleaned = strip_fences(raw);
    if cleaned.is_empty() {
        return Err(FallbackReason::EmptyInput);
    }

    let (open, close) = if schema.is_list() { ('[', ']') } else { ('{', '}') };
    let sliced = slice_payload(&cleaned, open, close);

    let parsed = serde_json::from_str::<Value>(sliced)
        .ok()
        .filter(|v| if schema.is_list() { v.is_array() } else { v.is_object() });

    let (candidate, salvaged) = match parsed {
        Some(v) => (v, None),
        None => {
            let (v, score) = salvage(&cleaned, schema).ok_or(FallbackReason::Unparsable)?;
            (v, Some(score))
        }
    };

    match conform_root(schema, &candidate) {
        Conformed::Valid { value, patched } => {
            let outcome = match salvaged {
                Some(_) => RecoveryOutcome::Salvaged {
                    score: salvaged_score(schema, &value),
                },
                None if patched.is_empty() => RecoveryOutcome::Parsed,
                None => RecoveryOutcome::Patched { fields: patched },
            };
            Ok((value, outcome))
        }
        Conformed::Rejected { path } => Err(FallbackReason::Unpatchable { field: path }),
    }
}

fn fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A fence line: ``` plus an optional language tag, alone on its line.
    RE.get_or_init(|| Regex::new(r"(?m)```[\w+-]*[ \t\r]*$\n?").expect("valid regex"))
}

/// Removes code-fence lines and trims the result.
pub fn strip_fences(text: &str) -> String {
    fence_pattern().replace_all(text, "").trim().to_string()
}

/// Slices to the span between the first `open` and the last `close`, when
/// both exist in that order. Otherwise returns the text unchanged.
pub fn slice_payload(text: &str, open: char, close: char) -> &str {
    match (text.find(open), text.rfind(close)) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

fn salvage(cleaned: &str, schema: &SchemaSpec) -> Option<(Value, u32)> {
    let target = schema.salvage_target()?;
    let score = salvage::salvage_score(cleaned)?;

    let mut obj = Map::new();
    obj.insert(target.score_field.to_string(), Value::from(score));
    if let Some(text_field) = target.text_field {
        let text: String = cleaned.chars().take(SALVAGED_TEXT_LIMIT).collect();
        obj.insert(text_field.to_string(), Value::from(text));
    }
    Some((Value::Object(obj), score))
}

fn salvaged_score(schema: &SchemaSpec, value: &Value) -> i64 {
    schema
        .salvage_target()
        .and_then(|t| value.get(t.score_field))
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Category {
        name: String,
        score: i64,
        comment: String,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Feedback {
        total_score: i64,
        category_scores: Vec<Category>,
        strengths: Vec<String>,
        final_assessment: String,
    }

    const CATEGORIES: [&str; 2] = ["Communication", "Technical"];

    fn default_categories() -> Value {
        Value::Array(
            CATEGORIES
                .iter()
                .map(|n| json!({"name": n, "score": DEFAULT_SCORE, "comment": "Not assessed"}))
                .collect(),
        )
    }

    fn feedback_schema() -> SchemaSpec {
        SchemaSpec::object(vec![
            FieldSpec::score("totalScore"),
            FieldSpec::with_default(
                "categoryScores",
                FieldKind::list_of(
                    FieldKind::Object(vec![
                        FieldSpec::required("name", FieldKind::text()),
                        FieldSpec::score("score"),
                        FieldSpec::text("comment", ""),
                    ]),
                    1,
                ),
                default_categories(),
            ),
            FieldSpec::text_list("strengths"),
            FieldSpec::text("finalAssessment", "No assessment available."),
        ])
        .with_salvage("totalScore", Some("finalAssessment"))
    }

    fn fallback() -> Feedback {
        Feedback {
            total_score: DEFAULT_SCORE,
            category_scores: CATEGORIES
                .iter()
                .map(|n| Category {
                    name: n.to_string(),
                    score: DEFAULT_SCORE,
                    comment: "Not assessed".to_string(),
                })
                .collect(),
            strengths: vec![],
            final_assessment: "Feedback could not be generated.".to_string(),
        }
    }

    const COMPLETE: &str = r#"{"totalScore":92,"categoryScores":[{"name":"Communication","score":90,"comment":"Clear"},{"name":"Technical","score":94,"comment":"Deep"}],"strengths":["Clarity"],"finalAssessment":"Strong hire"}"#;

    #[test]
    fn test_complete_payload_is_parsed_unchanged() {
        let out = recover(COMPLETE, &feedback_schema(), fallback);
        assert_eq!(out.outcome, RecoveryOutcome::Parsed);
        assert_eq!(out.payload.total_score, 92);
        assert_eq!(out.payload.category_scores[1].score, 94);
        assert_eq!(out.payload.final_assessment, "Strong hire");
    }

    #[test]
    fn test_fenced_payload_matches_unfenced() {
        let fenced = format!("```json\n{COMPLETE}\n```");
        let plain = recover(COMPLETE, &feedback_schema(), fallback);
        let wrapped = recover(&fenced, &feedback_schema(), fallback);
        assert_eq!(plain, wrapped);
        assert_eq!(wrapped.payload.total_score, 92);

        let bare_fence = format!("```\n{COMPLETE}\n```\n");
        assert_eq!(recover(&bare_fence, &feedback_schema(), fallback), plain);
    }

    #[test]
    fn test_empty_input_returns_fallback() {
        let out = recover("", &feedback_schema(), fallback);
        assert_eq!(out.payload, fallback());
        assert!(out.payload.category_scores.iter().all(|c| c.score == 0));
        assert_eq!(
            out.outcome,
            RecoveryOutcome::Fallback {
                reason: FallbackReason::EmptyInput
            }
        );
        assert!(recover("```json\n```", &feedback_schema(), fallback).is_fallback());
    }

    #[test]
    fn test_prose_around_object_is_ignored() {
        let schema = SchemaSpec::object(vec![
            FieldSpec::score("score"),
            FieldSpec::required(
                "feedback",
                FieldKind::Object(vec![FieldSpec::required("summary", FieldKind::text())]),
            ),
        ]);
        let raw = r#"Sure! Here's the analysis: {"score": 85, "feedback": {"summary": "Good fit"}} Hope that helps!"#;
        let (value, outcome) = recover_value(raw, &schema).unwrap();
        assert_eq!(outcome, RecoveryOutcome::Parsed);
        assert_eq!(value, json!({"score": 85, "feedback": {"summary": "Good fit"}}));
    }

    #[test]
    fn test_scores_are_clamped_and_rounded() {
        let raw = r#"{"totalScore": 87.6, "categoryScores": [{"name":"Communication","score":-5,"comment":"x"},{"name":"Technical","score":150,"comment":"y"}], "strengths": [], "finalAssessment": "ok"}"#;
        let out = recover(raw, &feedback_schema(), fallback);
        assert_eq!(out.outcome, RecoveryOutcome::Parsed);
        assert_eq!(out.payload.total_score, 88);
        assert_eq!(out.payload.category_scores[0].score, 0);
        assert_eq!(out.payload.category_scores[1].score, 100);
    }

    #[test]
    fn test_missing_fields_take_their_defaults() {
        let out = recover(r#"{"totalScore": 70}"#, &feedback_schema(), fallback);
        assert_eq!(out.payload.total_score, 70);
        assert_eq!(out.payload.category_scores, fallback().category_scores);
        assert!(out.payload.strengths.is_empty());
        assert_eq!(out.payload.final_assessment, "No assessment available.");
        assert_eq!(
            out.outcome,
            RecoveryOutcome::Patched {
                fields: vec![
                    "categoryScores".to_string(),
                    "strengths".to_string(),
                    "finalAssessment".to_string()
                ]
            }
        );
    }

    #[test]
    fn test_unparsable_without_salvage_returns_fallback() {
        let schema = SchemaSpec::object(vec![FieldSpec::required("title", FieldKind::text())]);
        let out = recover::<Value, _>("{\"title\": \"Road", &schema, || json!({"title": "fb"}));
        assert_eq!(out.payload, json!({"title": "fb"}));
        assert_eq!(
            out.outcome,
            RecoveryOutcome::Fallback {
                reason: FallbackReason::Unparsable
            }
        );
    }

    #[test]
    fn test_truncated_json_salvages_score() {
        let raw = "{\"totalScore\": 78, \"categoryScores\": [{\"name\": \"Comm";
        let out = recover(raw, &feedback_schema(), fallback);
        assert_eq!(out.outcome, RecoveryOutcome::Salvaged { score: 78 });
        assert_eq!(out.payload.total_score, 78);
        assert_eq!(out.payload.final_assessment, raw);
        assert_eq!(out.payload.category_scores, fallback().category_scores);
    }

    #[test]
    fn test_salvaged_score_is_clamped() {
        let out = recover("I'd rate this 140/100!", &feedback_schema(), fallback);
        assert_eq!(out.outcome, RecoveryOutcome::Salvaged { score: 100 });
        assert_eq!(out.payload.total_score, 100);
    }

    #[test]
    fn test_salvaged_decimal_score_is_rounded() {
        let out = recover("Overall: 87.6/100", &feedback_schema(), fallback);
        assert_eq!(out.outcome, RecoveryOutcome::Salvaged { score: 88 });

        let out = recover("Overall score 87.6 out of 100", &feedback_schema(), fallback);
        assert_eq!(out.payload.total_score, 88);

        let out = recover("Score 1250/100", &feedback_schema(), fallback);
        assert_eq!(out.outcome, RecoveryOutcome::Salvaged { score: 100 });
    }

    #[test]
    fn test_prose_without_numbers_falls_back() {
        let out = recover(
            "I cannot evaluate this transcript.",
            &feedback_schema(),
            fallback,
        );
        assert_eq!(out.payload, fallback());
    }

    #[test]
    fn test_unpatchable_required_field_falls_back() {
        let schema = SchemaSpec::object(vec![
            FieldSpec::required("title", FieldKind::text()),
            FieldSpec::text_list("tags"),
        ]);
        let out = recover::<Value, _>(r#"{"tags": ["a"]}"#, &schema, || json!({"title": "fb"}));
        assert_eq!(
            out.outcome,
            RecoveryOutcome::Fallback {
                reason: FallbackReason::Unpatchable {
                    field: "title".to_string()
                }
            }
        );
    }

    #[test]
    fn test_wrong_root_shape_is_not_accepted() {
        // A bare number parses as JSON but is not an object payload.
        let out = recover("42", &feedback_schema(), fallback);
        assert_eq!(out.outcome, RecoveryOutcome::Salvaged { score: 42 });

        let list = SchemaSpec::list(FieldKind::text(), 1);
        let out = recover::<Vec<String>, _>(r#"{"questions": 3}"#, &list, Vec::new);
        assert!(out.is_fallback());
    }

    #[test]
    fn test_list_schema_slices_brackets() {
        let schema = SchemaSpec::list(FieldKind::text(), 1);
        let raw = "Here are your questions:\n```json\n[\"Why Rust?\", \"Explain ownership.\"]\n```";
        let out = recover::<Vec<String>, _>(raw, &schema, Vec::new);
        assert_eq!(out.outcome, RecoveryOutcome::Parsed);
        assert_eq!(out.payload, vec!["Why Rust?", "Explain ownership."]);
    }

    #[test]
    fn test_deserialize_failure_falls_back() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct NeedsMore {
            title: String,
            owner: String,
        }
        let schema = SchemaSpec::object(vec![FieldSpec::required("title", FieldKind::text())]);
        let out = recover(r#"{"title": "x"}"#, &schema, || NeedsMore {
            title: "fb".to_string(),
            owner: "fb".to_string(),
        });
        assert!(matches!(
            out.outcome,
            RecoveryOutcome::Fallback {
                reason: FallbackReason::Deserialize { .. }
            }
        ));
        assert_eq!(out.payload.title, "fb");
    }

    #[test]
    fn test_slice_payload_requires_ordered_delimiters() {
        assert_eq!(slice_payload("} nothing {", '{', '}'), "} nothing {");
        assert_eq!(slice_payload("a {\"k\": 1} b", '{', '}'), "{\"k\": 1}");
        assert_eq!(slice_payload("no braces", '{', '}'), "no braces");
    }

    #[test]
    fn test_strip_fences_keeps_inline_content() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }
}
