//! Declarative schema descriptions and the per-field patch pass.
//!
//! A `SchemaSpec` names the fields a feature needs, their kinds, bounds and
//! per-field defaults. `conform` walks a parsed JSON value against it:
//! numbers are clamped and rounded, strings normalised, invalid list items
//! dropped, and missing or mistyped fields replaced by their default. A field
//! without a default is required; if it cannot be conformed the whole payload
//! is rejected.

use serde_json::{Map, Number, Value};

/// The one score used whenever a score has to be invented: missing fields,
/// salvage-free fallbacks and placeholder payloads all use it.
pub const DEFAULT_SCORE: i64 = 0;

/// Upper bound of every score scale.
pub const MAX_SCORE: i64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Clamped to `[min, max]` and rounded to the nearest integer.
    Integer { min: i64, max: i64 },
    /// Clamped to `[min, max]`.
    Number { min: f64, max: f64 },
    Text { allow_empty: bool },
    /// Case-insensitive match, normalised to the canonical spelling.
    OneOf(&'static [&'static str]),
    /// Array of strings. Non-string and blank items are dropped.
    TextList,
    Object(Vec<FieldSpec>),
    /// Invalid items are dropped; fewer than `min_items` survivors rejects the list.
    List { item: Box<FieldKind>, min_items: usize },
}

impl FieldKind {
    pub fn score() -> Self {
        FieldKind::Integer {
            min: 0,
            max: MAX_SCORE,
        }
    }

    pub fn text() -> Self {
        FieldKind::Text { allow_empty: false }
    }

    pub fn list_of(item: FieldKind, min_items: usize) -> Self {
        FieldKind::List {
            item: Box::new(item),
            min_items,
        }
    }

    fn is_bounded_integer(&self) -> bool {
        matches!(self, FieldKind::Integer { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// `None` marks the field as required.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    pub fn with_default(name: &'static str, kind: FieldKind, default: Value) -> Self {
        Self {
            name,
            kind,
            default: Some(default),
        }
    }

    /// A 0–100 score defaulting to `DEFAULT_SCORE`.
    pub fn score(name: &'static str) -> Self {
        Self::with_default(name, FieldKind::score(), Value::from(DEFAULT_SCORE))
    }

    pub fn text(name: &'static str, default: &str) -> Self {
        Self::with_default(name, FieldKind::text(), Value::from(default))
    }

    pub fn text_list(name: &'static str) -> Self {
        Self::with_default(name, FieldKind::TextList, Value::Array(Vec::new()))
    }
}

/// Where salvaged data goes when the payload cannot be parsed at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Salvage {
    pub score_field: &'static str,
    pub text_field: Option<&'static str>,
}

/// Description of one feature's expected structured output.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec {
    pub root: FieldKind,
    pub salvage: Option<Salvage>,
}

impl SchemaSpec {
    pub fn object(fields: Vec<FieldSpec>) -> Self {
        Self {
            root: FieldKind::Object(fields),
            salvage: None,
        }
    }

    pub fn list(item: FieldKind, min_items: usize) -> Self {
        Self {
            root: FieldKind::list_of(item, min_items),
            salvage: None,
        }
    }

    /// Enables numeric salvage on `score_field`, which must be a top-level
    /// bounded integer. `text_field` receives the cleaned model text.
    pub fn with_salvage(mut self, score_field: &'static str, text_field: Option<&'static str>) -> Self {
        self.salvage = Some(Salvage {
            score_field,
            text_field,
        });
        self
    }

    pub fn is_list(&self) -> bool {
        matches!(self.root, FieldKind::List { .. })
    }

    /// The salvage target, provided the schema really expects a single
    /// bounded score under that name.
    pub(crate) fn salvage_target(&self) -> Option<&Salvage> {
        let salvage = self.salvage.as_ref()?;
        let FieldKind::Object(fields) = &self.root else {
            return None;
        };
        fields
            .iter()
            .any(|f| f.name == salvage.score_field && f.kind.is_bounded_integer())
            .then_some(salvage)
    }
}

/// Result of walking a value against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Conformed {
    Valid { value: Value, patched: Vec<String> },
    /// A required field at `path` was missing or unusable.
    Rejected { path: String },
}

pub fn conform_root(schema: &SchemaSpec, value: &Value) -> Conformed {
    let mut patched = Vec::new();
    match conform(&schema.root, value, "", &mut patched) {
        Ok(value) => Conformed::Valid { value, patched },
        Err(path) => Conformed::Rejected {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path
            },
        },
    }
}

/// Returns the normalised value, or the path of the first unpatchable field.
fn conform(
    kind: &FieldKind,
    value: &Value,
    path: &str,
    patched: &mut Vec<String>,
) -> Result<Value, String> {
    let reject = || path.to_string();

    match kind {
        FieldKind::Integer { min, max } => {
            let n = as_number(value).ok_or_else(reject)?;
            let clamped = n.clamp(*min as f64, *max as f64).round() as i64;
            Ok(Value::from(clamped))
        }
        FieldKind::Number { min, max } => {
            let n = as_number(value).ok_or_else(reject)?;
            Number::from_f64(n.clamp(*min, *max))
                .map(Value::Number)
                .ok_or_else(reject)
        }
        FieldKind::Text { allow_empty } => match value {
            Value::String(s) if *allow_empty || !s.trim().is_empty() => {
                Ok(Value::String(s.trim().to_string()))
            }
            _ => Err(reject()),
        },
        FieldKind::OneOf(options) => {
            let s = value.as_str().ok_or_else(reject)?.trim();
            options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(s))
                .map(|o| Value::from(*o))
                .ok_or_else(reject)
        }
        FieldKind::TextList => {
            let items = value.as_array().ok_or_else(reject)?;
            Ok(Value::Array(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(Value::from)
                    .collect(),
            ))
        }
        FieldKind::Object(fields) => {
            let obj = value.as_object().ok_or_else(reject)?;
            let mut out = Map::with_capacity(fields.len());
            for field in fields {
                let field_path = join_path(path, field.name);
                let mut field_patched = Vec::new();
                let conformed = match obj.get(field.name) {
                    Some(v) if !v.is_null() => {
                        conform(&field.kind, v, &field_path, &mut field_patched)
                    }
                    _ => Err(field_path.clone()),
                };
                let v = match (conformed, &field.default) {
                    (Ok(v), _) => {
                        patched.extend(field_patched);
                        v
                    }
                    (Err(_), Some(default)) => {
                        patched.push(field_path);
                        default.clone()
                    }
                    (Err(failed), None) => return Err(failed),
                };
                out.insert(field.name.to_string(), v);
            }
            Ok(Value::Object(out))
        }
        FieldKind::List { item, min_items } => {
            let items = value.as_array().ok_or_else(reject)?;
            let mut kept = Vec::with_capacity(items.len());
            for (i, v) in items.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                // Patches inside a dropped item are not reported.
                let mut item_patched = Vec::new();
                match conform(item, v, &item_path, &mut item_patched) {
                    Ok(v) => {
                        patched.extend(item_patched);
                        kept.push(v);
                    }
                    Err(_) => patched.push(item_path),
                }
            }
            if kept.len() < *min_items {
                return Err(reject());
            }
            Ok(Value::Array(kept))
        }
    }
}

/// Numbers and numeric strings ("85", " 87.5 ") are both accepted.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score_schema() -> SchemaSpec {
        SchemaSpec::object(vec![
            FieldSpec::score("score"),
            FieldSpec::required("summary", FieldKind::text()),
        ])
    }

    #[test]
    fn test_integer_clamped_and_rounded() {
        let kind = FieldKind::score();
        let mut patched = Vec::new();
        assert_eq!(conform(&kind, &json!(-5), "s", &mut patched), Ok(json!(0)));
        assert_eq!(conform(&kind, &json!(150), "s", &mut patched), Ok(json!(100)));
        assert_eq!(conform(&kind, &json!(87.6), "s", &mut patched), Ok(json!(88)));
        assert_eq!(conform(&kind, &json!("72"), "s", &mut patched), Ok(json!(72)));
        assert!(patched.is_empty());
    }

    #[test]
    fn test_integer_rejects_non_numbers() {
        let mut patched = Vec::new();
        assert_eq!(
            conform(&FieldKind::score(), &json!("high"), "score", &mut patched),
            Err("score".to_string())
        );
        assert_eq!(
            conform(&FieldKind::score(), &json!(true), "score", &mut patched),
            Err("score".to_string())
        );
    }

    #[test]
    fn test_one_of_normalises_case() {
        let kind = FieldKind::OneOf(&["HIGH", "MEDIUM", "LOW"]);
        let mut patched = Vec::new();
        assert_eq!(conform(&kind, &json!(" medium "), "d", &mut patched), Ok(json!("MEDIUM")));
        assert!(conform(&kind, &json!("VERY HIGH"), "d", &mut patched).is_err());
    }

    #[test]
    fn test_text_list_drops_non_strings() {
        let mut patched = Vec::new();
        let out = conform(
            &FieldKind::TextList,
            &json!(["Rust", 3, null, "  ", " SQL "]),
            "skills",
            &mut patched,
        );
        assert_eq!(out, Ok(json!(["Rust", "SQL"])));
    }

    #[test]
    fn test_missing_defaulted_field_is_patched() {
        let schema = score_schema();
        let out = conform_root(&schema, &json!({"summary": "Solid"}));
        assert_eq!(
            out,
            Conformed::Valid {
                value: json!({"score": DEFAULT_SCORE, "summary": "Solid"}),
                patched: vec!["score".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_required_field_rejects() {
        let out = conform_root(&score_schema(), &json!({"score": 40}));
        assert_eq!(
            out,
            Conformed::Rejected {
                path: "summary".to_string()
            }
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let out = conform_root(&score_schema(), &json!({"score": null, "summary": "ok"}));
        match out {
            Conformed::Valid { value, patched } => {
                assert_eq!(value["score"], json!(DEFAULT_SCORE));
                assert_eq!(patched, vec!["score".to_string()]);
            }
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let out = conform_root(
            &score_schema(),
            &json!({"score": 10, "summary": "ok", "confidence": "high"}),
        );
        match out {
            Conformed::Valid { value, .. } => assert!(value.get("confidence").is_none()),
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[test]
    fn test_list_drops_invalid_items_and_enforces_minimum() {
        let item = FieldKind::Object(vec![
            FieldSpec::required("name", FieldKind::text()),
            FieldSpec::score("score"),
        ]);
        let schema = SchemaSpec::list(item, 2);

        let out = conform_root(
            &schema,
            &json!([{"name": "A", "score": 10}, {"score": 5}, {"name": "C"}]),
        );
        match out {
            Conformed::Valid { value, patched } => {
                assert_eq!(value, json!([{"name": "A", "score": 10}, {"name": "C", "score": 0}]));
                assert_eq!(patched, vec!["[1]".to_string(), "[2].score".to_string()]);
            }
            other => panic!("expected valid, got {other:?}"),
        }

        let too_few = conform_root(&schema, &json!([{"name": "A"}]));
        assert!(matches!(too_few, Conformed::Rejected { .. }));
    }

    #[test]
    fn test_nested_paths_are_reported() {
        let schema = SchemaSpec::object(vec![FieldSpec::with_default(
            "feedback",
            FieldKind::Object(vec![FieldSpec::text("summary", "n/a")]),
            json!({"summary": "n/a"}),
        )]);
        let out = conform_root(&schema, &json!({"feedback": {"summary": 12}}));
        assert_eq!(
            out,
            Conformed::Valid {
                value: json!({"feedback": {"summary": "n/a"}}),
                patched: vec!["feedback.summary".to_string()],
            }
        );
    }

    #[test]
    fn test_salvage_target_requires_bounded_integer() {
        let ok = score_schema().with_salvage("score", Some("summary"));
        assert!(ok.salvage_target().is_some());

        let wrong_kind = score_schema().with_salvage("summary", None);
        assert!(wrong_kind.salvage_target().is_none());

        let list = SchemaSpec::list(FieldKind::text(), 1).with_salvage("score", None);
        assert!(list.salvage_target().is_none());
    }
}
