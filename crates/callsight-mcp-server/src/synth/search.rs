//! Keyword-search query builder.
//!
//! Every schema-shape decision here routes through the snapshot's
//! `find_type`/field lookup; no field name is emitted without confirming it
//! exists in the live schema.

use crate::errors::QueryError;
use crate::schema::{FieldDescriptor, SchemaSnapshot, TypeDescriptor};
use crate::synth::condition::{Condition, Literal, Op, render_where};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

/// Candidate text-bearing field names, probed in priority order when the
/// caller does not name a field to search.
pub const TEXT_FIELD_CANDIDATES: [&str; 5] = ["summary", "text", "title", "content", "name"];

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;
pub const DEFAULT_DAYS_BACK: i64 = 30;
pub const MAX_DAYS_BACK: i64 = 365;

/// Relation fields included in the selection set when the live schema has
/// them, with the sub-fields worth showing for each.
const RELATION_CANDIDATES: [(&str, &[&str]); 2] = [
    ("interview", &["id", "title", "name", "started_at", "created_at"]),
    ("extraction_type", &["name"]),
];

/// Structured input to search-query synthesis.
#[derive(Clone, Debug, Default)]
pub struct SearchSpec {
    pub type_name: String,
    pub phrase: String,
    /// Explicit field to search; when unset the candidate list is probed.
    pub text_field: Option<String>,
    /// Enum-valued signal-type filter (e.g. `Issue`), applied to the
    /// target's `type` field when it exists.
    pub signal_type: Option<String>,
    pub persona_ids: Vec<i64>,
    /// Additional equality filters, field name to value. Every field is
    /// validated against the live schema before anything is emitted.
    pub filters: Map<String, Value>,
    pub limit: Option<i64>,
    pub days_back: Option<i64>,
    /// Opt-in: require a non-null parent call relation.
    pub require_call: bool,
}

/// Clamp a caller-supplied limit into the safe range. Zero or negative
/// falls back to the default rather than producing an empty result set.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(value) if value > 0 => value.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

/// Clamp the rolling date window to the maximum lookback; absent or
/// non-positive values get the default window.
pub fn clamp_days_back(days: Option<i64>) -> i64 {
    match days {
        Some(value) if value > 0 => value.min(MAX_DAYS_BACK),
        _ => DEFAULT_DAYS_BACK,
    }
}

/// Synthesize a keyword-search query against `spec.type_name`.
pub fn build_search_query(
    snapshot: &SchemaSnapshot,
    spec: &SearchSpec,
    now: DateTime<Utc>,
) -> Result<String, QueryError> {
    let descriptor = snapshot
        .find_type(&spec.type_name)
        .ok_or_else(|| QueryError::TypeNotFound(spec.type_name.clone()))?;

    let text_fields = resolve_text_fields(descriptor, spec)?;
    let mut conditions = vec![text_condition(&text_fields, &spec.phrase)];

    if let Some(signal_type) = &spec.signal_type {
        if let Some(field) = descriptor.field("type") {
            // Bare enum identifier vs quoted string is decided by the
            // field's declared kind, not by the shape of the value.
            let literal = if field.type_ref.is_enum() {
                Literal::enum_value(signal_type)
            } else {
                Literal::Str(signal_type.clone())
            };
            conditions.push(Condition::leaf("type", Op::Eq, literal));
        } else {
            tracing::debug!(
                type_name = %spec.type_name,
                "ignoring signal type filter: no `type` field"
            );
        }
    }

    for (field_name, raw_value) in &spec.filters {
        let field = descriptor
            .field(field_name)
            .ok_or_else(|| QueryError::UnknownField {
                field: field_name.clone(),
                type_name: spec.type_name.clone(),
            })?;
        conditions.push(Condition::leaf(
            field_name.clone(),
            Op::Eq,
            equality_literal(field, raw_value)?,
        ));
    }

    if !spec.persona_ids.is_empty() && descriptor.has_field("persona_id") {
        conditions.push(Condition::leaf(
            "persona_id",
            Op::In,
            Literal::IntList(spec.persona_ids.clone()),
        ));
    }

    if descriptor.has_field("created_at") {
        let since = now - Duration::days(clamp_days_back(spec.days_back));
        conditions.push(Condition::leaf(
            "created_at",
            Op::Gte,
            Literal::Str(since.format("%Y-%m-%d").to_string()),
        ));
    }

    if spec.require_call && descriptor.has_field("interview") {
        conditions.push(Condition::nested(
            "interview",
            Condition::leaf("id", Op::IsNull, Literal::Bool(false)),
        ));
    }

    let selection = build_selection(snapshot, descriptor, &text_fields);
    let order_by = descriptor
        .has_field("created_at")
        .then_some("order_by: {created_at: desc}, ")
        .unwrap_or_default();

    Ok(format!(
        "query KeywordSearch {{\n  {target}(where: {{{where_body}}}, {order_by}limit: {limit}) {{\n{selection}\n  }}\n}}",
        target = spec.type_name,
        where_body = render_where(&conditions),
        limit = clamp_limit(spec.limit),
    ))
}

/// Turn a caller-supplied filter value into a typed literal. Strings are
/// quoted or bare depending on the field's declared kind.
fn equality_literal(field: &FieldDescriptor, raw_value: &Value) -> Result<Literal, QueryError> {
    match raw_value {
        Value::String(text) if field.type_ref.is_enum() => Ok(Literal::enum_value(text)),
        Value::String(text) => Ok(Literal::Str(text.clone())),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => Ok(Literal::Int(int)),
            (None, Some(float)) => Ok(Literal::Float(float)),
            _ => Err(QueryError::UnsupportedFilterValue(field.name.clone())),
        },
        Value::Bool(flag) => Ok(Literal::Bool(*flag)),
        _ => Err(QueryError::UnsupportedFilterValue(field.name.clone())),
    }
}

/// The text fields the search will cover: the caller's explicit field, or
/// every candidate that exists on the target type, in priority order.
fn resolve_text_fields(
    descriptor: &TypeDescriptor,
    spec: &SearchSpec,
) -> Result<Vec<String>, QueryError> {
    if let Some(explicit) = &spec.text_field {
        if descriptor.has_field(explicit) {
            return Ok(vec![explicit.clone()]);
        }
        return Err(QueryError::NoSearchableField {
            type_name: spec.type_name.clone(),
            tried: format!("`{explicit}`"),
        });
    }

    let matched: Vec<String> = TEXT_FIELD_CANDIDATES
        .iter()
        .filter(|candidate| descriptor.has_field(candidate))
        .map(|candidate| candidate.to_string())
        .collect();
    if matched.is_empty() {
        return Err(QueryError::NoSearchableField {
            type_name: spec.type_name.clone(),
            tried: TEXT_FIELD_CANDIDATES
                .map(|candidate| format!("`{candidate}`"))
                .join(", "),
        });
    }
    Ok(matched)
}

/// One ilike leaf for a single field, an `_or` combinator when the search
/// spans several plausible text columns.
fn text_condition(text_fields: &[String], phrase: &str) -> Condition {
    let mut leaves: Vec<Condition> = text_fields
        .iter()
        .map(|field| Condition::contains(field.clone(), phrase))
        .collect();
    if leaves.len() == 1 {
        leaves.remove(0)
    } else {
        Condition::Or(leaves)
    }
}

fn build_selection(
    snapshot: &SchemaSnapshot,
    descriptor: &TypeDescriptor,
    text_fields: &[String],
) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut push_scalar = |name: &str| {
        if descriptor.has_field(name) && !lines.iter().any(|line| line.trim() == name) {
            lines.push(format!("    {name}"));
        }
    };

    push_scalar("id");
    for field in text_fields {
        push_scalar(field);
    }
    push_scalar("type");
    push_scalar("created_at");

    // Relations are included only when the live schema confirms both the
    // relation field and its target type, keeping the synthesizer tolerant
    // of minor downstream schema drift.
    for (relation, sub_fields) in RELATION_CANDIDATES {
        let Some(field) = descriptor.field(relation) else {
            continue;
        };
        let Some(related) = field
            .type_ref
            .named_type()
            .and_then(|name| snapshot.find_type(name))
        else {
            continue;
        };
        let existing: Vec<&str> = sub_fields
            .iter()
            .copied()
            .filter(|sub_field| related.has_field(sub_field))
            .collect();
        if !existing.is_empty() {
            lines.push(format!("    {relation} {{ {} }}", existing.join(" ")));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    fn snapshot() -> SchemaSnapshot {
        serde_json::from_value(json!({
            "queryType": {"name": "query_root"},
            "types": [
                {
                    "name": "extraction",
                    "kind": "OBJECT",
                    "fields": [
                        {"name": "id", "type": {"kind": "NON_NULL", "ofType": {"kind": "SCALAR", "name": "uuid"}}},
                        {"name": "summary", "type": {"kind": "SCALAR", "name": "String"}},
                        {"name": "text", "type": {"kind": "SCALAR", "name": "String"}},
                        {"name": "type", "type": {"kind": "ENUM", "name": "extraction_type_enum"}},
                        {"name": "persona_id", "type": {"kind": "SCALAR", "name": "Int"}},
                        {"name": "created_at", "type": {"kind": "SCALAR", "name": "timestamptz"}},
                        {"name": "interview", "type": {"kind": "OBJECT", "name": "interview"}},
                        {"name": "extraction_type", "type": {"kind": "OBJECT", "name": "extraction_type"}}
                    ]
                },
                {
                    "name": "interview",
                    "kind": "OBJECT",
                    "fields": [
                        {"name": "id", "type": {"kind": "NON_NULL", "ofType": {"kind": "SCALAR", "name": "uuid"}}},
                        {"name": "title", "type": {"kind": "SCALAR", "name": "String"}},
                        {"name": "started_at", "type": {"kind": "SCALAR", "name": "timestamptz"}}
                    ]
                },
                {
                    "name": "extraction_type",
                    "kind": "OBJECT",
                    "fields": [
                        {"name": "name", "type": {"kind": "SCALAR", "name": "String"}}
                    ]
                },
                {
                    "name": "note",
                    "kind": "OBJECT",
                    "fields": [
                        {"name": "id", "type": {"kind": "SCALAR", "name": "uuid"}},
                        {"name": "body", "type": {"kind": "SCALAR", "name": "String"}}
                    ]
                }
            ]
        }))
        .expect("valid snapshot JSON")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).single().expect("valid date")
    }

    fn spec(phrase: &str) -> SearchSpec {
        SearchSpec {
            type_name: "extraction".to_string(),
            phrase: phrase.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn keyword_search_spans_all_candidate_text_fields() {
        let query =
            build_search_query(&snapshot(), &spec("pricing"), fixed_now()).expect("query builds");
        insta::assert_snapshot!(query, @r###"
        query KeywordSearch {
          extraction(where: {_or: [{summary: {_ilike: "%pricing%"}}, {text: {_ilike: "%pricing%"}}], created_at: {_gte: "2026-07-08"}}, order_by: {created_at: desc}, limit: 10) {
            id
            summary
            text
            type
            created_at
            interview { id title started_at }
            extraction_type { name }
          }
        }
        "###);
    }

    #[test]
    fn signal_type_filter_uses_bare_enum_literal() {
        let mut search = spec("pricing");
        search.signal_type = Some("\"Issue\"".to_string());
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        assert!(query.contains("type: {_eq: Issue}"));
        assert!(!query.contains(r#"type: {_eq: "Issue"}"#));
    }

    #[test]
    fn persona_filter_renders_id_set() {
        let mut search = spec("onboarding");
        search.persona_ids = vec![2, 7];
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        assert!(query.contains("persona_id: {_in: [2, 7]}"));
    }

    #[rstest]
    #[case::oversized(Some(10_000), "limit: 50")]
    #[case::zero(Some(0), "limit: 10")]
    #[case::negative(Some(-5), "limit: 10")]
    #[case::absent(None, "limit: 10")]
    fn limit_is_clamped(#[case] limit: Option<i64>, #[case] expected: &str) {
        let mut search = spec("pricing");
        search.limit = limit;
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        assert!(query.contains(expected), "{query}");
    }

    #[test]
    fn date_window_defaults_to_thirty_days_and_clamps_lookback() {
        let query =
            build_search_query(&snapshot(), &spec("pricing"), fixed_now()).expect("query builds");
        assert!(query.contains(r#"created_at: {_gte: "2026-07-08"}"#), "{query}");

        let mut search = spec("pricing");
        search.days_back = Some(9999);
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        assert!(query.contains(r#"created_at: {_gte: "2025-08-07"}"#), "{query}");
    }

    #[test]
    fn relations_included_only_when_schema_has_them() {
        let query =
            build_search_query(&snapshot(), &spec("pricing"), fixed_now()).expect("query builds");
        assert!(query.contains("interview { id title started_at }"));
        assert!(query.contains("extraction_type { name }"));

        let mut search = spec("pricing");
        search.type_name = "note".to_string();
        search.text_field = Some("body".to_string());
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        assert!(!query.contains("interview {"));
    }

    #[test]
    fn relation_filter_is_opt_in() {
        let query =
            build_search_query(&snapshot(), &spec("pricing"), fixed_now()).expect("query builds");
        assert!(!query.contains("_is_null"));

        let mut search = spec("pricing");
        search.require_call = true;
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        assert!(query.contains("interview: {id: {_is_null: false}}"));
    }

    #[test]
    fn extra_filters_are_validated_and_typed() {
        let mut search = spec("pricing");
        search.filters = match json!({"type": "\"Objection\"", "persona_id": 4}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        // Declared enum kind wins over the caller's quoting.
        assert!(query.contains("type: {_eq: Objection}"), "{query}");
        assert!(query.contains("persona_id: {_eq: 4}"), "{query}");
    }

    #[test]
    fn filter_on_unknown_field_is_rejected() {
        let mut search = spec("pricing");
        search.filters = match json!({"persona": 4}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let error = build_search_query(&snapshot(), &search, fixed_now()).expect_err("must fail");
        assert!(matches!(
            error,
            QueryError::UnknownField { field, .. } if field == "persona"
        ));
    }

    #[test]
    fn unknown_type_is_reported() {
        let mut search = spec("pricing");
        search.type_name = "extractions".to_string();
        let error = build_search_query(&snapshot(), &search, fixed_now()).expect_err("must fail");
        assert!(matches!(error, QueryError::TypeNotFound(name) if name == "extractions"));
    }

    #[test]
    fn type_without_text_fields_is_not_searchable() {
        let mut search = spec("pricing");
        search.type_name = "note".to_string();
        let error = build_search_query(&snapshot(), &search, fixed_now()).expect_err("must fail");
        assert!(matches!(error, QueryError::NoSearchableField { .. }));
    }

    #[test]
    fn explicit_text_field_overrides_probing() {
        let mut search = spec("pricing");
        search.type_name = "note".to_string();
        search.text_field = Some("body".to_string());
        let query = build_search_query(&snapshot(), &search, fixed_now()).expect("query builds");
        assert!(query.contains(r#"body: {_ilike: "%pricing%"}"#));
        assert!(!query.contains("_or"));
    }
}
