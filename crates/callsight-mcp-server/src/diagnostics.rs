//! Downstream error translation.
//!
//! Classifies raw GraphQL error messages into a small set of known failure
//! categories and attaches remediation guidance. This is string-pattern
//! matching over an opaque upstream message, not a typed error channel: the
//! regexes target the phrasings of graphql-js-style servers and Hasura, and
//! will need updating if the downstream changes its wording. They live only
//! in this module so they can be swapped wholesale.

use crate::errors::QueryError;
use crate::schema::SchemaCache;
use crate::similarity::{MAX_DISTANCE, rank_candidates};
use regex::Regex;
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    EnumQuoting,
    UnknownField,
    InvalidSubselection,
    Generic,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::EnumQuoting => "enum-quoting-error",
            ErrorCategory::UnknownField => "unknown-field",
            ErrorCategory::InvalidSubselection => "invalid-subselection",
            ErrorCategory::Generic => "generic",
        }
    }
}

/// A classified downstream failure with remediation guidance.
#[derive(Debug, PartialEq)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Render as the text block returned to the MCP client.
    pub fn to_text(&self) -> String {
        let mut text = format!("GraphQL error ({}): {}", self.category.as_str(), self.message);
        if !self.suggestions.is_empty() {
            text.push_str("\n\nSuggestions:");
            for suggestion in &self.suggestions {
                text.push_str("\n- ");
                text.push_str(suggestion);
            }
        }
        text
    }
}

/// The classification result before suggestions are attached.
#[derive(Debug, PartialEq)]
enum Classification {
    EnumQuoting {
        enum_type: Option<String>,
    },
    UnknownField {
        field: String,
        type_name: Option<String>,
    },
    InvalidSubselection,
    Generic,
}

static ENUM_QUOTING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // graphql-js: Enum "extraction_type_enum" cannot represent non-enum value: "Issue".
        r#"Enum "(?P<enum>[^"]+)" cannot represent non-enum value"#,
        // Hasura: unexpected value "Issue" for enum: 'extraction_type_enum'
        r#"(?i)unexpected value .+ for enum:? '?(?P<enum>[\w]+)'?"#,
        r#"(?i)expected an enum.* but (?:got|found) a string"#,
    ])
});

static UNKNOWN_FIELD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // graphql-js: Cannot query field "emial" on type "person".
        r#"Cannot query field "(?P<field>[^"]+)" on type "(?P<type>[^"]+)""#,
        // Hasura: field 'emial' not found in type: 'person'
        r#"field '(?P<field>[^']+)' not found in type:? '(?P<type>[^']+)'"#,
        r#"(?i)unknown field ['"](?P<field>[\w]+)['"]"#,
    ])
});

static INVALID_SUBSELECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // graphql-js: Field "summary" must not have a selection since type "String" has no subfields.
        r#"must not have a selection since type"#,
        r#"(?i)(?:scalar|enum) .* cannot have a sub-?selection"#,
        r#"(?i)has no subfields"#,
    ])
});

#[allow(clippy::expect_used)]
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("classifier patterns are static and tested"))
        .collect()
}

/// Ordered classification, first match wins.
fn classify(raw: &str) -> Classification {
    for pattern in ENUM_QUOTING_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(raw) {
            return Classification::EnumQuoting {
                enum_type: captures.name("enum").map(|m| m.as_str().to_string()),
            };
        }
    }
    for pattern in UNKNOWN_FIELD_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(raw) {
            if let Some(field) = captures.name("field") {
                return Classification::UnknownField {
                    field: field.as_str().to_string(),
                    type_name: captures.name("type").map(|m| m.as_str().to_string()),
                };
            }
        }
    }
    for pattern in INVALID_SUBSELECTION_PATTERNS.iter() {
        if pattern.is_match(raw) {
            return Classification::InvalidSubselection;
        }
    }
    Classification::Generic
}

/// Translates raw downstream error messages into actionable diagnostics.
pub struct ErrorTranslator {
    cache: std::sync::Arc<SchemaCache>,
}

impl ErrorTranslator {
    pub fn new(cache: std::sync::Arc<SchemaCache>) -> Self {
        Self { cache }
    }

    pub async fn translate(&self, raw_message: &str) -> Diagnostic {
        match classify(raw_message) {
            Classification::EnumQuoting { enum_type } => {
                let mut suggestions = vec![
                    "Enum values are bare identifiers: write `type: {_eq: Issue}`, not \
                     `type: {_eq: \"Issue\"}`."
                        .to_string(),
                ];
                if let Some(enum_type) = enum_type {
                    suggestions.push(format!(
                        "Use `find-fields` with type_name `{enum_type}` to list the valid values."
                    ));
                }
                Diagnostic {
                    category: ErrorCategory::EnumQuoting,
                    message: raw_message.to_string(),
                    suggestions,
                }
            }
            Classification::UnknownField { field, type_name } => {
                let mut suggestions = Vec::new();
                if let Some(type_name) = &type_name {
                    for candidate in self.similar_members(type_name, &field).await {
                        suggestions.push(format!("Did you mean `{candidate}`?"));
                    }
                    suggestions.push(format!(
                        "Use `find-fields` with type_name `{type_name}` to see every field."
                    ));
                } else {
                    suggestions
                        .push("Use `list-types` and `find-fields` to check field names.".to_string());
                }
                Diagnostic {
                    category: ErrorCategory::UnknownField,
                    message: raw_message.to_string(),
                    suggestions,
                }
            }
            Classification::InvalidSubselection => Diagnostic {
                category: ErrorCategory::InvalidSubselection,
                message: raw_message.to_string(),
                suggestions: vec![
                    "The field is a scalar or enum: select it directly, without a nested \
                     selection set."
                        .to_string(),
                ],
            },
            Classification::Generic => Diagnostic {
                category: ErrorCategory::Generic,
                message: raw_message.to_string(),
                suggestions: vec![
                    "Use `list-types` to discover queryable types.".to_string(),
                    "Use `find-fields` to check the fields of a type before querying it."
                        .to_string(),
                ],
            },
        }
    }

    /// Best-effort did-you-mean candidates. A failed schema lookup yields
    /// no suggestions rather than an error: this is a diagnostic aid, not
    /// a critical path.
    async fn similar_members(&self, type_name: &str, field: &str) -> Vec<String> {
        match self.cache.get().await {
            Ok(snapshot) => snapshot
                .find_type(type_name)
                .map(|descriptor| {
                    rank_candidates(field, descriptor.member_names(), MAX_DISTANCE)
                })
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

/// Render a planning-stage failure (no downstream call involved) as the
/// text block returned to the MCP client.
pub fn query_error_text(error: &QueryError) -> String {
    match error {
        QueryError::MutationRejected => format!(
            "{error}. This server is read-only; only `query` operations are forwarded."
        ),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaFetcher, SchemaSnapshot};
    use async_trait::async_trait;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    #[rstest]
    #[case::graphql_js(r#"Enum "extraction_type_enum" cannot represent non-enum value: "Issue"."#)]
    #[case::hasura(r#"unexpected value "Issue" for enum: 'extraction_type_enum'"#)]
    fn classifies_enum_quoting(#[case] raw: &str) {
        assert!(matches!(
            classify(raw),
            Classification::EnumQuoting { enum_type: Some(name) } if name == "extraction_type_enum"
        ));
    }

    #[rstest]
    #[case::graphql_js(r#"Cannot query field "emial" on type "person"."#)]
    #[case::hasura(r#"field 'emial' not found in type: 'person'"#)]
    fn classifies_unknown_field_with_type(#[case] raw: &str) {
        assert_eq!(
            classify(raw),
            Classification::UnknownField {
                field: "emial".to_string(),
                type_name: Some("person".to_string()),
            }
        );
    }

    #[test]
    fn classifies_invalid_subselection() {
        let raw = r#"Field "summary" must not have a selection since type "String" has no subfields."#;
        assert_eq!(classify(raw), Classification::InvalidSubselection);
    }

    #[test]
    fn unknown_message_is_generic() {
        assert_eq!(classify("connection reset by peer"), Classification::Generic);
    }

    #[test]
    fn enum_quoting_wins_over_later_rules() {
        // Mentions subfields too; the first matching rule classifies it.
        let raw = r#"Enum "x" cannot represent non-enum value: "y"; type has no subfields"#;
        assert!(matches!(classify(raw), Classification::EnumQuoting { .. }));
    }

    struct StaticFetcher(serde_json::Value);

    #[async_trait]
    impl SchemaFetcher for StaticFetcher {
        async fn fetch_schema(&self) -> Result<SchemaSnapshot, QueryError> {
            serde_json::from_value(self.0.clone())
                .map_err(|e| QueryError::MalformedIntrospection(e.to_string()))
        }
    }

    fn translator() -> ErrorTranslator {
        let fetcher = Arc::new(StaticFetcher(json!({
            "types": [{
                "name": "person",
                "kind": "OBJECT",
                "fields": [
                    {"name": "id", "type": {"kind": "SCALAR", "name": "uuid"}},
                    {"name": "email", "type": {"kind": "SCALAR", "name": "String"}},
                    {"name": "name", "type": {"kind": "SCALAR", "name": "String"}}
                ]
            }]
        })));
        ErrorTranslator::new(Arc::new(SchemaCache::new(
            fetcher,
            Duration::from_secs(1800),
        )))
    }

    #[tokio::test]
    async fn unknown_field_diagnostic_suggests_similar_field() {
        let diagnostic = translator()
            .translate(r#"Cannot query field "emial" on type "person"."#)
            .await;
        assert_eq!(diagnostic.category, ErrorCategory::UnknownField);
        assert!(
            diagnostic
                .suggestions
                .iter()
                .any(|suggestion| suggestion.contains("`email`")),
            "{:?}",
            diagnostic.suggestions
        );
    }

    #[tokio::test]
    async fn unknown_type_still_produces_guidance() {
        let diagnostic = translator()
            .translate(r#"Cannot query field "emial" on type "ghost"."#)
            .await;
        assert_eq!(diagnostic.category, ErrorCategory::UnknownField);
        // No similarity hits, but the discovery pointer is still there.
        assert!(
            diagnostic
                .suggestions
                .iter()
                .any(|suggestion| suggestion.contains("find-fields"))
        );
    }

    #[tokio::test]
    async fn diagnostic_text_lists_suggestions() {
        let diagnostic = translator()
            .translate(r#"Enum "extraction_type_enum" cannot represent non-enum value: "Issue"."#)
            .await;
        let text = diagnostic.to_text();
        assert!(text.starts_with("GraphQL error (enum-quoting-error):"));
        assert!(text.contains("\n- "));
    }
}
