//! Named query templates and the natural-language rule table.
//!
//! Each template declares its parameters and a pure function from
//! parameters to a query string (plus, where parameterization is used, a
//! variables map). Natural-language input is matched against an ordered
//! rule list; the first match wins, and no match falls back to a topic
//! search seeded with the raw input.

use crate::errors::QueryError;
use crate::synth::condition::{Condition, Literal, Op, render_where};
use crate::synth::search::{clamp_days_back, clamp_limit};
use chrono::{DateTime, Duration, Utc};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// A template parameter: name, whether it must be supplied, and the
/// default applied when it is not.
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
}

/// A synthesized query plus its variables map (JSON null when the query
/// inlines everything).
#[derive(Debug, PartialEq)]
pub struct BuiltQuery {
    pub query: String,
    pub variables: Value,
}

/// A named query template.
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    build: fn(&Map<String, Value>, DateTime<Utc>) -> Result<BuiltQuery, QueryError>,
}

impl Template {
    /// Validate parameters against the declared specs and produce the
    /// query. Missing required parameters fail before anything is built.
    pub fn build(
        &self,
        params: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<BuiltQuery, QueryError> {
        for spec in self.params {
            if spec.required && !params.contains_key(spec.name) {
                return Err(QueryError::MissingRequiredArgument(spec.name));
            }
        }
        (self.build)(params, now)
    }
}

pub static TEMPLATES: [Template; 4] = [
    Template {
        name: "topic-search",
        description: "Extracted signals mentioning a topic, most recent first",
        params: &[
            ParamSpec {
                name: "topic",
                description: "Topic or keyword to search for",
                required: true,
                default: None,
            },
            ParamSpec {
                name: "limit",
                description: "Maximum rows to return",
                required: false,
                default: Some("10"),
            },
        ],
        build: build_topic_search,
    },
    Template {
        name: "signals-by-type",
        description: "Extracted signals of one category (Issue, FeatureRequest, Objection, ...)",
        params: &[
            ParamSpec {
                name: "type",
                description: "Signal category enum value",
                required: true,
                default: None,
            },
            ParamSpec {
                name: "topic",
                description: "Optional topic to narrow the results",
                required: false,
                default: None,
            },
            ParamSpec {
                name: "days",
                description: "Rolling lookback window in days",
                required: false,
                default: Some("30"),
            },
            ParamSpec {
                name: "limit",
                description: "Maximum rows to return",
                required: false,
                default: Some("10"),
            },
        ],
        build: build_signals_by_type,
    },
    Template {
        name: "recent-calls",
        description: "Recently recorded calls with their summaries",
        params: &[
            ParamSpec {
                name: "days",
                description: "Rolling lookback window in days",
                required: false,
                default: Some("7"),
            },
            ParamSpec {
                name: "limit",
                description: "Maximum rows to return",
                required: false,
                default: Some("10"),
            },
        ],
        build: build_recent_calls,
    },
    Template {
        name: "persona-voices",
        description: "Signals attributed to specific speaker personas",
        params: &[
            ParamSpec {
                name: "persona_ids",
                description: "Persona IDs to include",
                required: true,
                default: None,
            },
            ParamSpec {
                name: "topic",
                description: "Optional topic to narrow the results",
                required: false,
                default: None,
            },
            ParamSpec {
                name: "limit",
                description: "Maximum rows to return",
                required: false,
                default: Some("10"),
            },
        ],
        build: build_persona_voices,
    },
];

pub fn find(name: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|template| template.name == name)
}

fn build_topic_search(
    params: &Map<String, Value>,
    _now: DateTime<Utc>,
) -> Result<BuiltQuery, QueryError> {
    let topic = param_str(params, "topic").ok_or(QueryError::MissingRequiredArgument("topic"))?;
    let conditions = [Condition::contains("summary", &topic)];
    Ok(BuiltQuery {
        query: format!(
            "query TopicSearch {{\n  extraction(where: {{{}}}, order_by: {{created_at: desc}}, limit: {}) {{\n    id\n    summary\n    type\n    created_at\n  }}\n}}",
            render_where(&conditions),
            clamp_limit(param_i64(params, "limit")),
        ),
        variables: Value::Null,
    })
}

fn build_signals_by_type(
    params: &Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<BuiltQuery, QueryError> {
    let signal_type =
        param_str(params, "type").ok_or(QueryError::MissingRequiredArgument("type"))?;
    let since = now - Duration::days(clamp_days_back(param_i64(params, "days")));

    let mut conditions = vec![
        Condition::leaf("type", Op::Eq, Literal::enum_value(&signal_type)),
        Condition::leaf(
            "created_at",
            Op::Gte,
            Literal::Str(since.format("%Y-%m-%d").to_string()),
        ),
    ];
    if let Some(topic) = param_str(params, "topic") {
        conditions.push(Condition::contains("summary", &topic));
    }

    Ok(BuiltQuery {
        query: format!(
            "query SignalsByType {{\n  extraction(where: {{{}}}, order_by: {{created_at: desc}}, limit: {}) {{\n    id\n    summary\n    type\n    created_at\n    interview {{ id title }}\n  }}\n}}",
            render_where(&conditions),
            clamp_limit(param_i64(params, "limit")),
        ),
        variables: Value::Null,
    })
}

fn build_recent_calls(
    params: &Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<BuiltQuery, QueryError> {
    // This template's declared default window is a week, not the generic 30 days.
    let since = now - Duration::days(clamp_days_back(param_i64(params, "days").or(Some(7))));
    let conditions = [Condition::leaf(
        "started_at",
        Op::Gte,
        Literal::Str(since.format("%Y-%m-%d").to_string()),
    )];
    Ok(BuiltQuery {
        query: format!(
            "query RecentCalls($limit: Int!) {{\n  interview(where: {{{}}}, order_by: {{started_at: desc}}, limit: $limit) {{\n    id\n    title\n    summary\n    started_at\n  }}\n}}",
            render_where(&conditions),
        ),
        variables: serde_json::json!({ "limit": clamp_limit(param_i64(params, "limit")) }),
    })
}

fn build_persona_voices(
    params: &Map<String, Value>,
    _now: DateTime<Utc>,
) -> Result<BuiltQuery, QueryError> {
    let persona_ids = param_id_list(params, "persona_ids");
    if persona_ids.is_empty() {
        return Err(QueryError::MissingRequiredArgument("persona_ids"));
    }

    let mut conditions = vec![Condition::leaf(
        "persona_id",
        Op::In,
        Literal::IntList(persona_ids),
    )];
    if let Some(topic) = param_str(params, "topic") {
        conditions.push(Condition::contains("summary", &topic));
    }

    Ok(BuiltQuery {
        query: format!(
            "query PersonaVoices {{\n  extraction(where: {{{}}}, order_by: {{created_at: desc}}, limit: {}) {{\n    id\n    summary\n    type\n    persona_id\n    created_at\n  }}\n}}",
            render_where(&conditions),
            clamp_limit(param_i64(params, "limit")),
        ),
        variables: Value::Null,
    })
}

fn param_str(params: &Map<String, Value>, name: &str) -> Option<String> {
    match params.get(name) {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    }
}

fn param_i64(params: &Map<String, Value>, name: &str) -> Option<i64> {
    match params.get(name) {
        Some(Value::Number(value)) => value.as_i64(),
        Some(Value::String(value)) => value.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts a JSON array of numbers, or a comma-separated string; boundary
/// layers disagree on which they send.
fn param_id_list(params: &Map<String, Value>, name: &str) -> Vec<i64> {
    match params.get(name) {
        Some(Value::Array(values)) => values.iter().filter_map(Value::as_i64).collect(),
        Some(Value::String(value)) => value
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect(),
        Some(Value::Number(value)) => value.as_i64().into_iter().collect(),
        _ => Vec::new(),
    }
}

/// One natural-language rule: a pattern, the template it selects, and how
/// to pull that template's parameters out of the match.
struct NlRule {
    pattern: Regex,
    template: &'static str,
    extract: fn(&Captures) -> Map<String, Value>,
}

#[allow(clippy::expect_used)]
fn nl_rule(
    pattern: &str,
    template: &'static str,
    extract: fn(&Captures) -> Map<String, Value>,
) -> NlRule {
    NlRule {
        pattern: Regex::new(pattern).expect("NL rule patterns are static and tested"),
        template,
        extract,
    }
}

static NL_RULES: LazyLock<Vec<NlRule>> = LazyLock::new(|| {
    vec![
        nl_rule(
            r"(?i)\b(?:issues?|problems?|complaints?|pain\s+points?)\b(?:.*?\babout\s+(.+?))?[?.!]*$",
            "signals-by-type",
            |captures| {
                let mut params = type_param("Issue");
                insert_optional_topic(&mut params, captures.get(1));
                params
            },
        ),
        nl_rule(
            r"(?i)\bfeature\s+requests?\b(?:.*?\babout\s+(.+?))?[?.!]*$",
            "signals-by-type",
            |captures| {
                let mut params = type_param("FeatureRequest");
                insert_optional_topic(&mut params, captures.get(1));
                params
            },
        ),
        nl_rule(
            r"(?i)\bobjections?\b(?:.*?\babout\s+(.+?))?[?.!]*$",
            "signals-by-type",
            |captures| {
                let mut params = type_param("Objection");
                insert_optional_topic(&mut params, captures.get(1));
                params
            },
        ),
        nl_rule(
            r"(?i)\b(?:recent|latest)\s+(?:calls?|interviews?|conversations?)\b",
            "recent-calls",
            |_| Map::new(),
        ),
        nl_rule(
            r"(?i)\bwhat\s+(?:are|were)\s+(?:customers?|people|users?)\s+saying\s+about\s+(.+?)[?.!]*$",
            "topic-search",
            |captures| topic_param(captures.get(1)),
        ),
    ]
});

fn type_param(value: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("type".to_string(), Value::String(value.to_string()));
    params
}

fn topic_param(capture: Option<regex::Match<'_>>) -> Map<String, Value> {
    let mut params = Map::new();
    insert_optional_topic(&mut params, capture);
    params
}

fn insert_optional_topic(params: &mut Map<String, Value>, capture: Option<regex::Match<'_>>) {
    if let Some(topic) = capture {
        params.insert(
            "topic".to_string(),
            Value::String(topic.as_str().trim().to_string()),
        );
    }
}

/// Match a natural-language question against the rule table. Always
/// resolves: the fallback is a topic search over the raw input.
pub fn match_question(question: &str) -> (&'static Template, Map<String, Value>) {
    for rule in NL_RULES.iter() {
        if let Some(captures) = rule.pattern.captures(question) {
            if let Some(template) = find(rule.template) {
                return (template, (rule.extract)(&captures));
            }
        }
    }

    let mut params = Map::new();
    params.insert(
        "topic".to_string(),
        Value::String(question.trim().to_string()),
    );
    // topic-search is the first registry entry; the fallback cannot miss.
    #[allow(clippy::indexing_slicing)]
    let fallback = find("topic-search").unwrap_or(&TEMPLATES[0]);
    (fallback, params)
}
