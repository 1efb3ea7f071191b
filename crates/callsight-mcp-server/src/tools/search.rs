use crate::diagnostics::{ErrorTranslator, query_error_text};
use crate::errors::{McpError, QueryError};
use crate::graphql::GraphqlClient;
use crate::schema::SchemaCache;
use crate::schema_from_type;
use crate::synth::search::{SearchSpec, build_search_query};
use crate::tools::{error_result, run_graphql};
use chrono::Utc;
use rmcp::model::{CallToolResult, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use std::sync::Arc;

/// The name of the keyword-search tool
pub const SEARCH_TOOL_NAME: &str = "search";

/// Default target type for keyword searches: the extracted-signals table.
const DEFAULT_TARGET: &str = "extraction";

/// A tool to search conversation signals by keyword.
#[derive(Clone)]
pub struct Search {
    cache: Arc<SchemaCache>,
    client: GraphqlClient,
    translator: Arc<ErrorTranslator>,
    pub tool: Tool,
}

/// Input for the search tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// The phrase to search for.
    phrase: Option<String>,
    /// Type to search. Defaults to `extraction`.
    type_name: Option<String>,
    /// Search only this text field instead of probing the usual ones.
    text_field: Option<String>,
    /// Filter to one signal category, e.g. `Issue` or `FeatureRequest`.
    /// Applied when the target type has a `type` field.
    signal_type: Option<String>,
    /// Restrict to signals from these speaker personas. Applied when the
    /// target type has a `persona_id` field.
    persona_ids: Option<Vec<i64>>,
    /// Additional equality filters as a field-to-value map. Field names
    /// are validated against the schema; unknown fields fail the call.
    filters: Option<serde_json::Map<String, Value>>,
    /// Maximum rows to return (1-50, default 10).
    limit: Option<i64>,
    /// Rolling lookback window in days (default 30, maximum 365).
    days_back: Option<i64>,
    /// Only return signals attached to a recorded call.
    require_call: Option<bool>,
}

impl Search {
    pub fn new(
        cache: Arc<SchemaCache>,
        client: GraphqlClient,
        translator: Arc<ErrorTranslator>,
    ) -> Self {
        Self {
            cache,
            client,
            translator,
            tool: Tool::new(
                SEARCH_TOOL_NAME,
                "Keyword-search extracted conversation signals. The query is built \
                 against the live schema, so field names are always valid. Use \
                 `run-query` instead when you need full control over the query.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, input: Input) -> Result<CallToolResult, McpError> {
        let Some(phrase) = input.phrase.filter(|phrase| !phrase.trim().is_empty()) else {
            return Ok(error_result(query_error_text(
                &QueryError::MissingRequiredArgument("phrase"),
            )));
        };

        let snapshot = match self.cache.get().await {
            Ok(snapshot) => snapshot,
            Err(error) => return Ok(error_result(query_error_text(&error))),
        };

        let spec = SearchSpec {
            type_name: input
                .type_name
                .unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            phrase: phrase.trim().to_string(),
            text_field: input.text_field,
            signal_type: input.signal_type,
            persona_ids: input.persona_ids.unwrap_or_default(),
            filters: input.filters.unwrap_or_default(),
            limit: input.limit,
            days_back: input.days_back,
            require_call: input.require_call.unwrap_or(false),
        };

        let query = match build_search_query(&snapshot, &spec, Utc::now()) {
            Ok(query) => query,
            Err(error) => return Ok(error_result(query_error_text(&error))),
        };

        Ok(run_graphql(&self.client, &self.translator, &query, &Value::Null).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaFetcher, SchemaSnapshot};
    use async_trait::async_trait;
    use rmcp::model::RawContent;
    use serde_json::json;
    use std::ops::Deref;
    use std::time::Duration;
    use url::Url;

    struct StaticFetcher(serde_json::Value);

    #[async_trait]
    impl SchemaFetcher for StaticFetcher {
        async fn fetch_schema(&self) -> Result<SchemaSnapshot, QueryError> {
            serde_json::from_value(self.0.clone())
                .map_err(|e| QueryError::MalformedIntrospection(e.to_string()))
        }
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|content| match content.deref() {
                RawContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn cache() -> Arc<SchemaCache> {
        Arc::new(SchemaCache::new(
            Arc::new(StaticFetcher(json!({
                "types": [{
                    "name": "extraction",
                    "kind": "OBJECT",
                    "fields": [
                        {"name": "id", "type": {"kind": "SCALAR", "name": "uuid"}},
                        {"name": "summary", "type": {"kind": "SCALAR", "name": "String"}}
                    ]
                }]
            }))),
            Duration::from_secs(1800),
        ))
    }

    fn tool_for(server: &mockito::ServerGuard) -> Search {
        let endpoint = Url::parse(&server.url()).expect("mock URL is valid");
        let client = GraphqlClient::new(endpoint, None).expect("valid header");
        let cache = cache();
        let translator = Arc::new(ErrorTranslator::new(cache.clone()));
        Search::new(cache, client, translator)
    }

    fn input(phrase: Option<&str>) -> Input {
        Input {
            phrase: phrase.map(str::to_string),
            type_name: None,
            text_field: None,
            signal_type: None,
            persona_ids: None,
            filters: None,
            limit: None,
            days_back: None,
            require_call: None,
        }
    }

    #[tokio::test]
    async fn missing_phrase_fails_before_any_downstream_call() {
        let mut downstream = mockito::Server::new_async().await;
        let never_called = downstream.mock("POST", "/").expect(0).create_async().await;

        let result = tool_for(&downstream)
            .execute(input(None))
            .await
            .expect("no protocol error");
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Missing required argument `phrase`"));
        never_called.assert_async().await;
    }

    #[tokio::test]
    async fn executes_synthesized_search_downstream() {
        let mut downstream = mockito::Server::new_async().await;
        let data_mock = downstream
            .mock("POST", "/")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex("KeywordSearch".to_string()),
                mockito::Matcher::Regex("%pricing%".to_string()),
            ]))
            .with_body(r#"{"data":{"extraction":[{"id":"1","summary":"pricing concern"}]}}"#)
            .create_async()
            .await;

        let result = tool_for(&downstream)
            .execute(input(Some("pricing")))
            .await
            .expect("tool runs");
        assert_eq!(result.is_error, Some(false));
        data_mock.assert_async().await;
    }

    #[tokio::test]
    async fn downstream_field_error_comes_back_translated() {
        let mut downstream = mockito::Server::new_async().await;
        downstream
            .mock("POST", "/")
            .with_body(
                r#"{"data":null,"errors":[{"message":"Cannot query field \"summry\" on type \"extraction\"."}]}"#,
            )
            .create_async()
            .await;

        let result = tool_for(&downstream)
            .execute(input(Some("pricing")))
            .await
            .expect("tool runs");
        assert_eq!(result.is_error, Some(true));
        let text = text_of(&result);
        assert!(text.contains("unknown-field"), "{text}");
        assert!(text.contains("`summary`"), "{text}");
    }
}
