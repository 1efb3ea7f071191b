use crate::diagnostics::{ErrorTranslator, query_error_text};
use crate::errors::McpError;
use crate::graphql::GraphqlClient;
use crate::schema_from_type;
use crate::synth::reject_mutations;
use crate::tools::{error_result, run_graphql};
use rmcp::model::{CallToolResult, ErrorCode, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use std::sync::Arc;

/// The name of the tool to run a caller-supplied GraphQL query
pub const RUN_QUERY_TOOL_NAME: &str = "run-query";

/// A tool to execute an arbitrary read-only GraphQL query.
///
/// This path trusts the caller's field names; the only local check is the
/// mutation guard. Use `find-fields` first to avoid unknown-field errors.
#[derive(Clone)]
pub struct RunQuery {
    client: GraphqlClient,
    translator: Arc<ErrorTranslator>,
    pub tool: Tool,
}

/// Input for the run-query tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// The GraphQL query. Mutations are rejected.
    query: String,

    /// The variable values, as a JSON object or a JSON-encoded string.
    #[schemars(schema_with = "String::json_schema", default)]
    variables: Option<Value>,
}

impl RunQuery {
    pub fn new(client: GraphqlClient, translator: Arc<ErrorTranslator>) -> Self {
        Self {
            client,
            translator,
            tool: Tool::new(
                RUN_QUERY_TOOL_NAME,
                "Execute a read-only GraphQL query against the conversational-intelligence \
                 API. Use `list-types` and `find-fields` to get valid type and field names \
                 first - do not guess them. Mutations are always rejected.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, input: Input) -> Result<CallToolResult, McpError> {
        if let Err(error) = reject_mutations(&input.query) {
            return Ok(error_result(query_error_text(&error)));
        }

        let variables = parse_variables(input.variables)?;
        Ok(run_graphql(&self.client, &self.translator, &input.query, &variables).await)
    }
}

fn parse_variables(variables: Option<Value>) -> Result<Value, McpError> {
    match variables {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(Value::String(text)) => serde_json::from_str(&text).map_err(|_| {
            McpError::new(ErrorCode::INVALID_PARAMS, "Invalid input".to_string(), None)
        }),
        Some(object) if object.is_object() => Ok(object),
        _ => Err(McpError::new(
            ErrorCode::INVALID_PARAMS,
            "Invalid input".to_string(),
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QueryError;
    use crate::schema::{SchemaCache, SchemaFetcher, SchemaSnapshot};
    use async_trait::async_trait;
    use rmcp::model::RawContent;
    use rstest::rstest;
    use serde_json::json;
    use std::ops::Deref;
    use std::time::Duration;
    use url::Url;

    struct EmptyFetcher;

    #[async_trait]
    impl SchemaFetcher for EmptyFetcher {
        async fn fetch_schema(&self) -> Result<SchemaSnapshot, QueryError> {
            Ok(SchemaSnapshot::default())
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

    fn tool_for(server: &mockito::ServerGuard) -> RunQuery {
        let endpoint = Url::parse(&server.url()).expect("mock URL is valid");
        let client = GraphqlClient::new(endpoint, None).expect("valid header");
        let cache = Arc::new(SchemaCache::new(
            Arc::new(EmptyFetcher),
            Duration::from_secs(1800),
        ));
        RunQuery::new(client, Arc::new(ErrorTranslator::new(cache)))
    }

    #[rstest]
    #[case::keyword_start("mutation { delete_extraction { affected_rows } }")]
    #[case::inline("query A { x } mutation { y }")]
    #[tokio::test]
    async fn mutations_are_rejected_without_network_io(#[case] query: &str) {
        let mut downstream = mockito::Server::new_async().await;
        let never_called = downstream.mock("POST", "/").expect(0).create_async().await;

        let result = tool_for(&downstream)
            .execute(Input {
                query: query.to_string(),
                variables: None,
            })
            .await
            .expect("no protocol error");
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Mutations are not allowed"));
        never_called.assert_async().await;
    }

    #[tokio::test]
    async fn query_with_string_variables_executes() {
        let mut downstream = mockito::Server::new_async().await;
        let data_mock = downstream
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({
                "variables": {"limit": 5}
            })))
            .with_body(r#"{"data":{"interview":[]}}"#)
            .create_async()
            .await;

        let result = tool_for(&downstream)
            .execute(Input {
                query: "query Calls($limit: Int!) { interview(limit: $limit) { id } }".to_string(),
                variables: Some(Value::String(r#"{"limit": 5}"#.to_string())),
            })
            .await
            .expect("tool runs");
        assert_eq!(result.is_error, Some(false));
        data_mock.assert_async().await;
    }

    #[tokio::test]
    async fn garbage_variables_are_a_protocol_error() {
        let mut downstream = mockito::Server::new_async().await;
        let result = tool_for(&downstream)
            .execute(Input {
                query: "query A { x }".to_string(),
                variables: Some(Value::String("garbage".to_string())),
            })
            .await;
        assert!(result.is_err());
    }
}
