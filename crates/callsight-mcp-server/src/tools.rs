//! MCP tools over the GraphQL core.
//!
//! Tools follow one shape: a struct holding its dependencies plus a
//! `tool` descriptor, and an `execute` returning `CallToolResult`. Domain
//! failures (bad type name, rejected mutation, downstream errors) come
//! back as error *results* with diagnostic text so the calling LLM can
//! recover; protocol errors are reserved for malformed input.

pub mod ask;
pub mod find_fields;
pub mod list_types;
pub mod query_template;
pub mod run_query;
pub mod search;

use crate::diagnostics::ErrorTranslator;
use crate::graphql::{GraphqlClient, first_error_message, response_to_tool_result};
use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

/// A structured error result: the operation failed, the process and the
/// session keep going.
pub(crate) fn error_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text.into())],
        is_error: Some(true),
    }
}

/// Execute a synthesized or caller-supplied query downstream, translating
/// execution-time GraphQL errors into diagnostics.
pub(crate) async fn run_graphql(
    client: &GraphqlClient,
    translator: &ErrorTranslator,
    query: &str,
    variables: &Value,
) -> CallToolResult {
    let response = match client.execute(query, variables).await {
        Ok(response) => response,
        Err(error) => return error_result(crate::diagnostics::query_error_text(&error)),
    };

    let data_is_null = response
        .get("data")
        .filter(|data| !matches!(data, Value::Null))
        .is_none();
    match first_error_message(&response) {
        Some(message) if data_is_null => {
            let diagnostic = translator.translate(message).await;
            CallToolResult {
                content: vec![
                    Content::text(diagnostic.to_text()),
                    Content::json(&response)
                        .unwrap_or_else(|_| Content::text(response.to_string())),
                ],
                is_error: Some(true),
            }
        }
        _ => response_to_tool_result(&response),
    }
}
