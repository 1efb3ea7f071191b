use crate::diagnostics::query_error_text;
use crate::errors::McpError;
use crate::schema::{IntrospectionClient, SchemaCache};
use crate::schema_from_type;
use crate::similarity::{MAX_DISTANCE, rank_candidates};
use crate::tools::error_result;
use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use std::sync::Arc;

/// The name of the tool to inspect the fields of one type
pub const FIND_FIELDS_TOOL_NAME: &str = "find-fields";

/// A tool listing the fields (or enum values) of a named schema type.
#[derive(Clone)]
pub struct FindFields {
    introspection: IntrospectionClient,
    cache: Arc<SchemaCache>,
    pub tool: Tool,
}

/// Input for the find-fields tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// The name of the type to inspect, e.g. `extraction` or
    /// `extraction_type_enum`.
    type_name: String,
}

impl FindFields {
    pub fn new(introspection: IntrospectionClient, cache: Arc<SchemaCache>) -> Self {
        Self {
            introspection,
            cache,
            tool: Tool::new(
                FIND_FIELDS_TOOL_NAME,
                "List the fields of a schema type, or the values of an enum type. \
                 Use this before building queries so every field name is real.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, input: Input) -> Result<CallToolResult, McpError> {
        let fields = match self.introspection.fetch_type_fields(&input.type_name).await {
            Ok(fields) => fields,
            Err(error) => return Ok(error_result(query_error_text(&error))),
        };

        if fields.is_empty() {
            return Ok(error_result(self.not_found_text(&input.type_name).await));
        }

        let listing = fields
            .iter()
            .map(|field| match &field.description {
                Some(description) => {
                    format!("- {}: {} ({})", field.name, field.type_ref, description)
                }
                None => format!("- {}: {}", field.name, field.type_ref),
            })
            .collect::<Vec<String>>()
            .join("\n");

        Ok(CallToolResult {
            content: vec![Content::text(listing)],
            is_error: None,
        })
    }

    /// Not-found guidance, with did-you-mean candidates from the cached
    /// snapshot when it is available.
    async fn not_found_text(&self, type_name: &str) -> String {
        let mut text = format!(
            "No fields found for type `{type_name}`. The type may not exist, or it may be \
             a scalar. Use `list-types` to see queryable types."
        );
        if let Ok(snapshot) = self.cache.get().await {
            let candidates = rank_candidates(
                type_name,
                snapshot.types.iter().map(|descriptor| descriptor.name.as_str()),
                MAX_DISTANCE,
            );
            if !candidates.is_empty() {
                text.push_str(&format!(" Did you mean: {}?", candidates.join(", ")));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QueryError;
    use crate::graphql::GraphqlClient;
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

    fn tool_for(server: &mockito::ServerGuard) -> FindFields {
        let endpoint = Url::parse(&server.url()).expect("mock URL is valid");
        let client = GraphqlClient::new(endpoint, None).expect("valid header");
        let cache = Arc::new(SchemaCache::new(
            Arc::new(StaticFetcher(json!({
                "types": [
                    {"name": "extraction", "kind": "OBJECT"},
                    {"name": "interview", "kind": "OBJECT"},
                ]
            }))),
            Duration::from_secs(1800),
        ));
        FindFields::new(IntrospectionClient::new(client), cache)
    }

    #[tokio::test]
    async fn lists_fields_with_formatted_type_refs() {
        let mut downstream = mockito::Server::new_async().await;
        downstream
            .mock("POST", "/")
            .with_body(
                r#"{"data":{"__type":{
                    "kind":"OBJECT","name":"extraction",
                    "fields":[
                        {"name":"id","description":null,"type":{"kind":"NON_NULL","ofType":{"kind":"SCALAR","name":"uuid"}}},
                        {"name":"summary","description":"One-line signal summary","type":{"kind":"SCALAR","name":"String"}}
                    ],
                    "inputFields":null,"enumValues":null
                }}}"#,
            )
            .create_async()
            .await;

        let result = tool_for(&downstream)
            .execute(Input {
                type_name: "extraction".to_string(),
            })
            .await
            .expect("tool runs");
        assert_eq!(result.is_error, None);
        assert_eq!(
            text_of(&result),
            "- id: uuid!\n- summary: String (One-line signal summary)"
        );
    }

    #[tokio::test]
    async fn unknown_type_gets_suggestions_from_snapshot() {
        let mut downstream = mockito::Server::new_async().await;
        downstream
            .mock("POST", "/")
            .with_body(r#"{"data":{"__type":null}}"#)
            .create_async()
            .await;

        let result = tool_for(&downstream)
            .execute(Input {
                type_name: "extractoin".to_string(),
            })
            .await
            .expect("tool runs");
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Did you mean: extraction?"));
    }
}
