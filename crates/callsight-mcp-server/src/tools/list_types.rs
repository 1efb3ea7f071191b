use crate::diagnostics::query_error_text;
use crate::errors::McpError;
use crate::schema::SchemaCache;
use crate::schema_from_type;
use crate::tools::error_result;
use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use std::sync::Arc;

/// The name of the tool to list browsable schema types
pub const LIST_TYPES_TOOL_NAME: &str = "list-types";

/// A tool to list the user-facing object types of the downstream schema.
#[derive(Clone)]
pub struct ListTypes {
    cache: Arc<SchemaCache>,
    pub tool: Tool,
}

/// Input for the list-types tool. The tool takes no arguments; this type
/// exists for the input schema.
#[derive(JsonSchema, Deserialize)]
pub struct Input {}

impl ListTypes {
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self {
            cache,
            tool: Tool::new(
                LIST_TYPES_TOOL_NAME,
                "List the queryable data types (calls, signals, people, ...) in the \
                 conversational-intelligence schema. Use `find-fields` to see the fields \
                 of a specific type.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self) -> Result<CallToolResult, McpError> {
        let snapshot = match self.cache.get().await {
            Ok(snapshot) => snapshot,
            Err(error) => return Ok(error_result(query_error_text(&error))),
        };

        let listing = snapshot
            .browsable_types()
            .map(|descriptor| match &descriptor.description {
                Some(description) => format!("- {}: {}", descriptor.name, description),
                None => format!("- {}", descriptor.name),
            })
            .collect::<Vec<String>>()
            .join("\n");

        Ok(CallToolResult {
            content: vec![Content::text(listing)],
            is_error: None,
        })
    }
}
