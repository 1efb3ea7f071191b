use crate::diagnostics::{ErrorTranslator, query_error_text};
use crate::errors::{McpError, QueryError};
use crate::graphql::GraphqlClient;
use crate::schema_from_type;
use crate::synth::templates::{TEMPLATES, find};
use crate::tools::{error_result, run_graphql};
use chrono::Utc;
use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use serde_json::Map;
use std::sync::Arc;

/// The name of the tool to run a named query template
pub const QUERY_TEMPLATE_TOOL_NAME: &str = "query-template";

/// A tool to expand and execute a curated query template.
#[derive(Clone)]
pub struct QueryTemplate {
    client: GraphqlClient,
    translator: Arc<ErrorTranslator>,
    pub tool: Tool,
}

/// Input for the query-template tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// The template name. Omit to list available templates.
    template: Option<String>,
    /// Template parameters.
    params: Option<Map<String, Value>>,
}

impl QueryTemplate {
    pub fn new(client: GraphqlClient, translator: Arc<ErrorTranslator>) -> Self {
        Self {
            client,
            translator,
            tool: Tool::new(
                QUERY_TEMPLATE_TOOL_NAME,
                "Run a curated query template (topic-search, signals-by-type, recent-calls, \
                 persona-voices). Call with no arguments to list templates and their \
                 parameters.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, input: Input) -> Result<CallToolResult, McpError> {
        let Some(name) = input.template else {
            return Ok(CallToolResult {
                content: vec![Content::text(catalog())],
                is_error: None,
            });
        };

        let Some(template) = find(&name) else {
            return Ok(error_result(format!(
                "{}\n\n{}",
                query_error_text(&QueryError::TemplateNotFound(name)),
                catalog()
            )));
        };

        let params = input.params.unwrap_or_default();
        let built = match template.build(&params, Utc::now()) {
            Ok(built) => built,
            Err(error) => return Ok(error_result(query_error_text(&error))),
        };

        Ok(run_graphql(&self.client, &self.translator, &built.query, &built.variables).await)
    }
}

fn catalog() -> String {
    TEMPLATES
        .iter()
        .map(|template| {
            let params = template
                .params
                .iter()
                .map(|param| {
                    let mut rendered = param.name.to_string();
                    if param.required {
                        rendered.push_str(" (required)");
                    } else if let Some(default) = param.default {
                        rendered.push_str(&format!(" (default {default})"));
                    }
                    rendered
                })
                .collect::<Vec<String>>()
                .join(", ");
            format!("- {}: {} [{params}]", template.name, template.description)
        })
        .collect::<Vec<String>>()
        .join("\n")
}
