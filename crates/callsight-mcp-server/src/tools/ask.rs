use crate::diagnostics::{ErrorTranslator, query_error_text};
use crate::errors::{McpError, QueryError};
use crate::graphql::GraphqlClient;
use crate::schema_from_type;
use crate::synth::templates::match_question;
use crate::tools::{error_result, run_graphql};
use chrono::Utc;
use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// The name of the natural-language query tool
pub const ASK_TOOL_NAME: &str = "ask";

/// A tool that maps a natural-language question onto a query template and
/// executes it.
#[derive(Clone)]
pub struct Ask {
    client: GraphqlClient,
    translator: Arc<ErrorTranslator>,
    pub tool: Tool,
}

/// Input for the ask tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// A question about the recorded conversations, e.g.
    /// "what issues came up about pricing?".
    question: Option<String>,
}

impl Ask {
    pub fn new(client: GraphqlClient, translator: Arc<ErrorTranslator>) -> Self {
        Self {
            client,
            translator,
            tool: Tool::new(
                ASK_TOOL_NAME,
                "Answer a natural-language question about recorded conversations by \
                 matching it to a query template and running it. Falls back to a topic \
                 search when no pattern matches.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, input: Input) -> Result<CallToolResult, McpError> {
        let Some(question) = input.question.filter(|question| !question.trim().is_empty())
        else {
            return Ok(error_result(query_error_text(
                &QueryError::MissingRequiredArgument("question"),
            )));
        };

        let (template, params) = match_question(&question);
        debug!(template = template.name, "matched natural-language question");

        let built = match template.build(&params, Utc::now()) {
            Ok(built) => built,
            Err(error) => return Ok(error_result(query_error_text(&error))),
        };

        let mut result =
            run_graphql(&self.client, &self.translator, &built.query, &built.variables).await;
        // Show which template answered, so the caller can refine with
        // `query-template` directly.
        result.content.insert(
            0,
            Content::text(format!("Matched template `{}`.", template.name)),
        );
        Ok(result)
    }
}
