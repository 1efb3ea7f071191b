//! Prompts: named, argument-validated workflows that return instructional
//! text plus a suggested query. Prompts never execute anything themselves.

use crate::errors::McpError;
use rmcp::model::{
    GetPromptResult, Prompt, PromptArgument, PromptMessage, PromptMessageRole,
};
use serde_json::{Map, Value};

pub const EXPLORE_SIGNALS_PROMPT_NAME: &str = "explore-signals";
pub const CALL_PREP_PROMPT_NAME: &str = "call-prep";
pub const TOPIC_DEEP_DIVE_PROMPT_NAME: &str = "topic-deep-dive";

pub fn list() -> Vec<Prompt> {
    vec![
        Prompt::new(
            EXPLORE_SIGNALS_PROMPT_NAME,
            Some(
                "Survey the extracted signals of one category and summarize the themes \
                 behind them.",
            ),
            Some(vec![PromptArgument {
                name: "signal_type".to_string(),
                description: Some(
                    "Signal category (Issue, FeatureRequest, Objection, ...)".to_string(),
                ),
                required: Some(true),
            }]),
        ),
        Prompt::new(
            CALL_PREP_PROMPT_NAME,
            Some(
                "Prepare for an upcoming call by reviewing what this customer has said \
                 before.",
            ),
            Some(vec![PromptArgument {
                name: "customer".to_string(),
                description: Some("Customer or company name".to_string()),
                required: Some(true),
            }]),
        ),
        Prompt::new(
            TOPIC_DEEP_DIVE_PROMPT_NAME,
            Some("Build a complete picture of what conversations say about one topic."),
            Some(vec![PromptArgument {
                name: "topic".to_string(),
                description: Some("Topic to investigate".to_string()),
                required: Some(true),
            }]),
        ),
    ]
}

pub fn get(name: &str, arguments: Option<Map<String, Value>>) -> Result<GetPromptResult, McpError> {
    let arguments = arguments.unwrap_or_default();
    let argument = |key: &str| -> Result<String, McpError> {
        arguments
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                McpError::invalid_params(format!("Missing required argument `{key}`"), None)
            })
    };

    match name {
        EXPLORE_SIGNALS_PROMPT_NAME => {
            let signal_type = argument("signal_type")?;
            Ok(prompt_result(
                "Signal survey workflow",
                format!(
                    "Survey recent `{signal_type}` signals and summarize the themes.\n\n\
                     1. Call `query-template` with template `signals-by-type` and params \
                     {{\"type\": \"{signal_type}\", \"days\": 30, \"limit\": 25}}.\n\
                     2. Group the returned signals into themes; note how many calls back \
                     each theme.\n\
                     3. For the two biggest themes, call `search` with a phrase drawn from \
                     the theme to pull supporting quotes.\n\
                     4. Report themes in descending order of frequency, each with one \
                     representative quote and the interviews it came from.\n\n\
                     Remember `{signal_type}` is an enum value - bare, never quoted."
                ),
            ))
        }
        CALL_PREP_PROMPT_NAME => {
            let customer = argument("customer")?;
            Ok(prompt_result(
                "Call preparation workflow",
                format!(
                    "Prepare a briefing for an upcoming call with {customer}.\n\n\
                     1. Call `search` with phrase \"{customer}\" and days_back 365 to find \
                     every signal mentioning them.\n\
                     2. Call `query-template` with template `recent-calls` to see whether \
                     any recent interview involves them.\n\
                     3. Summarize: open issues they raised, feature requests still \
                     pending, and objections voiced in past conversations.\n\
                     4. End with three suggested talking points."
                ),
            ))
        }
        TOPIC_DEEP_DIVE_PROMPT_NAME => {
            let topic = argument("topic")?;
            Ok(prompt_result(
                "Topic deep-dive workflow",
                format!(
                    "Build a complete picture of what conversations say about \
                     \"{topic}\".\n\n\
                     1. Call `search` with phrase \"{topic}\" (default window).\n\
                     2. Re-run with days_back 365 and compare: is this topic growing?\n\
                     3. Call `query-template` with template `signals-by-type` and params \
                     {{\"type\": \"Issue\", \"topic\": \"{topic}\"}} to isolate problems.\n\
                     4. A suggested raw query for `run-query` if you need more fields:\n\n\
                     query {{\n  extraction(where: {{summary: {{_ilike: \"%{topic}%\"}}}}, \
                     order_by: {{created_at: desc}}, limit: 25) {{\n    id\n    summary\n    \
                     type\n    created_at\n    interview {{ id title }}\n  }}\n}}"
                ),
            ))
        }
        other => Err(McpError::invalid_params(
            format!("Unknown prompt: {other}"),
            None,
        )),
    }
}

fn prompt_result(description: &str, text: String) -> GetPromptResult {
    GetPromptResult {
        description: Some(description.to_string()),
        messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
    }
}
