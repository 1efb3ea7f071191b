//! Execute GraphQL operations against the downstream endpoint

use crate::errors::QueryError;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use rmcp::model::{CallToolResult, Content};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

/// The header carrying the downstream API credential.
const API_KEY_HEADER: &str = "x-api-key";

/// A client for the downstream GraphQL endpoint.
///
/// Only ever sends `query` operations; mutation rejection happens before
/// anything reaches this client.
#[derive(Clone)]
pub struct GraphqlClient {
    endpoint: Url,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl GraphqlClient {
    /// Create a client for the given endpoint. The API key header is
    /// omitted entirely when no key is configured, rather than sent empty.
    pub fn new(
        endpoint: Url,
        api_key: Option<SecretString>,
    ) -> Result<Self, reqwest::header::InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(key.expose_secret())?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(Self {
            endpoint,
            headers,
            client: reqwest::Client::new(),
        })
    }

    /// Send a query and return the raw GraphQL response body.
    pub async fn execute(&self, query: &str, variables: &Value) -> Result<Value, QueryError> {
        let request_body = if variables.is_null() {
            serde_json::json!({ "query": query })
        } else {
            serde_json::json!({ "query": query, "variables": variables })
        };

        self.client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .body(request_body.to_string())
            .send()
            .await
            .map_err(|reqwest_error| {
                QueryError::DownstreamUnavailable(format!(
                    "Failed to send GraphQL request: {reqwest_error}"
                ))
            })?
            .json::<Value>()
            .await
            .map_err(|reqwest_error| {
                QueryError::DownstreamUnavailable(format!(
                    "Failed to read GraphQL response body: {reqwest_error}"
                ))
            })
    }
}

/// The first error message in a GraphQL response, if any.
pub fn first_error_message(response: &Value) -> Option<&str> {
    response
        .get("errors")?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
}

/// Convert a raw GraphQL response into a tool result. The result is an
/// error only when the response carries errors and no data, matching the
/// GraphQL convention for partial responses.
pub fn response_to_tool_result(response: &Value) -> CallToolResult {
    CallToolResult {
        content: vec![
            Content::json(response).unwrap_or_else(|_| Content::text(response.to_string())),
        ],
        is_error: Some(
            response
                .get("errors")
                .filter(|value| !matches!(value, Value::Null))
                .is_some()
                && response
                    .get("data")
                    .filter(|value| !matches!(value, Value::Null))
                    .is_none(),
        ),
    }
}
