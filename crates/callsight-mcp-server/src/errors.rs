use reqwest::header::InvalidHeaderValue;
use tokio::task::JoinError;

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid credential header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("Failed to serve transport: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Failed to initialize server: {0}")]
    Initialize(#[from] rmcp::service::ServerInitializeError<std::io::Error>),

    #[error("Failed to start server")]
    StartupError(#[from] JoinError),
}

/// A failure while planning or executing a downstream GraphQL query.
///
/// These are recoverable from the MCP client's perspective: they are
/// rendered as diagnostic text in an error tool result, never as a
/// protocol-level failure.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("GraphQL endpoint unavailable: {0}")]
    DownstreamUnavailable(String),

    #[error("Mutations are not allowed through this server")]
    MutationRejected,

    #[error("Type `{0}` was not found in the schema. Use `list-types` to see available types.")]
    TypeNotFound(String),

    #[error(
        "No searchable text field on type `{type_name}` (tried {tried}). \
         Use `find-fields` to see what fields exist."
    )]
    NoSearchableField { type_name: String, tried: String },

    #[error(
        "Field `{field}` does not exist on type `{type_name}`. \
         Use `find-fields` to see its fields."
    )]
    UnknownField { field: String, type_name: String },

    #[error("Unsupported filter value for field `{0}`")]
    UnsupportedFilterValue(String),

    #[error("Missing required argument `{0}`")]
    MissingRequiredArgument(&'static str),

    #[error("Unknown template `{0}`. Use `query-template` with no arguments to list templates.")]
    TemplateNotFound(String),

    #[error("Unexpected introspection response: {0}")]
    MalformedIntrospection(String),
}

impl From<reqwest::Error> for QueryError {
    fn from(error: reqwest::Error) -> Self {
        QueryError::DownstreamUnavailable(error.to_string())
    }
}

/// An MCP tool error
pub type McpError = rmcp::model::ErrorData;
