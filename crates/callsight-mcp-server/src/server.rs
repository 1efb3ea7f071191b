use crate::diagnostics::ErrorTranslator;
use crate::errors::{McpError, ServerError};
use crate::graphql::GraphqlClient;
use crate::prompts;
use crate::resources::Resources;
use crate::schema::{IntrospectionClient, SCHEMA_TTL, SchemaCache};
use crate::tools::ask::{ASK_TOOL_NAME, Ask};
use crate::tools::find_fields::{FIND_FIELDS_TOOL_NAME, FindFields};
use crate::tools::list_types::{LIST_TYPES_TOOL_NAME, ListTypes};
use crate::tools::query_template::{QUERY_TEMPLATE_TOOL_NAME, QueryTemplate};
use crate::tools::run_query::{RUN_QUERY_TOOL_NAME, RunQuery};
use crate::tools::search::{SEARCH_TOOL_NAME, Search};
use bon::bon;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ErrorCode, GetPromptRequestParam, GetPromptResult,
    Implementation, ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult,
    ListToolsResult, PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{RoleServer, ServerHandler, ServiceExt, serde_json};
use secrecy::SecretString;
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

/// A Callsight MCP Server
pub struct Server {
    transport: Transport,
    endpoint: Url,
    api_key: Option<SecretString>,
    schema_ttl: Duration,
}

#[derive(Clone)]
pub enum Transport {
    Stdio,
    StreamableHttp { address: IpAddr, port: u16 },
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        transport: Transport,
        endpoint: Url,
        #[builder(required)] api_key: Option<SecretString>,
        #[builder(default = SCHEMA_TTL)] schema_ttl: Duration,
    ) -> Self {
        Self {
            transport,
            endpoint,
            api_key,
            schema_ttl,
        }
    }

    pub async fn start(self) -> Result<(), ServerError> {
        let client = GraphqlClient::new(self.endpoint.clone(), self.api_key.clone())?;
        let introspection = IntrospectionClient::new(client.clone());
        let cache = Arc::new(SchemaCache::new(
            Arc::new(introspection.clone()),
            self.schema_ttl,
        ));
        let translator = Arc::new(ErrorTranslator::new(cache.clone()));

        let running = Running {
            list_types: ListTypes::new(cache.clone()),
            find_fields: FindFields::new(introspection, cache.clone()),
            search: Search::new(cache.clone(), client.clone(), translator.clone()),
            run_query: RunQuery::new(client.clone(), translator.clone()),
            query_template: QueryTemplate::new(client.clone(), translator.clone()),
            ask: Ask::new(client, translator),
            resources: Resources::new(cache),
        };

        match self.transport {
            Transport::StreamableHttp { address, port } => {
                info!(port = ?port, address = ?address, "Starting MCP server in Streamable HTTP mode");
                let listen_address = SocketAddr::new(address, port);
                let service = StreamableHttpService::new(
                    move || Ok(running.clone()),
                    LocalSessionManager::default().into(),
                    StreamableHttpServerConfig {
                        sse_keep_alive: None,
                        stateful_mode: true,
                    },
                );
                let router = axum::Router::new().nest_service("/mcp", service);
                let tcp_listener = tokio::net::TcpListener::bind(listen_address).await?;
                axum::serve(tcp_listener, router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
            Transport::Stdio => {
                info!("Starting MCP server in stdio mode");
                let service = running.serve(stdio()).await.inspect_err(|e| {
                    error!("serving error: {:?}", e);
                })?;
                service.waiting().await.map_err(ServerError::StartupError)?;
            }
        }

        Ok(())
    }
}

#[derive(Clone)]
struct Running {
    list_types: ListTypes,
    find_fields: FindFields,
    search: Search,
    run_query: RunQuery,
    query_template: QueryTemplate,
    ask: Ask,
    resources: Resources,
}

impl ServerHandler for Running {
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        match request.name.as_ref() {
            LIST_TYPES_TOOL_NAME => self.list_types.execute().await,
            FIND_FIELDS_TOOL_NAME => {
                self.find_fields
                    .execute(convert_arguments(request)?)
                    .await
            }
            SEARCH_TOOL_NAME => self.search.execute(convert_arguments(request)?).await,
            RUN_QUERY_TOOL_NAME => self.run_query.execute(convert_arguments(request)?).await,
            QUERY_TEMPLATE_TOOL_NAME => {
                self.query_template
                    .execute(convert_arguments(request)?)
                    .await
            }
            ASK_TOOL_NAME => self.ask.execute(convert_arguments(request)?).await,
            name => Err(tool_not_found(name)),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: vec![
                self.list_types.tool.clone(),
                self.find_fields.tool.clone(),
                self.search.tool.clone(),
                self.run_query.tool.clone(),
                self.query_template.tool.clone(),
                self.ask.tool.clone(),
            ],
        })
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            next_cursor: None,
            resources: self.resources.list(),
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            next_cursor: None,
            resource_templates: self.resources.templates(),
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.resources.read(&request.uri).await
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult {
            next_cursor: None,
            prompts: prompts::list(),
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        prompts::get(&request.name, request.arguments)
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "callsight-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Query recorded customer conversations and the signals extracted from \
                 them. Start with `list-types` and `find-fields` to learn the schema; \
                 use `search` or `ask` for keyword questions, and `run-query` for \
                 anything custom. The server is read-only."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

fn tool_not_found(name: &str) -> McpError {
    McpError::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Tool {} not found", name),
        None,
    )
}

fn convert_arguments<T: serde::de::DeserializeOwned>(
    arguments: CallToolRequestParam,
) -> Result<T, McpError> {
    serde_json::from_value(Value::from(arguments.arguments))
        .map_err(|_| McpError::new(ErrorCode::INVALID_PARAMS, "Invalid input".to_string(), None))
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
