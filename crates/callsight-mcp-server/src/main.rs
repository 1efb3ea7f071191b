use callsight_mcp_server::server::{Server, Transport};
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use secrecy::SecretString;
use std::net::{IpAddr, Ipv4Addr};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    styles = STYLES,
    about = "Callsight MCP Server - query recorded conversations from an AI agent",
)]
struct Args {
    /// The GraphQL endpoint of the Callsight API
    #[arg(long, short = 'e', env = "CALLSIGHT_GRAPHQL_ENDPOINT")]
    endpoint: Url,

    /// The API key forwarded to the endpoint. Omitted from requests when unset.
    #[arg(long, env = "CALLSIGHT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// The IP address to bind the Streamable HTTP server to
    ///
    /// [default: 127.0.0.1]
    #[arg(long)]
    http_address: Option<IpAddr>,

    /// Start the server using the Streamable HTTP transport on the given port
    ///
    /// [default: 5000]
    #[arg(long)]
    http_port: Option<u16>,

    /// The log level for the MCP Server
    #[arg(long = "log", short = 'l', global = true, default_value_t = Level::INFO)]
    log_level: Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let transport = if args.http_port.is_some() || args.http_address.is_some() {
        Transport::StreamableHttp {
            address: args.http_address.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port: args.http_port.unwrap_or(5000),
        }
    } else {
        Transport::Stdio
    };

    // When using the Stdio transport, send output to stderr since stdout is used for MCP messages
    match transport {
        Transport::StreamableHttp { .. } => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(args.log_level.into()))
            .with_ansi(true)
            .with_target(false)
            .init(),
        Transport::Stdio => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(args.log_level.into()))
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .init(),
    };

    info!(
        "Callsight MCP Server v{} // endpoint {}",
        std::env!("CARGO_PKG_VERSION"),
        args.endpoint
    );

    Ok(Server::builder()
        .transport(transport)
        .endpoint(args.endpoint)
        .api_key(args.api_key.map(SecretString::from))
        .build()
        .start()
        .await?)
}
