use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcp_confluence_server::client::renewal::{NonInteractiveRenewer, TerminalRenewer, TokenRenewer};
use mcp_confluence_server::client::transport::ReqwestTransport;
use mcp_confluence_server::client::ConfluenceClient;
use mcp_confluence_server::config::{ServerConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use mcp_confluence_server::context::ServerContext;
use mcp_confluence_server::server::McpServer;
use mcp_confluence_server::store::{ConfigStore, ConfluenceConfig};

#[derive(Parser)]
#[command(
    name = "mcp-confluence-server",
    version,
    about = "Confluence MCP server over stdio"
)]
struct Cli {
    /// Path of the credentials file
    #[arg(long, env = "CONFLUENCE_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Timeout for each Confluence request, in seconds
    #[arg(long, env = "CONFLUENCE_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Log filter (overrides the stored logLevel; RUST_LOG wins over both)
    #[arg(long, env = "CONFLUENCE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Prompt on the controlling terminal for a new API token after a 401
    #[arg(long, env = "CONFLUENCE_TTY_RENEWAL")]
    tty_renewal: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = ServerConfig {
        config_path: cli.config.unwrap_or_else(ConfigStore::default_path),
        request_timeout: Duration::from_secs(cli.timeout_secs),
        log_level: cli.log_level,
        tty_renewal: cli.tty_renewal,
    };

    let store = ConfigStore::new(&config.config_path);
    let stored = store.load();

    let initial = match &stored {
        Ok(Some(c)) => Some(c.clone()),
        Ok(None) => ConfluenceConfig::from_env(),
        Err(_) => None,
    };

    init_tracing(
        config
            .log_level
            .as_deref()
            .or(initial.as_ref().map(|c| c.log_level.as_str()))
            .unwrap_or("info"),
    );

    match &stored {
        Ok(Some(_)) => tracing::info!(path = %store.path().display(), "loaded Confluence configuration"),
        Ok(None) if initial.is_some() => tracing::info!("using Confluence credentials from environment"),
        Ok(None) => tracing::warn!(
            path = %store.path().display(),
            "Confluence is not configured; call setup_confluence to configure it"
        ),
        Err(e) => tracing::warn!(error = %e, "stored configuration is unusable; call setup_confluence to repair it"),
    }

    let transport = match ReqwestTransport::new() {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let renewer: Arc<dyn TokenRenewer> = if config.tty_renewal {
        Arc::new(TerminalRenewer::default())
    } else {
        Arc::new(NonInteractiveRenewer)
    };

    let confluence = ConfluenceClient::new(
        store,
        Arc::new(transport),
        renewer,
        config.request_timeout,
        initial,
    );

    let mut server = McpServer::new(ServerContext::new(config, confluence));
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "fatal error");
        std::process::exit(1);
    }
}

/// Logs go to stderr only; stdout carries the protocol.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
