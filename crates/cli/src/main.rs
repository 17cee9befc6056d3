mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use temporal_mcp::{Dispatcher, McpHttpServer, TemporalMcpServer, ToolContext, ToolRegistry, resolve_bind_address, serve_stdio};
use temporal_mcp_api::{ConnectionConfig, ServerSettings, connect};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Transport};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).await
}

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConnectionConfig::resolve(cli.connection_overrides()).context("invalid Temporal connection configuration")?;
    let settings = ServerSettings::resolve(cli.settings_overrides()).context("invalid server settings")?;
    let client = Arc::new(connect(&config).context("failed to configure the Temporal client")?);

    let probe = Arc::clone(&client);
    tokio::spawn(async move {
        match probe.check_health().await {
            Ok(()) => info!("Temporal namespace is reachable"),
            Err(error) => warn!(%error, "Temporal is not reachable yet; tool calls fail with connection errors until it is"),
        }
    });

    let registry = Arc::new(ToolRegistry::temporal()?);
    info!(
        tools = registry.len(),
        result_timeout_secs = settings.result_timeout.as_secs(),
        batch_concurrency = settings.batch_concurrency,
        "tool registry ready"
    );
    let server = TemporalMcpServer::new(Dispatcher::new(registry, ToolContext::new(client, settings)));

    match cli.transport {
        Transport::Stdio => serve_stdio(server).await,
        Transport::Http => {
            let bind_address = resolve_bind_address(cli.bind.as_deref())?;
            let running = McpHttpServer::new(bind_address, server).start().await?;
            info!(address = %running.bound_address(), "press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
            info!(sessions = running.connected_clients(), "shutting down");
            running.stop().await
        }
    }
}
