use anyhow::{Context, Result};
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;

use crate::server::core::TemporalMcpServer;

/// Serves MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: TemporalMcpServer) -> Result<()> {
    info!("serving MCP over stdio");
    let running = server.serve(stdio()).await.context("MCP stdio handshake failed")?;
    let reason = running.waiting().await.context("MCP stdio service task failed")?;
    info!(?reason, "MCP stdio session ended");
    Ok(())
}
