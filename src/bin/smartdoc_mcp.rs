//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes SmartDoc's tools and resources over stdio. This mode is
//! designed for editor/agent integrations and shares all runtime configuration with the HTTP
//! binary. Logs go to the log file because stdout carries the protocol.
use anyhow::{Context, Result};
use rmcp::{service::ServiceExt, transport::stdio};
use smartdoc::{config, logging, mcp::SmartDocMcpServer, processing};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_file_tracing();

    let documents = Arc::new(
        processing::DocumentService::initialize(config::get_config())
            .await
            .context("failed to initialize document service")?,
    );
    let server = SmartDocMcpServer::new(documents);

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
