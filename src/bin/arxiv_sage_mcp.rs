//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes arXiv Sage's tools and resources over stdio. This mode is
//! designed for editor/agent integrations and shares all runtime configuration with the HTTP
//! binary. Console logs go to stderr so stdout carries only protocol frames.
use anyhow::{Context, Result};
use arxiv_sage::{
    config,
    logging::{self, ConsoleTarget},
    mcp::{ArxivSageMcpServer, SettingsSnapshot},
    pipeline::SummaryPipeline,
};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing(ConsoleTarget::Stderr);

    let config = config::get_config();
    let pipeline =
        Arc::new(SummaryPipeline::from_config(config).context("failed to initialize pipeline")?);
    let server = ArxivSageMcpServer::new(pipeline, SettingsSnapshot::from_config(config));

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
