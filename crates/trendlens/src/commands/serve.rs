//! Serve command: run the MCP server on stdio.

use clap::Args;
use rmcp::ServiceExt;
use tracing::{info, instrument};
use trendlens_core::Config;

use crate::server::TrendServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {}

/// Start the MCP server and block until the client disconnects.
///
/// Stdout carries the protocol, so all diagnostics go through tracing.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(
    _args: ServeArgs,
    max_input: Option<usize>,
    config: Config,
) -> anyhow::Result<()> {
    info!(api = %config.api_base_url(), "starting MCP server on stdio");

    let service = TrendServer::new(config, max_input)
        .serve(rmcp::transport::stdio())
        .await?;
    service.waiting().await?;

    info!("MCP server stopped");
    Ok(())
}
