//! # Plex MCP Server
//!
//! Model Context Protocol server for managing a Plex Media Server.
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - Library management (list, contents, refresh, scan)
//! - Media search, metadata editing and deletion
//! - Playlist and collection CRUD
//! - Accounts, watch history, active sessions and client playback control
//!
//! ## Architecture
//!
//! This is the top layer - the MCP server binary that ties together:
//! - plex-mcp-core: errors, configuration, media types
//! - plex-mcp-client: typed HTTP client for the Plex API
//! - plex-mcp-connection: the shared upstream connection and its lifecycle

use rmcp::{transport::stdio, ServiceExt};

use plex_mcp::PlexMcpServer;
use plex_mcp_core::PlexConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging. Logs go to stderr: stdout carries MCP framing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = PlexConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        anyhow::anyhow!(e.to_string())
    })?;

    tracing::info!(
        "Plex MCP Server v{} starting (server: {}, ttl: {:?})...",
        env!("CARGO_PKG_VERSION"),
        config.base_url,
        config.connection_ttl
    );

    let server = PlexMcpServer::new(config);

    tracing::info!("Server initialized, starting stdio transport...");

    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    tracing::info!("Plex MCP Server running on stdio");

    // Wait for the service to complete
    service.waiting().await?;

    tracing::info!("Plex MCP Server shutting down");

    Ok(())
}
