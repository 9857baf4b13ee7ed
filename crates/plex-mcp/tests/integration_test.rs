//! Integration tests for the plex-mcp server wiring.
//!
//! No Plex server is required: these exercise construction, capability
//! advertisement, and parameter schema generation - the pieces an MCP
//! client sees before any upstream traffic happens.

use std::sync::Arc;
use std::time::Duration;

use rmcp::ServerHandler;

use plex_mcp::{
    ClientStartPlaybackParams, MediaSearchParams, PlaylistEditParams, PlexMcpServer,
    RecentlyAddedParams,
};
use plex_mcp_connection::{ConnectionManager, PlexConnector};
use plex_mcp_core::PlexConfig;

fn test_config() -> PlexConfig {
    PlexConfig::new("http://localhost:32400", "test-token")
}

#[test]
fn test_server_construction() {
    // Construction must not touch the network - the first handshake
    // happens lazily on the first tool call.
    let server = PlexMcpServer::new(test_config());
    let info = server.get_info();

    assert!(info.instructions.is_some());
    assert!(info.capabilities.tools.is_some());
}

#[test]
fn test_server_with_shared_manager() {
    let config = test_config();
    let ttl = config.connection_ttl;
    let manager = Arc::new(ConnectionManager::new(PlexConnector::new(config), ttl));
    assert_eq!(manager.ttl(), Duration::from_secs(300));

    let server = PlexMcpServer::with_manager(manager);
    assert!(server.get_info().capabilities.tools.is_some());
}

#[test]
fn test_param_schemas_generate() {
    let schema = schemars::schema_for!(MediaSearchParams);
    let json = serde_json::to_value(&schema).unwrap();
    assert!(json["properties"]["query"].is_object());

    let schema = schemars::schema_for!(RecentlyAddedParams);
    let json = serde_json::to_value(&schema).unwrap();
    assert!(json["properties"]["count"].is_object());

    let schema = schemars::schema_for!(ClientStartPlaybackParams);
    let json = serde_json::to_value(&schema).unwrap();
    assert!(json["properties"]["rating_key"].is_object());

    let schema = schemars::schema_for!(PlaylistEditParams);
    let json = serde_json::to_value(&schema).unwrap();
    assert!(json["properties"]["new_title"].is_object());
}

#[test]
fn test_params_accept_minimal_json() {
    let params: MediaSearchParams = serde_json::from_str(r#"{"query": "heat"}"#).unwrap();
    assert_eq!(params.query, "heat");
    assert!(params.media_type.is_none());
}
