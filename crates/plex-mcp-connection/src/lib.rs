//! # plex-mcp-connection
//!
//! Connection lifecycle management for the Plex MCP server.
//!
//! The server holds at most one authenticated upstream session, shared by
//! every concurrently invoked tool. [`ConnectionManager`] owns that
//! session: it trusts a cached handle inside a staleness window (TTL),
//! performs guarded reconnects when the window elapses, and guarantees no
//! two handshakes ever run concurrently. Operations never talk to the
//! manager's internals - they call [`ConnectionManager::acquire`] or run
//! through [`ConnectionManager::with_session`], which also applies the
//! invalidate-and-retry-once policy for connection-class failures.
//!
//! The handshake itself lives behind the [`Connector`] trait so the
//! manager's concurrency behavior is testable without a server;
//! [`PlexConnector`] is the production implementation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handle;
pub mod manager;

pub use handle::{ConnectionHandle, Connector, PlexConnector};
pub use manager::ConnectionManager;

/// Manager wired to the production Plex handshake.
pub type PlexConnectionManager = ConnectionManager<PlexConnector>;
