//! # plex-mcp-client
//!
//! Typed HTTP client for the Plex Media Server API.
//!
//! The central type is [`PlexSession`], one authenticated session against a
//! Plex server. Requests carry the `X-Plex-Token` header and ask for JSON;
//! responses arrive wrapped in the Plex `MediaContainer` envelope and are
//! deserialized into the models in [`models`].
//!
//! Endpoint methods are grouped into impl modules by concern (library,
//! media, playlist, collection, account, status), mirroring the server's
//! API areas. Construction of a session performs no network I/O; liveness
//! is established by [`PlexSession::probe`], which the connection layer
//! calls during its handshake.

#![warn(clippy::all)]

pub mod account;
pub mod collection;
pub mod library;
pub mod media;
pub mod models;
pub mod playlist;
pub mod session;
pub mod status;

pub use library::LibraryStats;
pub use models::{
    Account, HistoryEntry, LibrarySection, Metadata, Player, PlexClient, ServerIdentity,
    ServerInfo, SessionUser,
};
pub use session::PlexSession;
pub use status::PlaybackCommand;
