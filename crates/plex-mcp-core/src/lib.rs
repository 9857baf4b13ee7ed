//! # plex-mcp-core
//!
//! Core types for the Plex MCP server.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other plex-mcp crates. It provides:
//!
//! - The error taxonomy shared by every layer, including the
//!   connection-class vs domain-class split consumed by the retry policy
//! - Configuration loaded from the environment
//! - The media type enum used for search and metadata filters
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other plex-mcp crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod media;

pub use config::PlexConfig;
pub use error::{Error, Result};
pub use media::MediaType;
