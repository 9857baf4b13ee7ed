//! The authenticated connection handle and the handshake that builds it.

use async_trait::async_trait;
use tracing::{debug, info};

use plex_mcp_client::{Account, PlexSession, ServerIdentity};
use plex_mcp_core::{PlexConfig, Result};

/// Performs a fresh handshake against the upstream server.
///
/// The manager is generic over this seam so its staleness and locking
/// behavior can be exercised with a mock; [`PlexConnector`] is the real
/// thing.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Handle produced by a successful handshake.
    type Handle: Send + Sync + 'static;

    /// Open and validate a new session. Must not retry internally - retry
    /// decisions belong to the manager's callers.
    async fn connect(&self) -> Result<Self::Handle>;
}

/// One validated session to the Plex server.
///
/// Owned by the connection manager; operations borrow it (via `Arc`) for
/// the duration of a single call and never retain it past that call.
pub struct ConnectionHandle {
    session: PlexSession,
    identity: ServerIdentity,
    account: Option<Account>,
}

impl ConnectionHandle {
    /// The underlying API session.
    pub fn session(&self) -> &PlexSession {
        &self.session
    }

    /// Machine identifier of the server, needed by playlist/collection
    /// mutation URIs.
    pub fn machine_identifier(&self) -> &str {
        &self.identity.machine_identifier
    }

    /// Account resolved at handshake time, if a username was configured.
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }
}

/// Production handshake: open a session, probe liveness, optionally
/// resolve the configured account.
pub struct PlexConnector {
    config: PlexConfig,
}

impl PlexConnector {
    /// Build a connector from validated configuration.
    pub fn new(config: PlexConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for PlexConnector {
    type Handle = ConnectionHandle;

    async fn connect(&self) -> Result<ConnectionHandle> {
        debug!(url = %self.config.base_url, "handshaking with Plex server");

        let session = PlexSession::open(
            &self.config.base_url,
            &self.config.token,
            self.config.request_timeout,
        )?;
        let identity = session.probe().await?;

        let account = match &self.config.username {
            Some(name) => Some(session.find_account(name).await?),
            None => None,
        };

        info!(
            machine_identifier = %identity.machine_identifier,
            version = identity.version.as_deref().unwrap_or("unknown"),
            account = account.as_ref().map(|a| a.name.as_str()),
            "connected to Plex server"
        );

        Ok(ConnectionHandle {
            session,
            identity,
            account,
        })
    }
}
