//! The authenticated Plex session and its request plumbing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use plex_mcp_core::{Error, Result};

use crate::models::{Envelope, ServerIdentity, ServerInfo};

/// Cap applied to error bodies echoed back into error messages.
const ERROR_BODY_LIMIT: usize = 500;

/// One authenticated session against a Plex Media Server.
///
/// Construction performs no network I/O; [`probe`](Self::probe) is the
/// liveness check. The session is cheap to share behind an `Arc` - the
/// inner reqwest client pools its connections.
#[derive(Debug)]
pub struct PlexSession {
    http: Client,
    base_url: Url,
    /// Monotonic command counter required by the `/player/...` endpoints.
    command_id: AtomicU64,
}

impl PlexSession {
    /// Open a session against `base_url` authenticated with `token`.
    ///
    /// Fails if the URL is malformed or the token cannot be carried in a
    /// header. Does not talk to the server.
    pub fn open(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base URL '{base_url}': {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Plex-Token",
            HeaderValue::from_str(token)
                .map_err(|_| Error::Config("token contains invalid header characters".into()))?,
        );
        headers.insert(
            "X-Plex-Client-Identifier",
            HeaderValue::from_static("plex-mcp-server"),
        );
        headers.insert("X-Plex-Product", HeaderValue::from_static("plex-mcp"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            command_id: AtomicU64::new(1),
        })
    }

    /// Base URL this session talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Liveness probe: fetch the server identity.
    ///
    /// Equivalent to "can list the server's identity/capabilities". Any
    /// network or protocol failure surfaces as a connection-class error;
    /// retrying is the connection manager's responsibility, not ours.
    pub async fn probe(&self) -> Result<ServerIdentity> {
        debug!(url = %self.base_url, "probing server identity");
        self.get_container("/identity", &[])
            .await
            .map_err(handshake_error)
    }

    /// Fetch server details and capabilities (`GET /`).
    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.get_container("/", &[]).await
    }

    /// Next command id for `/player/...` calls. Plex clients require this
    /// to increase monotonically within a controller session.
    pub(crate) fn next_command_id(&self) -> u64 {
        self.command_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidInput(format!("invalid API path '{path}': {e}")))
    }

    /// GET `path` and deserialize the `MediaContainer` payload into `T`.
    pub(crate) async fn get_container<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(Method::GET, path, query, None).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("failed to decode response body: {e}")))?;
        Ok(envelope.container)
    }

    /// Non-GET variant of [`get_container`](Self::get_container), for
    /// endpoints that mutate and echo the result back (playlist and
    /// collection creation).
    pub(crate) async fn get_container_via<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(method, path, query, None).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("failed to decode response body: {e}")))?;
        Ok(envelope.container)
    }

    /// Issue a request where only success/failure matters (refresh, player
    /// commands, deletes, metadata edits).
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<()> {
        self.send(method, path, query, None).await.map(|_| ())
    }

    /// Like [`execute`](Self::execute) but with an extra header, used for
    /// client-targeted player commands.
    pub(crate) async fn execute_with_header(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        header: (&'static str, String),
    ) -> Result<()> {
        self.send(method, path, query, Some(header)).await.map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        header: Option<(&'static str, String)>,
    ) -> Result<Response> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "plex request");

        let mut request = self.http.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some((name, value)) = header {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        check_status(response).await
    }
}

/// Classify a probe failure. Whatever went wrong while fetching the
/// identity - transport, a bad status, an undecodable body - the handshake
/// failed, so the error is connection-class.
pub(crate) fn handshake_error(err: Error) -> Error {
    match err {
        Error::Connection(msg) | Error::Transport(msg) => Error::Connection(msg),
        other => Error::Connection(other.to_string()),
    }
}

/// Convert non-success statuses into typed errors, echoing a bounded slice
/// of the body for context.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.text().await {
        Ok(body) if !body.trim().is_empty() => truncate(&body),
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(message));
    }
    Err(Error::UpstreamStatus {
        status: status.as_u16(),
        message,
    })
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_LIMIT {
        trimmed.to_string()
    } else {
        let mut end = ERROR_BODY_LIMIT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PlexSession {
        PlexSession::open(
            "http://localhost:32400",
            "token123",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_open_valid() {
        let s = session();
        assert_eq!(s.base_url().as_str(), "http://localhost:32400/");
    }

    #[test]
    fn test_open_invalid_url() {
        let result = PlexSession::open("not a url", "token", Duration::from_secs(5));
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_open_invalid_token() {
        let result = PlexSession::open(
            "http://localhost:32400",
            "bad\ntoken",
            Duration::from_secs(5),
        );
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_command_id_monotonic() {
        let s = session();
        let first = s.next_command_id();
        let second = s.next_command_id();
        assert!(second > first);
    }

    #[test]
    fn test_endpoint_join() {
        let s = session();
        let url = s.endpoint("/library/sections").unwrap();
        assert_eq!(url.as_str(), "http://localhost:32400/library/sections");
    }

    #[test]
    fn test_handshake_error_is_connection_class() {
        // A half-up server answering the probe with a 500 must still read
        // as a failed handshake, not a domain error.
        let err = handshake_error(Error::UpstreamStatus {
            status: 500,
            message: "Internal Server Error".into(),
        });
        assert!(matches!(err, Error::Connection(_)));
        assert!(err.is_connection_error());

        let err = handshake_error(Error::NotFound("identity".into()));
        assert!(err.is_connection_error());

        let err = handshake_error(Error::Transport("connection refused".into()));
        assert!(matches!(err, Error::Connection(ref m) if m == "connection refused"));
    }

    #[test]
    fn test_truncate_short_body() {
        assert_eq!(truncate("  oops  "), "oops");
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "x".repeat(2000);
        let out = truncate(&long);
        assert!(out.len() <= ERROR_BODY_LIMIT + 3);
        assert!(out.ends_with("..."));
    }
}
