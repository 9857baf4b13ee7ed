//! Active sessions, connected clients, and playback control.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use tracing::info;

use plex_mcp_core::{Error, Result};

use crate::models::{ClientContainer, Metadata, MetadataContainer, PlexClient};
use crate::session::PlexSession;

/// Playback control verb understood by the `/player/playback/...`
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
    SkipNext,
    SkipPrevious,
    StepForward,
    StepBack,
}

impl PlaybackCommand {
    /// Path segment of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackCommand::Play => "play",
            PlaybackCommand::Pause => "pause",
            PlaybackCommand::Stop => "stop",
            PlaybackCommand::SkipNext => "skipNext",
            PlaybackCommand::SkipPrevious => "skipPrevious",
            PlaybackCommand::StepForward => "stepForward",
            PlaybackCommand::StepBack => "stepBack",
        }
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "play" => Ok(PlaybackCommand::Play),
            "pause" => Ok(PlaybackCommand::Pause),
            "stop" => Ok(PlaybackCommand::Stop),
            "skipnext" | "skip_next" => Ok(PlaybackCommand::SkipNext),
            "skipprevious" | "skip_previous" => Ok(PlaybackCommand::SkipPrevious),
            "stepforward" | "step_forward" => Ok(PlaybackCommand::StepForward),
            "stepback" | "step_back" => Ok(PlaybackCommand::StepBack),
            other => Err(Error::InvalidInput(format!(
                "unknown playback command '{other}' (expected play, pause, stop, skipNext, skipPrevious, stepForward or stepBack)"
            ))),
        }
    }
}

impl PlexSession {
    /// Currently playing sessions (`GET /status/sessions`).
    pub async fn active_sessions(&self) -> Result<Vec<Metadata>> {
        let container: MetadataContainer = self.get_container("/status/sessions", &[]).await?;
        Ok(container.metadata)
    }

    /// Controllable clients registered with the server (`GET /clients`).
    pub async fn clients(&self) -> Result<Vec<PlexClient>> {
        let container: ClientContainer = self.get_container("/clients", &[]).await?;
        Ok(container.servers)
    }

    /// Find a controllable client by name, case-insensitively.
    pub async fn client_by_name(&self, name: &str) -> Result<PlexClient> {
        let clients = self.clients().await?;
        clients
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::NotFound(format!("client '{name}'")))
    }

    /// Send a playback command to a client, optionally with a seek offset
    /// in milliseconds (`GET /player/playback/{command}`).
    pub async fn playback_command(
        &self,
        client_machine_identifier: &str,
        command: PlaybackCommand,
        offset_ms: Option<u64>,
    ) -> Result<()> {
        info!(
            client = client_machine_identifier,
            %command,
            "sending playback command"
        );

        let mut query = vec![
            ("commandID", self.next_command_id().to_string()),
            ("type", "video".to_string()),
        ];
        if let Some(offset) = offset_ms {
            query.push(("offset", offset.to_string()));
        }

        self.execute_with_header(
            Method::GET,
            &format!("/player/playback/{}", command.as_str()),
            &query,
            (
                "X-Plex-Target-Client-Identifier",
                client_machine_identifier.to_string(),
            ),
        )
        .await
    }

    /// Start playback of a library item on a client
    /// (`GET /player/playback/playMedia`). The client resolves the item
    /// key against the server named by `server_machine_identifier`.
    pub async fn play_media(
        &self,
        client_machine_identifier: &str,
        server_machine_identifier: &str,
        rating_key: &str,
        offset_ms: u64,
    ) -> Result<()> {
        info!(
            client = client_machine_identifier,
            rating_key, "starting playback"
        );
        self.execute_with_header(
            Method::GET,
            "/player/playback/playMedia",
            &[
                ("commandID", self.next_command_id().to_string()),
                ("machineIdentifier", server_machine_identifier.to_string()),
                ("key", format!("/library/metadata/{rating_key}")),
                ("offset", offset_ms.to_string()),
                ("type", "video".to_string()),
            ],
            (
                "X-Plex-Target-Client-Identifier",
                client_machine_identifier.to_string(),
            ),
        )
        .await
    }

    /// Seek a client to an absolute offset in milliseconds.
    pub async fn seek_to(&self, client_machine_identifier: &str, offset_ms: u64) -> Result<()> {
        info!(
            client = client_machine_identifier,
            offset_ms, "seeking client"
        );
        self.execute_with_header(
            Method::GET,
            "/player/playback/seekTo",
            &[
                ("commandID", self.next_command_id().to_string()),
                ("type", "video".to_string()),
                ("offset", offset_ms.to_string()),
            ],
            (
                "X-Plex-Target-Client-Identifier",
                client_machine_identifier.to_string(),
            ),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_command_parse() {
        assert_eq!(
            "pause".parse::<PlaybackCommand>().unwrap(),
            PlaybackCommand::Pause
        );
        assert_eq!(
            "skipNext".parse::<PlaybackCommand>().unwrap(),
            PlaybackCommand::SkipNext
        );
        assert_eq!(
            "step_back".parse::<PlaybackCommand>().unwrap(),
            PlaybackCommand::StepBack
        );
        assert!("rewind".parse::<PlaybackCommand>().is_err());
    }

    #[test]
    fn test_playback_command_paths() {
        assert_eq!(PlaybackCommand::Play.as_str(), "play");
        assert_eq!(PlaybackCommand::SkipPrevious.as_str(), "skipPrevious");
    }
}
