//! Wire models for the Plex HTTP API.
//!
//! Every JSON response from the server is wrapped in a `MediaContainer`
//! object whose fields depend on the endpoint. Fields here default to
//! `None`/empty because the server omits attributes it considers
//! uninteresting for a given item.

use serde::{Deserialize, Serialize};

/// Generic `{"MediaContainer": ...}` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub container: T,
}

/// Response of `GET /identity` - the liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerIdentity {
    /// Unique identifier of the server instance
    pub machine_identifier: String,
    /// Server version string
    #[serde(default)]
    pub version: Option<String>,
}

/// Response of `GET /` - server capabilities and details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInfo {
    pub friendly_name: Option<String>,
    pub machine_identifier: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub my_plex_username: Option<String>,
    pub my_plex_mapping_state: Option<String>,
    pub updated_at: Option<i64>,
    pub transcoder_active_video_sessions: Option<u32>,
    pub transcoder_audio: Option<bool>,
    pub transcoder_video: Option<bool>,
    pub streaming_brain_version: Option<u32>,
    #[serde(default)]
    pub owner_features: Option<String>,
}

/// A library section (`Directory` element of `GET /library/sections`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibrarySection {
    /// Section key, used in `/library/sections/{key}/...` paths
    pub key: String,
    pub title: String,
    /// Section type: movie, show, artist, photo
    #[serde(rename = "type")]
    pub section_type: String,
    pub agent: Option<String>,
    pub scanner: Option<String>,
    pub language: Option<String>,
    pub uuid: Option<String>,
    pub refreshing: Option<bool>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub scanned_at: Option<i64>,
    #[serde(rename = "Location")]
    pub locations: Vec<Location>,
}

/// Filesystem location backing a library section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub path: String,
}

/// A media item, playlist, collection, or history entry (`Metadata`
/// element). Plex reuses this shape across nearly every listing endpoint;
/// which fields are present depends on the item type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub rating_key: Option<String>,
    pub key: Option<String>,
    pub guid: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub year: Option<u32>,
    pub studio: Option<String>,
    pub content_rating: Option<String>,
    pub rating: Option<f64>,
    pub audience_rating: Option<f64>,
    pub duration: Option<u64>,
    pub originally_available_at: Option<String>,
    pub added_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub view_count: Option<u64>,
    pub last_viewed_at: Option<i64>,
    pub view_offset: Option<u64>,
    pub thumb: Option<String>,
    pub art: Option<String>,

    // Episode/track hierarchy
    pub grandparent_title: Option<String>,
    pub parent_title: Option<String>,
    pub parent_index: Option<u32>,
    pub index: Option<u32>,

    // Library placement
    #[serde(rename = "librarySectionID")]
    pub library_section_id: Option<u32>,
    pub library_section_title: Option<String>,

    // Playlist/collection specifics
    pub playlist_type: Option<String>,
    pub smart: Option<bool>,
    pub leaf_count: Option<u32>,
    pub child_count: Option<u32>,
    #[serde(rename = "playlistItemID")]
    pub playlist_item_id: Option<u64>,

    // Active-session / history specifics
    pub history_key: Option<String>,
    #[serde(rename = "accountID")]
    pub account_id: Option<u64>,
    pub viewed_at: Option<i64>,
    #[serde(rename = "sessionKey")]
    pub session_key: Option<String>,
    #[serde(rename = "User")]
    pub user: Option<SessionUser>,
    #[serde(rename = "Player")]
    pub player: Option<Player>,
    #[serde(rename = "Session")]
    pub session: Option<SessionDetail>,
    #[serde(rename = "TranscodeSession")]
    pub transcode_session: Option<TranscodeSession>,
}

impl Metadata {
    /// Human-oriented one-line description, e.g.
    /// `Breaking Bad - S2E8 - Better Call Saul` for an episode.
    pub fn describe(&self) -> String {
        let title = self.title.as_deref().unwrap_or("Unknown");
        match self.media_type.as_deref() {
            Some("episode") => format!(
                "{} - S{}E{} - {}",
                self.grandparent_title.as_deref().unwrap_or("Unknown Show"),
                self.parent_index.map_or("?".to_string(), |i| i.to_string()),
                self.index.map_or("?".to_string(), |i| i.to_string()),
                title
            ),
            Some("track") => format!(
                "{} - {} - {}",
                self.grandparent_title.as_deref().unwrap_or("Unknown Artist"),
                self.parent_title.as_deref().unwrap_or("Unknown Album"),
                title
            ),
            _ => match self.year {
                Some(year) => format!("{title} ({year})"),
                None => title.to_string(),
            },
        }
    }
}

/// Account entry from `GET /accounts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub id: u64,
    pub key: Option<String>,
    pub name: String,
    pub default_audio_language: Option<String>,
    pub default_subtitle_language: Option<String>,
    pub auto_select_audio: Option<bool>,
    pub thumb: Option<String>,
}

/// User attached to an active playback session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionUser {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumb: Option<String>,
}

/// Player attached to an active playback session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub title: Option<String>,
    pub address: Option<String>,
    pub device: Option<String>,
    pub machine_identifier: Option<String>,
    pub model: Option<String>,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub product: Option<String>,
    pub profile: Option<String>,
    pub state: Option<String>,
    pub version: Option<String>,
    pub local: Option<bool>,
    pub relayed: Option<bool>,
    pub secure: Option<bool>,
}

/// Session detail (bandwidth/location) of an active playback session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionDetail {
    pub id: Option<String>,
    pub bandwidth: Option<u64>,
    pub location: Option<String>,
}

/// Transcode pipeline state of an active playback session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscodeSession {
    pub key: Option<String>,
    pub throttled: Option<bool>,
    pub complete: Option<bool>,
    pub progress: Option<f64>,
    pub speed: Option<f64>,
    pub video_decision: Option<String>,
    pub audio_decision: Option<String>,
    pub container: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

/// A controllable client (`Server` element of `GET /clients`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlexClient {
    pub name: String,
    pub host: Option<String>,
    pub address: Option<String>,
    pub port: Option<u32>,
    pub machine_identifier: String,
    pub version: Option<String>,
    pub protocol: Option<String>,
    pub product: Option<String>,
    pub device_class: Option<String>,
    pub protocol_version: Option<String>,
    /// Comma-separated capability list, e.g. "playback,navigation"
    pub protocol_capabilities: Option<String>,
}

/// Watch-history entry: a `Metadata` element of
/// `GET /status/sessions/history/all`, re-exported under a dedicated name
/// for readability at call sites.
pub type HistoryEntry = Metadata;

// Per-endpoint container shapes.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DirectoryContainer {
    #[serde(default, rename = "Directory")]
    pub directories: Vec<LibrarySection>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetadataContainer {
    #[serde(default, rename = "Metadata")]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "totalSize")]
    pub total_size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AccountContainer {
    #[serde(default, rename = "Account")]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClientContainer {
    #[serde(default, rename = "Server")]
    pub servers: Vec<PlexClient>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "size": 0,
                "machineIdentifier": "abc123",
                "version": "1.40.0.7998"
            }
        }"#;
        let env: Envelope<ServerIdentity> = serde_json::from_str(json).unwrap();
        assert_eq!(env.container.machine_identifier, "abc123");
        assert_eq!(env.container.version.as_deref(), Some("1.40.0.7998"));
    }

    #[test]
    fn test_sections_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "size": 1,
                "Directory": [{
                    "key": "1",
                    "type": "movie",
                    "title": "Movies",
                    "agent": "tv.plex.agents.movie",
                    "scanner": "Plex Movie",
                    "language": "en-US",
                    "refreshing": false,
                    "Location": [{"id": 1, "path": "/data/movies"}]
                }]
            }
        }"#;
        let env: Envelope<DirectoryContainer> = serde_json::from_str(json).unwrap();
        let sections = env.container.directories;
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, "1");
        assert_eq!(sections[0].section_type, "movie");
        assert_eq!(sections[0].locations[0].path, "/data/movies");
    }

    #[test]
    fn test_metadata_sparse_fields() {
        let json = r#"{
            "MediaContainer": {
                "size": 1,
                "Metadata": [{
                    "ratingKey": "101",
                    "type": "movie",
                    "title": "Heat",
                    "year": 1995,
                    "duration": 10200000
                }]
            }
        }"#;
        let env: Envelope<MetadataContainer> = serde_json::from_str(json).unwrap();
        let item = &env.container.metadata[0];
        assert_eq!(item.rating_key.as_deref(), Some("101"));
        assert_eq!(item.year, Some(1995));
        assert!(item.grandparent_title.is_none());
        assert!(item.player.is_none());
    }

    #[test]
    fn test_session_metadata_with_player() {
        let json = r#"{
            "MediaContainer": {
                "size": 1,
                "Metadata": [{
                    "ratingKey": "55",
                    "type": "episode",
                    "title": "Pilot",
                    "grandparentTitle": "Some Show",
                    "parentIndex": 1,
                    "index": 1,
                    "sessionKey": "3",
                    "User": {"id": "1", "title": "alice"},
                    "Player": {"title": "Living Room TV", "state": "playing", "address": "10.0.0.5"},
                    "Session": {"id": "xyz", "bandwidth": 24000, "location": "lan"}
                }]
            }
        }"#;
        let env: Envelope<MetadataContainer> = serde_json::from_str(json).unwrap();
        let item = &env.container.metadata[0];
        assert_eq!(item.user.as_ref().unwrap().title.as_deref(), Some("alice"));
        assert_eq!(
            item.player.as_ref().unwrap().state.as_deref(),
            Some("playing")
        );
        assert_eq!(item.session.as_ref().unwrap().bandwidth, Some(24000));
        assert_eq!(item.describe(), "Some Show - S1E1 - Pilot");
    }

    #[test]
    fn test_empty_container() {
        let json = r#"{"MediaContainer": {"size": 0}}"#;
        let env: Envelope<MetadataContainer> = serde_json::from_str(json).unwrap();
        assert!(env.container.metadata.is_empty());
    }

    #[test]
    fn test_describe_movie_and_track() {
        let movie = Metadata {
            title: Some("Heat".into()),
            media_type: Some("movie".into()),
            year: Some(1995),
            ..Default::default()
        };
        assert_eq!(movie.describe(), "Heat (1995)");

        let track = Metadata {
            title: Some("Alive".into()),
            media_type: Some("track".into()),
            grandparent_title: Some("Daft Punk".into()),
            parent_title: Some("Discovery".into()),
            ..Default::default()
        };
        assert_eq!(track.describe(), "Daft Punk - Discovery - Alive");
    }

    #[test]
    fn test_clients_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "size": 1,
                "Server": [{
                    "name": "Shield",
                    "host": "10.0.0.9",
                    "machineIdentifier": "client-1",
                    "product": "Plex for Android (TV)",
                    "protocolCapabilities": "playback,navigation,timeline"
                }]
            }
        }"#;
        let env: Envelope<ClientContainer> = serde_json::from_str(json).unwrap();
        let client = &env.container.servers[0];
        assert_eq!(client.name, "Shield");
        assert_eq!(client.machine_identifier, "client-1");
        assert!(client
            .protocol_capabilities
            .as_deref()
            .unwrap()
            .contains("playback"));
    }
}
