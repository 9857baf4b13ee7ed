//! MCP tool parameter and response types.
//!
//! Parameter structs drive the schemas advertised to MCP clients; response
//! structs shape the JSON payload each tool returns. Upstream wire models
//! that already serialize well (library sections, full metadata) are passed
//! through as-is by the handlers, so only the shaped summaries live here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use plex_mcp_client::Metadata;
use plex_mcp_core::MediaType;

fn default_recent_count() -> u32 {
    50
}

fn default_history_limit() -> u32 {
    25
}

fn default_playlist_type() -> String {
    "video".to_string()
}

/// Format a Plex epoch-seconds timestamp for display.
pub(crate) fn format_epoch(secs: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

// =============================================================================
// Library Tools
// =============================================================================

/// Parameters for library_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryListParams {}

/// Parameters for library_get_details
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryDetailsParams {
    /// Name of the library, e.g. "Movies"
    pub library_name: String,
}

/// Parameters for library_get_contents
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryContentsParams {
    /// Name of the library to list
    pub library_name: String,
}

/// Parameters for library_get_recently_added
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecentlyAddedParams {
    /// Restrict to one library; all libraries if omitted
    #[serde(default)]
    pub library_name: Option<String>,

    /// Maximum number of items to return
    #[serde(default = "default_recent_count")]
    pub count: u32,
}

/// Parameters for library_refresh
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryRefreshParams {
    /// Library to refresh; all libraries if omitted
    #[serde(default)]
    pub library_name: Option<String>,
}

/// Parameters for library_scan
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryScanParams {
    /// Library to scan for new files
    pub library_name: String,

    /// Restrict the scan to one filesystem path inside the library
    #[serde(default)]
    pub path: Option<String>,
}

/// Parameters for library_get_stats
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryStatsParams {
    /// Library to count, e.g. "TV Shows"
    pub library_name: String,
}

// =============================================================================
// Media Tools
// =============================================================================

/// Parameters for media_search
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaSearchParams {
    /// Search text
    pub query: String,

    /// Restrict results to one media type
    #[serde(default)]
    pub media_type: Option<MediaType>,
}

/// Parameters for media_get_details
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaDetailsParams {
    /// Rating key (item id) as returned by search or listing tools
    pub rating_key: String,
}

/// Parameters for media_edit_metadata
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaEditParams {
    /// Rating key of the item to edit
    pub rating_key: String,

    /// New title
    #[serde(default)]
    pub new_title: Option<String>,

    /// New sort title
    #[serde(default)]
    pub new_sort_title: Option<String>,

    /// New summary
    #[serde(default)]
    pub new_summary: Option<String>,

    /// New release year
    #[serde(default)]
    pub new_year: Option<u32>,

    /// New content rating, e.g. "PG-13"
    #[serde(default)]
    pub new_content_rating: Option<String>,
}

/// Parameters for media_delete
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaDeleteParams {
    /// Rating key of the item to permanently delete
    pub rating_key: String,
}

// =============================================================================
// Playlist Tools
// =============================================================================

/// Parameters for playlist_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistListParams {
    /// Filter by playlist type: audio, video or photo
    #[serde(default)]
    pub playlist_type: Option<String>,
}

/// Parameters for playlist_get_contents
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistContentsParams {
    /// Title of the playlist
    pub playlist_title: String,
}

/// Parameters for playlist_create
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistCreateParams {
    /// Title of the new playlist
    pub title: String,

    /// Playlist type: audio, video or photo
    #[serde(default = "default_playlist_type")]
    pub playlist_type: String,

    /// Rating keys of the initial items
    pub item_keys: Vec<String>,
}

/// Parameters for playlist_add_to
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistAddParams {
    /// Title of the playlist to extend
    pub playlist_title: String,

    /// Rating keys of the items to append
    pub item_keys: Vec<String>,
}

/// Parameters for playlist_edit
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistEditParams {
    /// Title of the playlist to edit
    pub playlist_title: String,

    /// New title
    #[serde(default)]
    pub new_title: Option<String>,

    /// New summary
    #[serde(default)]
    pub new_summary: Option<String>,
}

/// Parameters for playlist_copy_to_user
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistCopyParams {
    /// Title of the playlist to copy
    pub playlist_title: String,

    /// Account name that receives the copy
    pub username: String,
}

/// Parameters for playlist_remove_from
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistRemoveParams {
    /// Title of the playlist
    pub playlist_title: String,

    /// Title of the entry to remove
    pub item_title: String,
}

/// Parameters for playlist_delete
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaylistDeleteParams {
    /// Title of the playlist to delete
    pub playlist_title: String,
}

// =============================================================================
// Collection Tools
// =============================================================================

/// Parameters for collection_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionListParams {
    /// Library whose collections to list
    pub library_name: String,
}

/// Parameters for collection_get_contents
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionContentsParams {
    /// Library the collection belongs to
    pub library_name: String,

    /// Title of the collection
    pub collection_title: String,
}

/// Parameters for collection_edit
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionEditParams {
    /// Library the collection belongs to
    pub library_name: String,

    /// Title of the collection to edit
    pub collection_title: String,

    /// New title
    #[serde(default)]
    pub new_title: Option<String>,

    /// New sort title
    #[serde(default)]
    pub new_sort_title: Option<String>,

    /// New summary
    #[serde(default)]
    pub new_summary: Option<String>,

    /// New content rating, e.g. "PG-13"
    #[serde(default)]
    pub new_content_rating: Option<String>,
}

/// Parameters for collection_create
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionCreateParams {
    /// Library the collection belongs to
    pub library_name: String,

    /// Title of the new collection
    pub title: String,

    /// Rating keys of the initial members
    pub item_keys: Vec<String>,
}

/// Parameters for collection_add_to
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionAddParams {
    /// Library the collection belongs to
    pub library_name: String,

    /// Title of the collection to extend
    pub collection_title: String,

    /// Rating keys of the items to add
    pub item_keys: Vec<String>,
}

/// Parameters for collection_remove_from
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionRemoveParams {
    /// Library the collection belongs to
    pub library_name: String,

    /// Title of the collection
    pub collection_title: String,

    /// Rating key of the member to remove
    pub item_key: String,
}

/// Parameters for collection_delete
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionDeleteParams {
    /// Library the collection belongs to
    pub library_name: String,

    /// Title of the collection to delete
    pub collection_title: String,
}

// =============================================================================
// User / Session / Client / Server Tools
// =============================================================================

/// Parameters for user_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserListParams {
    /// Case-insensitive substring filter on account names
    #[serde(default)]
    pub search: Option<String>,
}

/// Parameters for user_get_info
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserInfoParams {
    /// Account name to look up
    pub username: String,
}

/// Parameters for user_get_watch_history
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WatchHistoryParams {
    /// Account to filter by; the configured account if omitted, or the
    /// whole server when no account is configured
    #[serde(default)]
    pub username: Option<String>,

    /// Maximum number of history entries
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

/// Parameters for sessions_get_active
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionsActiveParams {}

/// Parameters for client_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientListParams {}

/// Parameters for client_control_playback
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientPlaybackParams {
    /// Name of the client to control
    pub client_name: String,

    /// Playback command: play, pause, stop, skipNext, skipPrevious,
    /// stepForward, stepBack or seekTo
    pub command: String,

    /// Seek offset in milliseconds, required by seekTo
    #[serde(default)]
    pub offset_ms: Option<u64>,
}

/// Parameters for client_start_playback
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientStartPlaybackParams {
    /// Name of the client to play on
    pub client_name: String,

    /// Rating key of the item to play
    pub rating_key: String,

    /// Start position in milliseconds
    #[serde(default)]
    pub offset_ms: u64,
}

/// Parameters for server_get_info
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerInfoParams {}

// =============================================================================
// Shaped responses
// =============================================================================

/// Uniform acknowledgment for mutating tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    /// What happened
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Compact listing entry for media items.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemSummary {
    /// Item id, usable with the media_* tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_key: Option<String>,

    /// Human-oriented description, e.g. "Show - S2E8 - Title"
    pub title: String,

    /// Media type: movie, show, episode, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Release year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    /// When the item was added to the library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
}

impl From<&Metadata> for ItemSummary {
    fn from(item: &Metadata) -> Self {
        Self {
            rating_key: item.rating_key.clone(),
            title: item.describe(),
            media_type: item.media_type.clone(),
            year: item.year,
            added_at: item.added_at.and_then(format_epoch),
        }
    }
}

/// Listing response shared by contents/search style tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemListResponse {
    /// Number of items returned
    pub count: usize,

    /// The items
    pub items: Vec<ItemSummary>,
}

impl ItemListResponse {
    pub fn from_metadata(items: &[Metadata]) -> Self {
        Self {
            count: items.len(),
            items: items.iter().map(ItemSummary::from).collect(),
        }
    }
}

/// One active playback session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionSummary {
    /// What is being played
    pub content: String,

    /// Media type: movie, episode, track, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Account watching it
    pub user: String,

    /// Player device name
    pub player: String,

    /// Playback state: playing, paused, buffering
    pub state: String,

    /// Player network address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Playback progress 0-100, when duration is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,

    /// Session bandwidth in kbps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u64>,

    /// lan or wan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Video transcode decision, when a transcode is running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcode: Option<String>,
}

impl From<&Metadata> for SessionSummary {
    fn from(item: &Metadata) -> Self {
        let progress_percent = match (item.view_offset, item.duration) {
            (Some(offset), Some(duration)) if duration > 0 => {
                Some(((offset * 100) / duration).min(100) as u8)
            }
            _ => None,
        };
        Self {
            content: item.describe(),
            media_type: item.media_type.clone(),
            user: item
                .user
                .as_ref()
                .and_then(|u| u.title.clone())
                .unwrap_or_else(|| "Unknown User".to_string()),
            player: item
                .player
                .as_ref()
                .and_then(|p| p.title.clone())
                .unwrap_or_else(|| "Unknown Player".to_string()),
            state: item
                .player
                .as_ref()
                .and_then(|p| p.state.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            address: item.player.as_ref().and_then(|p| p.address.clone()),
            progress_percent,
            bandwidth: item.session.as_ref().and_then(|s| s.bandwidth),
            location: item.session.as_ref().and_then(|s| s.location.clone()),
            transcode: item
                .transcode_session
                .as_ref()
                .and_then(|t| t.video_decision.clone()),
        }
    }
}

/// Response for sessions_get_active.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionsActiveResponse {
    /// Number of active sessions
    pub count: usize,

    /// The sessions
    pub sessions: Vec<SessionSummary>,
}

/// One watch-history entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistorySummary {
    /// What was watched
    pub content: String,

    /// Media type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// When it was watched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<String>,

    /// Server account id that watched it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<u64>,
}

impl From<&Metadata> for HistorySummary {
    fn from(item: &Metadata) -> Self {
        Self {
            content: item.describe(),
            media_type: item.media_type.clone(),
            viewed_at: item.viewed_at.and_then(format_epoch),
            account_id: item.account_id,
        }
    }
}

/// Response for user_get_watch_history.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WatchHistoryResponse {
    /// Number of entries returned
    pub count: usize,

    /// History entries, newest first
    pub entries: Vec<HistorySummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch() {
        let formatted = format_epoch(0).unwrap();
        assert_eq!(formatted, "1970-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_item_summary_from_metadata() {
        let item = Metadata {
            rating_key: Some("42".into()),
            title: Some("Heat".into()),
            media_type: Some("movie".into()),
            year: Some(1995),
            added_at: Some(0),
            ..Default::default()
        };
        let summary = ItemSummary::from(&item);
        assert_eq!(summary.rating_key.as_deref(), Some("42"));
        assert_eq!(summary.title, "Heat (1995)");
        assert_eq!(summary.added_at.as_deref(), Some("1970-01-01 00:00:00 UTC"));
    }

    #[test]
    fn test_session_summary_progress() {
        let item = Metadata {
            title: Some("Heat".into()),
            media_type: Some("movie".into()),
            view_offset: Some(5_100_000),
            duration: Some(10_200_000),
            ..Default::default()
        };
        let summary = SessionSummary::from(&item);
        assert_eq!(summary.progress_percent, Some(50));
        assert_eq!(summary.user, "Unknown User");
        assert_eq!(summary.state, "unknown");
    }

    #[test]
    fn test_session_summary_no_duration() {
        let summary = SessionSummary::from(&Metadata::default());
        assert_eq!(summary.progress_percent, None);
    }

    #[test]
    fn test_params_defaults() {
        let params: RecentlyAddedParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.count, 50);
        assert!(params.library_name.is_none());

        let params: WatchHistoryParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.limit, 25);

        let params: PlaylistCreateParams =
            serde_json::from_str(r#"{"title": "Mix", "item_keys": ["1"]}"#).unwrap();
        assert_eq!(params.playlist_type, "video");

        let params: ClientStartPlaybackParams =
            serde_json::from_str(r#"{"client_name": "Living Room", "rating_key": "42"}"#).unwrap();
        assert_eq!(params.offset_ms, 0);

        let params: PlaylistEditParams =
            serde_json::from_str(r#"{"playlist_title": "Mix"}"#).unwrap();
        assert!(params.new_title.is_none());
        assert!(params.new_summary.is_none());
    }

    #[test]
    fn test_item_list_response() {
        let items = vec![Metadata::default(), Metadata::default()];
        let response = ItemListResponse::from_metadata(&items);
        assert_eq!(response.count, 2);
        assert_eq!(response.items.len(), 2);
    }
}
