//! Plex MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router]
//! pattern. Every tool runs through the connection manager's
//! `with_session` so the single upstream connection, its staleness window,
//! and the reconnect-once retry policy stay invisible to the handlers.

use std::str::FromStr;
use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use plex_mcp_client::PlaybackCommand;
use plex_mcp_connection::{ConnectionManager, PlexConnectionManager, PlexConnector};
use plex_mcp_core::{Error, MediaType, PlexConfig};

use crate::tools::*;

/// Map a domain error onto the MCP error space: bad/unknown inputs are
/// invalid-params, everything else is an internal error.
fn mcp_error(err: Error) -> McpError {
    let code = match &err {
        Error::NotFound(_) | Error::InvalidInput(_) => ErrorCode(-32602),
        _ => ErrorCode(-32603),
    };
    McpError::new(code, err.to_string(), None)
}

/// Serialize a response as pretty JSON tool content.
fn json_content<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::new(
            ErrorCode(-32603),
            format!("failed to encode response: {e}"),
            None,
        )
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Plex MCP Server
///
/// Holds the process-wide connection manager and routes MCP tool calls to
/// the Plex API.
#[derive(Clone)]
pub struct PlexMcpServer {
    /// Owner of the single upstream connection
    connection: Arc<PlexConnectionManager>,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PlexMcpServer {
    /// Create a server from validated configuration.
    pub fn new(config: PlexConfig) -> Self {
        let ttl = config.connection_ttl;
        Self::with_manager(Arc::new(ConnectionManager::new(
            PlexConnector::new(config),
            ttl,
        )))
    }

    /// Create a server around an existing connection manager.
    pub fn with_manager(connection: Arc<PlexConnectionManager>) -> Self {
        Self {
            connection,
            tool_router: Self::tool_router(),
        }
    }

    // =========================================================================
    // Library tools
    // =========================================================================

    /// List all library sections
    #[tool(description = "List all libraries on the Plex server")]
    #[instrument(skip_all)]
    async fn library_list(
        &self,
        Parameters(_params): Parameters<LibraryListParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!("listing libraries");
        let libraries = self
            .connection
            .with_session(|handle| async move { handle.session().libraries().await })
            .await
            .map_err(mcp_error)?;

        info!("found {} libraries", libraries.len());
        json_content(&libraries)
    }

    #[tool(description = "Get details about a specific library, including its locations")]
    #[instrument(skip_all)]
    async fn library_get_details(
        &self,
        Parameters(params): Parameters<LibraryDetailsParams>,
    ) -> Result<CallToolResult, McpError> {
        let section = self
            .connection
            .with_session(|handle| {
                let name = params.library_name.clone();
                async move { handle.session().section_by_title(&name).await }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&section)
    }

    #[tool(description = "List every item in a library")]
    #[instrument(skip_all)]
    async fn library_get_contents(
        &self,
        Parameters(params): Parameters<LibraryContentsParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("listing contents of library '{}'", params.library_name);
        let items = self
            .connection
            .with_session(|handle| {
                let name = params.library_name.clone();
                async move {
                    let section = handle.session().section_by_title(&name).await?;
                    handle.session().section_items(&section.key).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&ItemListResponse::from_metadata(&items))
    }

    #[tool(description = "List recently added media, optionally scoped to one library")]
    #[instrument(skip_all)]
    async fn library_get_recently_added(
        &self,
        Parameters(params): Parameters<RecentlyAddedParams>,
    ) -> Result<CallToolResult, McpError> {
        let items = self
            .connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                let count = params.count;
                async move {
                    let section_key = match &library_name {
                        Some(name) => Some(handle.session().section_by_title(name).await?.key),
                        None => None,
                    };
                    handle
                        .session()
                        .recently_added(section_key.as_deref(), count)
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&ItemListResponse::from_metadata(&items))
    }

    #[tool(description = "Refresh metadata for one library or all libraries")]
    #[instrument(skip_all)]
    async fn library_refresh(
        &self,
        Parameters(params): Parameters<LibraryRefreshParams>,
    ) -> Result<CallToolResult, McpError> {
        self.connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                async move {
                    match &library_name {
                        Some(name) => {
                            let section = handle.session().section_by_title(name).await?;
                            handle.session().refresh_section(&section.key).await
                        }
                        None => handle.session().refresh_all().await,
                    }
                }
            })
            .await
            .map_err(mcp_error)?;

        let message = match &params.library_name {
            Some(name) => format!("Refresh started for library '{name}'"),
            None => "Refresh started for all libraries".to_string(),
        };
        json_content(&MessageResponse::new(message))
    }

    #[tool(description = "Scan a library for new or changed files, optionally under one path")]
    #[instrument(skip_all)]
    async fn library_scan(
        &self,
        Parameters(params): Parameters<LibraryScanParams>,
    ) -> Result<CallToolResult, McpError> {
        self.connection
            .with_session(|handle| {
                let name = params.library_name.clone();
                let path = params.path.clone();
                async move {
                    let section = handle.session().section_by_title(&name).await?;
                    handle
                        .session()
                        .scan_section(&section.key, path.as_deref())
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Scan started for library '{}'",
            params.library_name
        )))
    }

    #[tool(description = "Get item counts for a library, including unwatched totals")]
    #[instrument(skip_all)]
    async fn library_get_stats(
        &self,
        Parameters(params): Parameters<LibraryStatsParams>,
    ) -> Result<CallToolResult, McpError> {
        let stats = self
            .connection
            .with_session(|handle| {
                let name = params.library_name.clone();
                async move {
                    let section = handle.session().section_by_title(&name).await?;
                    handle.session().section_stats(&section).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&stats)
    }

    // =========================================================================
    // Media tools
    // =========================================================================

    #[tool(description = "Search the whole server for media by title")]
    #[instrument(skip_all)]
    async fn media_search(
        &self,
        Parameters(params): Parameters<MediaSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("searching for '{}'", params.query);
        let items = self
            .connection
            .with_session(|handle| {
                let query = params.query.clone();
                let media_type = params.media_type;
                async move { handle.session().search(&query, media_type).await }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&ItemListResponse::from_metadata(&items))
    }

    #[tool(description = "Get full metadata for one media item by rating key")]
    #[instrument(skip_all)]
    async fn media_get_details(
        &self,
        Parameters(params): Parameters<MediaDetailsParams>,
    ) -> Result<CallToolResult, McpError> {
        let item = self
            .connection
            .with_session(|handle| {
                let rating_key = params.rating_key.clone();
                async move { handle.session().metadata(&rating_key).await }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&item)
    }

    #[tool(description = "Edit metadata fields (title, summary, year, ...) of a media item")]
    #[instrument(skip_all)]
    async fn media_edit_metadata(
        &self,
        Parameters(params): Parameters<MediaEditParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut fields: Vec<(String, String)> = Vec::new();
        if let Some(v) = &params.new_title {
            fields.push(("title".into(), v.clone()));
        }
        if let Some(v) = &params.new_sort_title {
            fields.push(("titleSort".into(), v.clone()));
        }
        if let Some(v) = &params.new_summary {
            fields.push(("summary".into(), v.clone()));
        }
        if let Some(v) = params.new_year {
            fields.push(("year".into(), v.to_string()));
        }
        if let Some(v) = &params.new_content_rating {
            fields.push(("contentRating".into(), v.clone()));
        }
        if fields.is_empty() {
            return Err(mcp_error(Error::InvalidInput(
                "no metadata fields to edit".into(),
            )));
        }

        let edited = fields.len();
        self.connection
            .with_session(|handle| {
                let rating_key = params.rating_key.clone();
                let fields = fields.clone();
                async move {
                    let item = handle.session().metadata(&rating_key).await?;
                    let section_id = item.library_section_id.ok_or_else(|| {
                        Error::Other(format!("item {rating_key} has no library section"))
                    })?;
                    let type_code = item
                        .media_type
                        .as_deref()
                        .and_then(|t| MediaType::from_str(t).ok())
                        .map(MediaType::code)
                        .ok_or_else(|| {
                            Error::Other(format!("item {rating_key} has no editable type"))
                        })?;
                    handle
                        .session()
                        .edit_metadata(&rating_key, section_id, type_code, &fields)
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Updated {edited} field(s) on item {}",
            params.rating_key
        )))
    }

    #[tool(description = "Permanently delete a media item and its files from the server")]
    #[instrument(skip_all)]
    async fn media_delete(
        &self,
        Parameters(params): Parameters<MediaDeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("deleting media item {}", params.rating_key);
        let title = self
            .connection
            .with_session(|handle| {
                let rating_key = params.rating_key.clone();
                async move {
                    let item = handle.session().metadata(&rating_key).await?;
                    handle.session().delete_media(&rating_key).await?;
                    Ok(item.describe())
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!("Deleted '{title}'")))
    }

    // =========================================================================
    // Playlist tools
    // =========================================================================

    #[tool(description = "List playlists, optionally filtered by type (audio, video, photo)")]
    #[instrument(skip_all)]
    async fn playlist_list(
        &self,
        Parameters(params): Parameters<PlaylistListParams>,
    ) -> Result<CallToolResult, McpError> {
        let playlists = self
            .connection
            .with_session(|handle| {
                let playlist_type = params.playlist_type.clone();
                async move { handle.session().playlists(playlist_type.as_deref()).await }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&ItemListResponse::from_metadata(&playlists))
    }

    #[tool(description = "List the items of a playlist")]
    #[instrument(skip_all)]
    async fn playlist_get_contents(
        &self,
        Parameters(params): Parameters<PlaylistContentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let items = self
            .connection
            .with_session(|handle| {
                let title = params.playlist_title.clone();
                async move {
                    let playlist = handle.session().playlist_by_title(&title).await?;
                    let key = playlist
                        .rating_key
                        .ok_or_else(|| Error::Other(format!("playlist '{title}' has no key")))?;
                    handle.session().playlist_items(&key).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&ItemListResponse::from_metadata(&items))
    }

    #[tool(description = "Create a playlist from existing media items")]
    #[instrument(skip_all)]
    async fn playlist_create(
        &self,
        Parameters(params): Parameters<PlaylistCreateParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "creating playlist '{}' with {} items",
            params.title,
            params.item_keys.len()
        );
        let playlist = self
            .connection
            .with_session(|handle| {
                let title = params.title.clone();
                let playlist_type = params.playlist_type.clone();
                let item_keys = params.item_keys.clone();
                async move {
                    handle
                        .session()
                        .create_playlist(
                            handle.machine_identifier(),
                            &title,
                            &playlist_type,
                            &item_keys,
                        )
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&playlist)
    }

    #[tool(description = "Append media items to an existing playlist")]
    #[instrument(skip_all)]
    async fn playlist_add_to(
        &self,
        Parameters(params): Parameters<PlaylistAddParams>,
    ) -> Result<CallToolResult, McpError> {
        let added = params.item_keys.len();
        self.connection
            .with_session(|handle| {
                let title = params.playlist_title.clone();
                let item_keys = params.item_keys.clone();
                async move {
                    let playlist = handle.session().playlist_by_title(&title).await?;
                    let key = playlist
                        .rating_key
                        .ok_or_else(|| Error::Other(format!("playlist '{title}' has no key")))?;
                    handle
                        .session()
                        .playlist_add_items(handle.machine_identifier(), &key, &item_keys)
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Added {added} item(s) to playlist '{}'",
            params.playlist_title
        )))
    }

    #[tool(description = "Rename a playlist or change its summary")]
    #[instrument(skip_all)]
    async fn playlist_edit(
        &self,
        Parameters(params): Parameters<PlaylistEditParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.new_title.is_none() && params.new_summary.is_none() {
            return Err(mcp_error(Error::InvalidInput(
                "no playlist fields to edit".into(),
            )));
        }

        self.connection
            .with_session(|handle| {
                let title = params.playlist_title.clone();
                let new_title = params.new_title.clone();
                let new_summary = params.new_summary.clone();
                async move {
                    let playlist = handle.session().playlist_by_title(&title).await?;
                    let key = playlist
                        .rating_key
                        .ok_or_else(|| Error::Other(format!("playlist '{title}' has no key")))?;
                    handle
                        .session()
                        .edit_playlist(&key, new_title.as_deref(), new_summary.as_deref())
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Updated playlist '{}'",
            params.new_title.as_deref().unwrap_or(&params.playlist_title)
        )))
    }

    #[tool(description = "Copy a playlist to another server account")]
    #[instrument(skip_all)]
    async fn playlist_copy_to_user(
        &self,
        Parameters(params): Parameters<PlaylistCopyParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "copying playlist '{}' to user '{}'",
            params.playlist_title, params.username
        );
        self.connection
            .with_session(|handle| {
                let title = params.playlist_title.clone();
                let username = params.username.clone();
                async move {
                    let playlist = handle.session().playlist_by_title(&title).await?;
                    let key = playlist
                        .rating_key
                        .ok_or_else(|| Error::Other(format!("playlist '{title}' has no key")))?;
                    let account = handle.session().find_account(&username).await?;
                    handle
                        .session()
                        .copy_playlist_to_user(&key, account.id)
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Copied playlist '{}' to user '{}'",
            params.playlist_title, params.username
        )))
    }

    #[tool(description = "Remove an entry from a playlist by its title")]
    #[instrument(skip_all)]
    async fn playlist_remove_from(
        &self,
        Parameters(params): Parameters<PlaylistRemoveParams>,
    ) -> Result<CallToolResult, McpError> {
        self.connection
            .with_session(|handle| {
                let playlist_title = params.playlist_title.clone();
                let item_title = params.item_title.clone();
                async move {
                    let playlist = handle.session().playlist_by_title(&playlist_title).await?;
                    let key = playlist.rating_key.ok_or_else(|| {
                        Error::Other(format!("playlist '{playlist_title}' has no key"))
                    })?;
                    let items = handle.session().playlist_items(&key).await?;
                    let entry = items
                        .iter()
                        .find(|i| {
                            i.title
                                .as_deref()
                                .is_some_and(|t| t.eq_ignore_ascii_case(&item_title))
                        })
                        .ok_or_else(|| {
                            Error::NotFound(format!(
                                "item '{item_title}' in playlist '{playlist_title}'"
                            ))
                        })?;
                    let item_id = entry.playlist_item_id.ok_or_else(|| {
                        Error::Other(format!("item '{item_title}' has no playlist entry id"))
                    })?;
                    handle.session().playlist_remove_item(&key, item_id).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Removed '{}' from playlist '{}'",
            params.item_title, params.playlist_title
        )))
    }

    #[tool(description = "Delete a playlist")]
    #[instrument(skip_all)]
    async fn playlist_delete(
        &self,
        Parameters(params): Parameters<PlaylistDeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("deleting playlist '{}'", params.playlist_title);
        self.connection
            .with_session(|handle| {
                let title = params.playlist_title.clone();
                async move {
                    let playlist = handle.session().playlist_by_title(&title).await?;
                    let key = playlist
                        .rating_key
                        .ok_or_else(|| Error::Other(format!("playlist '{title}' has no key")))?;
                    handle.session().delete_playlist(&key).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Deleted playlist '{}'",
            params.playlist_title
        )))
    }

    // =========================================================================
    // Collection tools
    // =========================================================================

    #[tool(description = "List the collections of a library")]
    #[instrument(skip_all)]
    async fn collection_list(
        &self,
        Parameters(params): Parameters<CollectionListParams>,
    ) -> Result<CallToolResult, McpError> {
        let collections = self
            .connection
            .with_session(|handle| {
                let name = params.library_name.clone();
                async move {
                    let section = handle.session().section_by_title(&name).await?;
                    handle.session().collections(&section.key).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&ItemListResponse::from_metadata(&collections))
    }

    #[tool(description = "List the members of a collection")]
    #[instrument(skip_all)]
    async fn collection_get_contents(
        &self,
        Parameters(params): Parameters<CollectionContentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let items = self
            .connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                let collection_title = params.collection_title.clone();
                async move {
                    let section = handle.session().section_by_title(&library_name).await?;
                    let collection = handle
                        .session()
                        .collection_by_title(&section.key, &collection_title)
                        .await?;
                    let key = collection.rating_key.ok_or_else(|| {
                        Error::Other(format!("collection '{collection_title}' has no key"))
                    })?;
                    handle.session().collection_items(&key).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&ItemListResponse::from_metadata(&items))
    }

    #[tool(description = "Edit a collection's title, sort title, summary or content rating")]
    #[instrument(skip_all)]
    async fn collection_edit(
        &self,
        Parameters(params): Parameters<CollectionEditParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut fields: Vec<(String, String)> = Vec::new();
        if let Some(v) = &params.new_title {
            fields.push(("title".into(), v.clone()));
        }
        if let Some(v) = &params.new_sort_title {
            fields.push(("titleSort".into(), v.clone()));
        }
        if let Some(v) = &params.new_summary {
            fields.push(("summary".into(), v.clone()));
        }
        if let Some(v) = &params.new_content_rating {
            fields.push(("contentRating".into(), v.clone()));
        }
        if fields.is_empty() {
            return Err(mcp_error(Error::InvalidInput(
                "no collection fields to edit".into(),
            )));
        }

        let edited = fields.len();
        self.connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                let collection_title = params.collection_title.clone();
                let fields = fields.clone();
                async move {
                    let section = handle.session().section_by_title(&library_name).await?;
                    let section_id: u32 = section.key.parse().map_err(|_| {
                        Error::Other(format!("section key '{}' is not numeric", section.key))
                    })?;
                    let collection = handle
                        .session()
                        .collection_by_title(&section.key, &collection_title)
                        .await?;
                    let key = collection.rating_key.ok_or_else(|| {
                        Error::Other(format!("collection '{collection_title}' has no key"))
                    })?;
                    handle
                        .session()
                        .edit_collection(&key, section_id, &fields)
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Updated {edited} field(s) on collection '{}'",
            params.collection_title
        )))
    }

    #[tool(description = "Create a collection from existing media items in a library")]
    #[instrument(skip_all)]
    async fn collection_create(
        &self,
        Parameters(params): Parameters<CollectionCreateParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "creating collection '{}' in library '{}'",
            params.title, params.library_name
        );
        let collection = self
            .connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                let title = params.title.clone();
                let item_keys = params.item_keys.clone();
                async move {
                    let section = handle.session().section_by_title(&library_name).await?;
                    let section_id: u32 = section.key.parse().map_err(|_| {
                        Error::Other(format!("section key '{}' is not numeric", section.key))
                    })?;
                    let type_code = MediaType::from_str(&section.section_type)
                        .map(MediaType::code)
                        .unwrap_or(1);
                    handle
                        .session()
                        .create_collection(
                            handle.machine_identifier(),
                            section_id,
                            type_code,
                            &title,
                            &item_keys,
                        )
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&collection)
    }

    #[tool(description = "Add media items to an existing collection")]
    #[instrument(skip_all)]
    async fn collection_add_to(
        &self,
        Parameters(params): Parameters<CollectionAddParams>,
    ) -> Result<CallToolResult, McpError> {
        let added = params.item_keys.len();
        self.connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                let collection_title = params.collection_title.clone();
                let item_keys = params.item_keys.clone();
                async move {
                    let section = handle.session().section_by_title(&library_name).await?;
                    let collection = handle
                        .session()
                        .collection_by_title(&section.key, &collection_title)
                        .await?;
                    let key = collection.rating_key.ok_or_else(|| {
                        Error::Other(format!("collection '{collection_title}' has no key"))
                    })?;
                    handle
                        .session()
                        .collection_add_items(handle.machine_identifier(), &key, &item_keys)
                        .await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Added {added} item(s) to collection '{}'",
            params.collection_title
        )))
    }

    #[tool(description = "Remove a media item from a collection")]
    #[instrument(skip_all)]
    async fn collection_remove_from(
        &self,
        Parameters(params): Parameters<CollectionRemoveParams>,
    ) -> Result<CallToolResult, McpError> {
        self.connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                let collection_title = params.collection_title.clone();
                let item_key = params.item_key.clone();
                async move {
                    let section = handle.session().section_by_title(&library_name).await?;
                    let collection = handle
                        .session()
                        .collection_by_title(&section.key, &collection_title)
                        .await?;
                    let key = collection.rating_key.ok_or_else(|| {
                        Error::Other(format!("collection '{collection_title}' has no key"))
                    })?;
                    handle.session().collection_remove_item(&key, &item_key).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Removed item {} from collection '{}'",
            params.item_key, params.collection_title
        )))
    }

    #[tool(description = "Delete a collection (its member items are kept)")]
    #[instrument(skip_all)]
    async fn collection_delete(
        &self,
        Parameters(params): Parameters<CollectionDeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("deleting collection '{}'", params.collection_title);
        self.connection
            .with_session(|handle| {
                let library_name = params.library_name.clone();
                let collection_title = params.collection_title.clone();
                async move {
                    let section = handle.session().section_by_title(&library_name).await?;
                    let collection = handle
                        .session()
                        .collection_by_title(&section.key, &collection_title)
                        .await?;
                    let key = collection.rating_key.ok_or_else(|| {
                        Error::Other(format!("collection '{collection_title}' has no key"))
                    })?;
                    handle.session().delete_collection(&key).await
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Deleted collection '{}'",
            params.collection_title
        )))
    }

    // =========================================================================
    // User, session, client and server tools
    // =========================================================================

    #[tool(description = "List the accounts on the server, optionally filtered by name")]
    #[instrument(skip_all)]
    async fn user_list(
        &self,
        Parameters(params): Parameters<UserListParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut accounts = self
            .connection
            .with_session(|handle| async move { handle.session().accounts().await })
            .await
            .map_err(mcp_error)?;

        if let Some(search) = &params.search {
            let needle = search.to_lowercase();
            accounts.retain(|a| a.name.to_lowercase().contains(&needle));
        }

        json_content(&accounts)
    }

    #[tool(description = "Get details about one server account")]
    #[instrument(skip_all)]
    async fn user_get_info(
        &self,
        Parameters(params): Parameters<UserInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        let account = self
            .connection
            .with_session(|handle| {
                let username = params.username.clone();
                async move { handle.session().find_account(&username).await }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&account)
    }

    #[tool(description = "Get watch history, newest first, optionally for one account")]
    #[instrument(skip_all)]
    async fn user_get_watch_history(
        &self,
        Parameters(params): Parameters<WatchHistoryParams>,
    ) -> Result<CallToolResult, McpError> {
        let entries = self
            .connection
            .with_session(|handle| {
                let username = params.username.clone();
                let limit = params.limit;
                async move {
                    // Explicit username wins; otherwise fall back to the
                    // account resolved at handshake time, if any.
                    let account_id = match &username {
                        Some(name) => Some(handle.session().find_account(name).await?.id),
                        None => handle.account().map(|a| a.id),
                    };
                    handle.session().watch_history(account_id, limit).await
                }
            })
            .await
            .map_err(mcp_error)?;

        let response = WatchHistoryResponse {
            count: entries.len(),
            entries: entries.iter().map(HistorySummary::from).collect(),
        };
        json_content(&response)
    }

    #[tool(
        description = "Get current playback sessions, including who is watching what and from where"
    )]
    #[instrument(skip_all)]
    async fn sessions_get_active(
        &self,
        Parameters(_params): Parameters<SessionsActiveParams>,
    ) -> Result<CallToolResult, McpError> {
        let sessions = self
            .connection
            .with_session(|handle| async move { handle.session().active_sessions().await })
            .await
            .map_err(mcp_error)?;

        info!("found {} active sessions", sessions.len());
        let response = SessionsActiveResponse {
            count: sessions.len(),
            sessions: sessions.iter().map(SessionSummary::from).collect(),
        };
        json_content(&response)
    }

    #[tool(description = "List the controllable Plex clients connected to the server")]
    #[instrument(skip_all)]
    async fn client_list(
        &self,
        Parameters(_params): Parameters<ClientListParams>,
    ) -> Result<CallToolResult, McpError> {
        let clients = self
            .connection
            .with_session(|handle| async move { handle.session().clients().await })
            .await
            .map_err(mcp_error)?;

        json_content(&clients)
    }

    #[tool(
        description = "Control playback on a client: play, pause, stop, skipNext, skipPrevious, stepForward, stepBack or seekTo (with offset_ms)"
    )]
    #[instrument(skip_all)]
    async fn client_control_playback(
        &self,
        Parameters(params): Parameters<ClientPlaybackParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "sending '{}' to client '{}'",
            params.command, params.client_name
        );

        let seek = params.command.eq_ignore_ascii_case("seekto");
        let command = if seek {
            None
        } else {
            Some(PlaybackCommand::from_str(&params.command).map_err(mcp_error)?)
        };
        if seek && params.offset_ms.is_none() {
            return Err(mcp_error(Error::InvalidInput(
                "seekTo requires offset_ms".into(),
            )));
        }

        self.connection
            .with_session(|handle| {
                let client_name = params.client_name.clone();
                let offset_ms = params.offset_ms;
                async move {
                    let client = handle.session().client_by_name(&client_name).await?;
                    match command {
                        Some(cmd) => {
                            handle
                                .session()
                                .playback_command(&client.machine_identifier, cmd, offset_ms)
                                .await
                        }
                        None => {
                            let offset = offset_ms.unwrap_or_default();
                            handle
                                .session()
                                .seek_to(&client.machine_identifier, offset)
                                .await
                        }
                    }
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Sent '{}' to client '{}'",
            params.command, params.client_name
        )))
    }

    #[tool(description = "Start playback of a library item on a client, optionally from an offset")]
    #[instrument(skip_all)]
    async fn client_start_playback(
        &self,
        Parameters(params): Parameters<ClientStartPlaybackParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "starting playback of item {} on client '{}'",
            params.rating_key, params.client_name
        );
        let title = self
            .connection
            .with_session(|handle| {
                let client_name = params.client_name.clone();
                let rating_key = params.rating_key.clone();
                let offset_ms = params.offset_ms;
                async move {
                    let item = handle.session().metadata(&rating_key).await?;
                    let client = handle.session().client_by_name(&client_name).await?;
                    handle
                        .session()
                        .play_media(
                            &client.machine_identifier,
                            handle.machine_identifier(),
                            &rating_key,
                            offset_ms,
                        )
                        .await?;
                    Ok(item.describe())
                }
            })
            .await
            .map_err(mcp_error)?;

        json_content(&MessageResponse::new(format!(
            "Playing '{title}' on client '{}'",
            params.client_name
        )))
    }

    #[tool(description = "Get server details: version, platform, transcoder state")]
    #[instrument(skip_all)]
    async fn server_get_info(
        &self,
        Parameters(_params): Parameters<ServerInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        let info = self
            .connection
            .with_session(|handle| async move { handle.session().server_info().await })
            .await
            .map_err(mcp_error)?;

        json_content(&info)
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for PlexMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Plex MCP Server - manage a Plex Media Server: browse and refresh libraries, \
                 search media and edit its metadata, manage playlists and collections, inspect \
                 accounts, watch history and active playback sessions, and control connected \
                 clients. Start with library_list or media_search; mutation tools name the \
                 entity they change."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcp_error_codes() {
        let err = mcp_error(Error::NotFound("playlist 'Mix'".into()));
        assert_eq!(err.code, ErrorCode(-32602));

        let err = mcp_error(Error::InvalidInput("bad".into()));
        assert_eq!(err.code, ErrorCode(-32602));

        let err = mcp_error(Error::Connection("refused".into()));
        assert_eq!(err.code, ErrorCode(-32603));

        let err = mcp_error(Error::UpstreamStatus {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(err.code, ErrorCode(-32603));
    }

    #[test]
    fn test_json_content_shape() {
        let result = json_content(&MessageResponse::new("done")).unwrap();
        assert_eq!(result.is_error, Some(false));
    }
}
