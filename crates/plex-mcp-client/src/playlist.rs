//! Playlist endpoints.

use reqwest::Method;
use tracing::info;

use plex_mcp_core::{Error, Result};

use crate::models::{Metadata, MetadataContainer};
use crate::session::PlexSession;

/// Build the `server://` items URI used by playlist and collection
/// mutation endpoints.
pub(crate) fn items_uri(machine_identifier: &str, rating_keys: &[String]) -> String {
    format!(
        "server://{}/com.plexapp.plugins.library/library/metadata/{}",
        machine_identifier,
        rating_keys.join(",")
    )
}

impl PlexSession {
    /// List playlists (`GET /playlists`), optionally filtered by playlist
    /// type (audio, video, photo).
    pub async fn playlists(&self, playlist_type: Option<&str>) -> Result<Vec<Metadata>> {
        let query: Vec<(&str, String)> = match playlist_type {
            Some(t) => vec![("playlistType", t.to_string())],
            None => vec![],
        };
        let container: MetadataContainer = self.get_container("/playlists", &query).await?;
        Ok(container.metadata)
    }

    /// Find a playlist by title, case-insensitively.
    pub async fn playlist_by_title(&self, title: &str) -> Result<Metadata> {
        let playlists = self.playlists(None).await?;
        playlists
            .into_iter()
            .find(|p| {
                p.title
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(title))
            })
            .ok_or_else(|| Error::NotFound(format!("playlist '{title}'")))
    }

    /// List the items of a playlist (`GET /playlists/{id}/items`).
    pub async fn playlist_items(&self, rating_key: &str) -> Result<Vec<Metadata>> {
        let container: MetadataContainer = self
            .get_container(&format!("/playlists/{rating_key}/items"), &[])
            .await?;
        Ok(container.metadata)
    }

    /// Create a playlist from existing items (`POST /playlists`).
    ///
    /// `machine_identifier` is the server's own identity, required by the
    /// `server://` items URI.
    pub async fn create_playlist(
        &self,
        machine_identifier: &str,
        title: &str,
        playlist_type: &str,
        rating_keys: &[String],
    ) -> Result<Metadata> {
        if rating_keys.is_empty() {
            return Err(Error::InvalidInput(
                "a playlist needs at least one item".to_string(),
            ));
        }

        info!(title, items = rating_keys.len(), "creating playlist");
        let query = [
            ("type", playlist_type.to_string()),
            ("title", title.to_string()),
            ("smart", "0".to_string()),
            ("uri", items_uri(machine_identifier, rating_keys)),
        ];
        let container: MetadataContainer = self
            .get_container_via(Method::POST, "/playlists", &query)
            .await?;
        container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other("server returned no playlist after create".to_string()))
    }

    /// Change a playlist's title or summary (`PUT /playlists/{id}`).
    pub async fn edit_playlist(
        &self,
        rating_key: &str,
        new_title: Option<&str>,
        new_summary: Option<&str>,
    ) -> Result<()> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(title) = new_title {
            query.push(("title", title.to_string()));
        }
        if let Some(summary) = new_summary {
            query.push(("summary", summary.to_string()));
        }
        if query.is_empty() {
            return Err(Error::InvalidInput(
                "no playlist fields to edit".to_string(),
            ));
        }
        info!(rating_key, "editing playlist");
        self.execute(Method::PUT, &format!("/playlists/{rating_key}"), &query)
            .await
    }

    /// Give another server account its own copy of a playlist
    /// (`POST /playlists/{id}/copyTo`).
    pub async fn copy_playlist_to_user(&self, rating_key: &str, account_id: u64) -> Result<()> {
        info!(rating_key, account_id, "copying playlist to account");
        self.execute(
            Method::POST,
            &format!("/playlists/{rating_key}/copyTo"),
            &[("userID", account_id.to_string())],
        )
        .await
    }

    /// Append items to a playlist (`PUT /playlists/{id}/items`).
    pub async fn playlist_add_items(
        &self,
        machine_identifier: &str,
        rating_key: &str,
        item_keys: &[String],
    ) -> Result<()> {
        if item_keys.is_empty() {
            return Err(Error::InvalidInput("no items to add".to_string()));
        }
        info!(rating_key, items = item_keys.len(), "adding playlist items");
        self.execute(
            Method::PUT,
            &format!("/playlists/{rating_key}/items"),
            &[("uri", items_uri(machine_identifier, item_keys))],
        )
        .await
    }

    /// Remove one entry from a playlist
    /// (`DELETE /playlists/{id}/items/{playlistItemID}`).
    pub async fn playlist_remove_item(
        &self,
        rating_key: &str,
        playlist_item_id: u64,
    ) -> Result<()> {
        info!(rating_key, playlist_item_id, "removing playlist item");
        self.execute(
            Method::DELETE,
            &format!("/playlists/{rating_key}/items/{playlist_item_id}"),
            &[],
        )
        .await
    }

    /// Delete a playlist (`DELETE /playlists/{id}`).
    pub async fn delete_playlist(&self, rating_key: &str) -> Result<()> {
        info!(rating_key, "deleting playlist");
        self.execute(Method::DELETE, &format!("/playlists/{rating_key}"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_uri() {
        let uri = items_uri("abc123", &["1".to_string(), "42".to_string()]);
        assert_eq!(
            uri,
            "server://abc123/com.plexapp.plugins.library/library/metadata/1,42"
        );
    }
}
