//! Media item endpoints: search, metadata, editing, deletion.

use reqwest::Method;
use tracing::info;

use plex_mcp_core::{Error, MediaType, Result};

use crate::models::{Metadata, MetadataContainer};
use crate::session::PlexSession;

impl PlexSession {
    /// Search the whole server (`GET /search`), optionally filtered to one
    /// media type.
    pub async fn search(
        &self,
        query: &str,
        media_type: Option<MediaType>,
    ) -> Result<Vec<Metadata>> {
        let mut params = vec![("query", query.to_string())];
        if let Some(t) = media_type {
            params.push(("type", t.code().to_string()));
        }
        let container: MetadataContainer = self.get_container("/search", &params).await?;
        Ok(container.metadata)
    }

    /// Fetch full metadata for one item (`GET /library/metadata/{id}`).
    pub async fn metadata(&self, rating_key: &str) -> Result<Metadata> {
        let container: MetadataContainer = self
            .get_container(&format!("/library/metadata/{rating_key}"), &[])
            .await?;
        container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("media item {rating_key}")))
    }

    /// Edit metadata fields on an item.
    ///
    /// Plex applies edits through the owning section:
    /// `PUT /library/sections/{sec}/all?type={code}&id={key}&{field}.value=...`.
    /// Each edited field is also locked so the next agent refresh does not
    /// clobber it.
    pub async fn edit_metadata(
        &self,
        rating_key: &str,
        section_id: u32,
        type_code: u32,
        fields: &[(String, String)],
    ) -> Result<()> {
        if fields.is_empty() {
            return Err(Error::InvalidInput(
                "no metadata fields to edit".to_string(),
            ));
        }

        let mut params: Vec<(String, String)> = vec![
            ("type".to_string(), type_code.to_string()),
            ("id".to_string(), rating_key.to_string()),
        ];
        for (field, value) in fields {
            params.push((format!("{field}.value"), value.clone()));
            params.push((format!("{field}.locked"), "1".to_string()));
        }

        info!(
            rating_key,
            fields = fields.len(),
            "editing media metadata"
        );
        let borrowed: Vec<(&str, String)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        self.execute(
            Method::PUT,
            &format!("/library/sections/{section_id}/all"),
            &borrowed,
        )
        .await
    }

    /// Permanently delete an item and its files
    /// (`DELETE /library/metadata/{id}`).
    pub async fn delete_media(&self, rating_key: &str) -> Result<()> {
        info!(rating_key, "deleting media item");
        self.execute(
            Method::DELETE,
            &format!("/library/metadata/{rating_key}"),
            &[],
        )
        .await
    }
}
