//! Collection endpoints.

use reqwest::Method;
use tracing::info;

use plex_mcp_core::{Error, Result};

use crate::models::{Metadata, MetadataContainer};
use crate::playlist::items_uri;
use crate::session::PlexSession;

/// `type` code collections carry in the section edit endpoint.
const COLLECTION_TYPE_CODE: u32 = 18;

impl PlexSession {
    /// List the collections of a section
    /// (`GET /library/sections/{key}/collections`).
    pub async fn collections(&self, section_key: &str) -> Result<Vec<Metadata>> {
        let container: MetadataContainer = self
            .get_container(&format!("/library/sections/{section_key}/collections"), &[])
            .await?;
        Ok(container.metadata)
    }

    /// Find a collection by title within a section, case-insensitively.
    pub async fn collection_by_title(&self, section_key: &str, title: &str) -> Result<Metadata> {
        let collections = self.collections(section_key).await?;
        collections
            .into_iter()
            .find(|c| {
                c.title
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(title))
            })
            .ok_or_else(|| Error::NotFound(format!("collection '{title}'")))
    }

    /// List the members of a collection
    /// (`GET /library/collections/{id}/children`).
    pub async fn collection_items(&self, rating_key: &str) -> Result<Vec<Metadata>> {
        let container: MetadataContainer = self
            .get_container(&format!("/library/collections/{rating_key}/children"), &[])
            .await?;
        Ok(container.metadata)
    }

    /// Create a collection from existing items
    /// (`POST /library/collections`).
    pub async fn create_collection(
        &self,
        machine_identifier: &str,
        section_id: u32,
        type_code: u32,
        title: &str,
        rating_keys: &[String],
    ) -> Result<Metadata> {
        if rating_keys.is_empty() {
            return Err(Error::InvalidInput(
                "a collection needs at least one item".to_string(),
            ));
        }

        info!(title, items = rating_keys.len(), "creating collection");
        let query = [
            ("type", type_code.to_string()),
            ("title", title.to_string()),
            ("smart", "0".to_string()),
            ("sectionId", section_id.to_string()),
            ("uri", items_uri(machine_identifier, rating_keys)),
        ];
        let container: MetadataContainer = self
            .get_container_via(Method::POST, "/library/collections", &query)
            .await?;
        container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other("server returned no collection after create".to_string()))
    }

    /// Edit a collection's fields (title, sort title, summary, content
    /// rating). Collections edit through the same section endpoint as
    /// media items, with their own type code.
    pub async fn edit_collection(
        &self,
        rating_key: &str,
        section_id: u32,
        fields: &[(String, String)],
    ) -> Result<()> {
        info!(rating_key, fields = fields.len(), "editing collection");
        self.edit_metadata(rating_key, section_id, COLLECTION_TYPE_CODE, fields)
            .await
    }

    /// Add items to a collection (`PUT /library/collections/{id}/items`).
    pub async fn collection_add_items(
        &self,
        machine_identifier: &str,
        rating_key: &str,
        item_keys: &[String],
    ) -> Result<()> {
        if item_keys.is_empty() {
            return Err(Error::InvalidInput("no items to add".to_string()));
        }
        info!(
            rating_key,
            items = item_keys.len(),
            "adding collection items"
        );
        self.execute(
            Method::PUT,
            &format!("/library/collections/{rating_key}/items"),
            &[("uri", items_uri(machine_identifier, item_keys))],
        )
        .await
    }

    /// Remove one member from a collection
    /// (`DELETE /library/collections/{id}/items/{itemKey}`).
    pub async fn collection_remove_item(&self, rating_key: &str, item_key: &str) -> Result<()> {
        info!(rating_key, item_key, "removing collection item");
        self.execute(
            Method::DELETE,
            &format!("/library/collections/{rating_key}/items/{item_key}"),
            &[],
        )
        .await
    }

    /// Delete a collection (`DELETE /library/collections/{id}`). The
    /// member items themselves are untouched.
    pub async fn delete_collection(&self, rating_key: &str) -> Result<()> {
        info!(rating_key, "deleting collection");
        self.execute(
            Method::DELETE,
            &format!("/library/collections/{rating_key}"),
            &[],
        )
        .await
    }
}
