//! Library section endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::info;

use plex_mcp_core::{Error, MediaType, Result};

use crate::models::{DirectoryContainer, LibrarySection, Metadata, MetadataContainer};
use crate::session::PlexSession;

/// Item counts for one library section.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryStats {
    /// Section title
    pub title: String,
    /// Section type: movie, show, artist, photo
    pub section_type: String,
    /// Items at the section's top level (movies, shows, artists)
    pub item_count: u64,
    /// Top-level items not yet watched
    pub unwatched_count: u64,
    /// Seasons, for show sections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_count: Option<u64>,
    /// Episodes, for show sections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u64>,
}

impl PlexSession {
    /// List all library sections (`GET /library/sections`).
    pub async fn libraries(&self) -> Result<Vec<LibrarySection>> {
        let container: DirectoryContainer = self.get_container("/library/sections", &[]).await?;
        Ok(container.directories)
    }

    /// Find a library section by title, case-insensitively.
    pub async fn section_by_title(&self, title: &str) -> Result<LibrarySection> {
        let sections = self.libraries().await?;
        sections
            .into_iter()
            .find(|s| s.title.eq_ignore_ascii_case(title))
            .ok_or_else(|| Error::NotFound(format!("library '{title}'")))
    }

    /// List every item in a section (`GET /library/sections/{key}/all`).
    pub async fn section_items(&self, key: &str) -> Result<Vec<Metadata>> {
        let container: MetadataContainer = self
            .get_container(&format!("/library/sections/{key}/all"), &[])
            .await?;
        Ok(container.metadata)
    }

    /// Recently added items, newest first, across all sections or scoped to
    /// one (`GET /library/recentlyAdded` /
    /// `GET /library/sections/{key}/recentlyAdded`).
    pub async fn recently_added(
        &self,
        section_key: Option<&str>,
        count: u32,
    ) -> Result<Vec<Metadata>> {
        let path = match section_key {
            Some(key) => format!("/library/sections/{key}/recentlyAdded"),
            None => "/library/recentlyAdded".to_string(),
        };
        let container: MetadataContainer = self
            .get_container(&path, &[("X-Plex-Container-Size", count.to_string())])
            .await?;
        Ok(container.metadata)
    }

    /// Refresh metadata for one section
    /// (`GET /library/sections/{key}/refresh`).
    pub async fn refresh_section(&self, key: &str) -> Result<()> {
        info!(section = key, "refreshing library section");
        self.execute(
            Method::GET,
            &format!("/library/sections/{key}/refresh"),
            &[],
        )
        .await
    }

    /// Refresh metadata for every section
    /// (`GET /library/sections/all/refresh`).
    pub async fn refresh_all(&self) -> Result<()> {
        info!("refreshing all library sections");
        self.execute(Method::GET, "/library/sections/all/refresh", &[])
            .await
    }

    /// Count-based statistics for a section. Uses zero-size container
    /// windows so the server reports totals without shipping the items.
    pub async fn section_stats(&self, section: &LibrarySection) -> Result<LibraryStats> {
        let item_count = self.section_count(&section.key, &[]).await?;
        let unwatched_count = self
            .section_count(&section.key, &[("unwatched", "1".to_string())])
            .await?;

        // Show sections carry their own leaf totals.
        let (season_count, episode_count) = if section.section_type == "show" {
            let seasons = self
                .section_count(
                    &section.key,
                    &[("type", MediaType::Season.code().to_string())],
                )
                .await?;
            let episodes = self
                .section_count(
                    &section.key,
                    &[("type", MediaType::Episode.code().to_string())],
                )
                .await?;
            (Some(seasons), Some(episodes))
        } else {
            (None, None)
        };

        Ok(LibraryStats {
            title: section.title.clone(),
            section_type: section.section_type.clone(),
            item_count,
            unwatched_count,
            season_count,
            episode_count,
        })
    }

    /// Count the items matching `filter` without fetching them
    /// (`GET /library/sections/{key}/all` with an empty container window).
    async fn section_count(&self, key: &str, filter: &[(&str, String)]) -> Result<u64> {
        let mut query: Vec<(&str, String)> = vec![
            ("X-Plex-Container-Start", "0".to_string()),
            ("X-Plex-Container-Size", "0".to_string()),
        ];
        query.extend(filter.iter().map(|(k, v)| (*k, v.clone())));
        let container: MetadataContainer = self
            .get_container(&format!("/library/sections/{key}/all"), &query)
            .await?;
        Ok(container.total_size.or(container.size).unwrap_or(0))
    }

    /// Scan a section for new files, optionally restricted to one path.
    pub async fn scan_section(&self, key: &str, path: Option<&str>) -> Result<()> {
        info!(section = key, ?path, "scanning library section");
        let query: Vec<(&str, String)> = match path {
            Some(p) => vec![("path", p.to_string())],
            None => vec![],
        };
        self.execute(
            Method::GET,
            &format!("/library/sections/{key}/refresh"),
            &query,
        )
        .await
    }
}
