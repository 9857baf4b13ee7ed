//! Server account endpoints.

use plex_mcp_core::{Error, Result};

use crate::models::{Account, AccountContainer, HistoryEntry, MetadataContainer};
use crate::session::PlexSession;

impl PlexSession {
    /// List the accounts known to this server (`GET /accounts`).
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        let container: AccountContainer = self.get_container("/accounts", &[]).await?;
        // Account id 0 is the placeholder "all accounts" row.
        Ok(container
            .accounts
            .into_iter()
            .filter(|a| a.id != 0)
            .collect())
    }

    /// Resolve an account by name, case-insensitively.
    ///
    /// Fails with `NotFound` if no account matches - retrying a handshake
    /// will not make the account exist, so this is a domain-class failure.
    pub async fn find_account(&self, name: &str) -> Result<Account> {
        let accounts = self.accounts().await?;
        accounts
            .into_iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::NotFound(format!("account '{name}'")))
    }

    /// Watch history, newest first
    /// (`GET /status/sessions/history/all`), optionally filtered to one
    /// account.
    pub async fn watch_history(
        &self,
        account_id: Option<u64>,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>> {
        let mut query = vec![
            ("sort", "viewedAt:desc".to_string()),
            ("X-Plex-Container-Size", limit.to_string()),
        ];
        if let Some(id) = account_id {
            query.push(("accountID", id.to_string()));
        }
        let container: MetadataContainer = self
            .get_container("/status/sessions/history/all", &query)
            .await?;
        Ok(container.metadata)
    }
}
