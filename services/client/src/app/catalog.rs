//! services/client/src/app/catalog.rs
//!
//! Book listings and search, plus the persisted recent-search list.

use chaekgoeul_core::{
    domain::Book,
    ports::{BookApi, KeyValueStore, PortError, PortResult},
    recent::RecentSearches,
};
use std::sync::Arc;
use tracing::warn;

pub const RECENT_SEARCHES_KEY: &str = "recentSearches";

pub struct BookCatalog {
    api: Arc<dyn BookApi>,
    durable: Arc<dyn KeyValueStore>,
}

impl BookCatalog {
    pub fn new(api: Arc<dyn BookApi>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self { api, durable }
    }

    pub async fn popular(&self) -> PortResult<Vec<Book>> {
        self.api.popular_books().await
    }

    pub async fn recent(&self) -> PortResult<Vec<Book>> {
        self.api.recent_books().await
    }

    pub async fn banner(&self) -> PortResult<Book> {
        self.api.banner_book().await
    }

    /// Searches the catalog. A failed search reads as "no results".
    pub async fn search(&self, query: &str) -> PortResult<Vec<Book>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PortError::Validation("search query is empty".to_string()));
        }

        if let Err(e) = self.update_recent(|recent| recent.record(query)).await {
            warn!("Could not record recent search: {}", e);
        }

        match self.api.search_books(query).await {
            Ok(books) => Ok(books),
            Err(e) => {
                warn!(query, "Search failed, showing no results: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn recent_searches(&self) -> PortResult<Vec<String>> {
        Ok(self.load_recent().await?.as_slice().to_vec())
    }

    pub async fn forget_search(&self, query: &str) -> PortResult<()> {
        self.update_recent(|recent| recent.remove(query.trim())).await
    }

    pub async fn clear_recent_searches(&self) -> PortResult<()> {
        self.durable.remove(RECENT_SEARCHES_KEY).await
    }

    async fn load_recent(&self) -> PortResult<RecentSearches> {
        Ok(self
            .durable
            .get(RECENT_SEARCHES_KEY)
            .await?
            .map(|raw| RecentSearches::from_json(&raw))
            .unwrap_or_default())
    }

    async fn update_recent<F>(&self, change: F) -> PortResult<()>
    where
        F: FnOnce(&mut RecentSearches),
    {
        let mut recent = self.load_recent().await?;
        change(&mut recent);
        self.durable.set(RECENT_SEARCHES_KEY, &recent.to_json()).await
    }
}
