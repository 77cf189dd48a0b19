//! crates/chaekgoeul_core/src/recent.rs
//!
//! The bounded most-recent-first list of search queries.

use serde::{Deserialize, Serialize};

pub const MAX_RECENT_SEARCHES: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentSearches(Vec<String>);

impl RecentSearches {
    /// Parses the persisted JSON array. Corrupt data yields an empty list.
    pub fn from_json(raw: &str) -> Self {
        let mut list: Self = serde_json::from_str(raw).unwrap_or_default();
        list.0.truncate(MAX_RECENT_SEARCHES);
        list
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Moves `query` to the front, dropping any earlier copy and the oldest
    /// entry beyond the cap. Blank queries are ignored.
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.0.retain(|q| q != query);
        self.0.insert(0, query.to_string());
        self.0.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn remove(&mut self, query: &str) {
        self.0.retain(|q| q != query);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
