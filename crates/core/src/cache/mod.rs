//! Short-lived cache of provider results.
//!
//! Entries are keyed per provider and per search term or title, and expire
//! after a fixed TTL. Nothing is persisted.

mod memory;
mod reaper;

pub use memory::MemoryCache;
pub use reaper::spawn_reaper;

use std::time::Duration;

use async_trait::async_trait;

use crate::model::{Link, Query, RawRecord};
use crate::provider::MasterTitle;

/// A cached provider result.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Records returned by a provider search.
    Records(Vec<RawRecord>),
    /// Links returned by a provider resolve.
    Links(Vec<Link>),
    /// Master title lookup; `None` when the metadata source knew no match.
    Master(Option<MasterTitle>),
}

/// Trait for result cache storage.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Value for `key`, or `None` if absent or expired. An expired entry is
    /// evicted by the read that finds it.
    async fn get(&self, key: &str) -> Option<CacheValue>;

    /// Store `value` under `key` for `ttl`. Replaces any existing entry.
    async fn set(&self, key: &str, value: CacheValue, ttl: Duration);

    /// Drop expired entries. Returns how many were removed.
    async fn purge_expired(&self) -> usize;

    /// Number of stored entries, including expired ones not yet read or purged.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Key of a provider's search result for a term.
pub fn search_key(provider: &str, term: &str) -> String {
    format!("search:{}:{}", provider, Query::normalized(term))
}

/// Key of the master title lookup for a query text.
pub fn master_key(text: &str) -> String {
    format!("master:{}", Query::normalized(text))
}

/// Key of a provider's resolve result for a title.
pub fn resolve_key(provider: &str, title_key: &str) -> String {
    format!("resolve:{}:{}", provider, title_key)
}
