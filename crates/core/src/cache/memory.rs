use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheValue, ResultCache};

#[derive(Debug)]
struct Entry {
    value: CacheValue,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache backed by a `HashMap`.
///
/// Expired entries are never returned. A read that finds one removes it;
/// entries nobody reads again are left to the reaper. Concurrent writers to
/// the same key are last-writer-wins.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<CacheValue> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(e) if !e.is_expired(Instant::now()) => return Some(e.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict, unless a writer refreshed the key in between.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|e| e.is_expired(Instant::now()))
        {
            entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
