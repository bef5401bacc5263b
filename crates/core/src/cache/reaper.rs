use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::ResultCache;

/// Periodically purge expired cache entries.
///
/// The task runs until aborted.
pub fn spawn_reaper(cache: Arc<dyn ResultCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired().await;
            if purged > 0 {
                debug!(purged = purged, "Purged expired cache entries");
            }
        }
    })
}
