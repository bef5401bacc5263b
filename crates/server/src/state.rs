use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use reelhound_core::{Config, Engine, SanitizedConfig, SearchSession};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: Arc<Engine>,
    /// Working sets keyed by session id.
    sessions: RwLock<HashMap<String, SearchSession>>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &Engine {
        self.engine.as_ref()
    }

    pub fn sessions(&self) -> &RwLock<HashMap<String, SearchSession>> {
        &self.sessions
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many went.
    pub async fn prune_idle_sessions(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        match Utc::now().checked_sub_signed(max_idle) {
            Some(cutoff) => self.prune_sessions_idle_since(cutoff).await,
            None => 0,
        }
    }

    /// Drop sessions whose last activity is not after `cutoff`.
    pub async fn prune_sessions_idle_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.updated_at() > cutoff);
        before - sessions.len()
    }
}

/// Periodically drop sessions idle for longer than `ttl`.
///
/// Checks once per `ttl`, so a session lives between one and two TTLs after
/// its last search or write-back. The task runs until aborted.
pub fn spawn_session_pruner(state: Arc<AppState>, ttl: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ttl);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let pruned = state.prune_idle_sessions(ttl).await;
            if pruned > 0 {
                debug!(pruned = pruned, "Dropped idle sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelhound_core::{EngineOptions, MemoryCache};

    fn state() -> Arc<AppState> {
        let options = EngineOptions {
            provider_timeout: Duration::from_secs(5),
            per_provider_limit: 10,
            max_titles: 25,
            cache_ttl: Duration::from_secs(60),
        };
        let engine = Engine::new(options, Vec::new(), Vec::new(), Arc::new(MemoryCache::new()));
        Arc::new(AppState::new(Config::default(), Arc::new(engine)))
    }

    async fn add_session(state: &AppState, id: &str) {
        let mut sessions = state.sessions().write().await;
        sessions.entry(id.to_string()).or_default().begin();
    }

    #[tokio::test]
    async fn test_prune_drops_only_idle_sessions() {
        let state = state();
        add_session(&state, "old").await;
        let cutoff = Utc::now();
        tokio::time::sleep(Duration::from_millis(5)).await;
        add_session(&state, "recent").await;

        assert_eq!(state.prune_sessions_idle_since(cutoff).await, 1);

        let sessions = state.sessions().read().await;
        assert!(sessions.contains_key("recent"));
        assert!(!sessions.contains_key("old"));
    }

    #[tokio::test]
    async fn test_prune_keeps_active_sessions() {
        let state = state();
        add_session(&state, "a").await;
        add_session(&state, "b").await;

        assert_eq!(state.prune_idle_sessions(Duration::from_secs(3600)).await, 0);
        assert_eq!(state.sessions().read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_pruner_task_drops_idle_sessions() {
        let state = state();
        add_session(&state, "a").await;

        let handle = spawn_session_pruner(state.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(state.sessions().read().await.is_empty());
        handle.abort();
    }
}
