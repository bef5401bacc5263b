//! Rotation over alternate base URLs of the same upstream.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use super::ProviderError;

/// An ordered set of base URLs for one upstream.
///
/// Attempts start at the last mirror that answered and walk the rest of the
/// list in order, so a dead primary only costs one failed request per call
/// until it recovers.
#[derive(Debug)]
pub struct MirrorList {
    mirrors: Vec<String>,
    preferred: AtomicUsize,
}

impl MirrorList {
    pub fn new(mirrors: Vec<String>) -> Self {
        let mirrors = mirrors
            .into_iter()
            .map(|m| m.trim().trim_end_matches('/').to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            mirrors,
            preferred: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    /// Mirror that will be tried first on the next call.
    pub fn current(&self) -> Option<&str> {
        let idx = self.preferred.load(Ordering::Relaxed);
        self.mirrors.get(idx).map(String::as_str)
    }

    /// Run `attempt` against each mirror until one succeeds.
    ///
    /// Returns the last error if every mirror fails.
    pub async fn fetch<T, F, Fut>(&self, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        if self.mirrors.is_empty() {
            return Err(ProviderError::NotConfigured(
                "no mirrors configured".to_string(),
            ));
        }

        let start = self.preferred.load(Ordering::Relaxed) % self.mirrors.len();
        let mut last_error = None;

        for offset in 0..self.mirrors.len() {
            let idx = (start + offset) % self.mirrors.len();
            let base = &self.mirrors[idx];
            match attempt(base.clone()).await {
                Ok(value) => {
                    if idx != start {
                        debug!(mirror = %base, "Switching preferred mirror");
                    }
                    self.preferred.store(idx, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(e) => {
                    debug!(mirror = %base, error = %e, "Mirror failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ProviderError::Timeout))
    }
}
