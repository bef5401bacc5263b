//! Failure boundary around provider calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{tag_links, Provider, ProviderError, ProviderErrorKind};
use crate::metrics;
use crate::model::{Link, ProviderDescriptor, RawRecord};

/// Result of one guarded provider call. Never an error.
#[derive(Debug, Clone)]
pub struct ProviderCall<T> {
    /// What the provider returned, or an empty value on failure.
    pub value: T,
    /// Why the call failed, if it did.
    pub error: Option<ProviderErrorKind>,
    pub elapsed: Duration,
}

impl<T> ProviderCall<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A provider wrapped with a per-call timeout.
///
/// Every error or timeout is logged, counted and converted to an empty
/// result. Records are re-tagged with the provider's name so adapters cannot
/// leak a wrong source tag into the merge.
#[derive(Clone)]
pub struct GuardedProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
}

impl std::fmt::Debug for GuardedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedProvider")
            .field("provider", &self.inner.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GuardedProvider {
    pub fn new(inner: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        self.inner.descriptor()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Search with the timeout applied.
    pub async fn search(&self, term: &str, limit: usize) -> ProviderCall<Vec<RawRecord>> {
        let start = Instant::now();
        let name = self.name().to_string();

        let result = tokio::time::timeout(self.timeout, self.inner.search(term, limit))
            .await
            .unwrap_or(Err(ProviderError::Timeout))
            .map(|mut records| {
                records.truncate(limit);
                for record in &mut records {
                    record.source = name.clone();
                    tag_links(&mut record.links, &name);
                }
                records
            });

        debug!(provider = %name, term = term, "Provider search finished");
        self.finish("search", start, result)
    }

    /// Resolve links for a record with the timeout applied.
    pub async fn resolve(&self, record: &RawRecord) -> ProviderCall<Vec<Link>> {
        let start = Instant::now();
        let name = self.name().to_string();

        let result = tokio::time::timeout(self.timeout, self.inner.resolve(record))
            .await
            .unwrap_or(Err(ProviderError::Timeout))
            .map(|mut links| {
                tag_links(&mut links, &name);
                links
            });

        debug!(provider = %name, title = %record.title, "Provider resolve finished");
        self.finish("resolve", start, result)
    }

    fn finish<T: Default>(
        &self,
        operation: &str,
        start: Instant,
        result: Result<T, ProviderError>,
    ) -> ProviderCall<T> {
        let elapsed = start.elapsed();
        let name = self.name();

        metrics::PROVIDER_DURATION
            .with_label_values(&[name, operation])
            .observe(elapsed.as_secs_f64());

        match result {
            Ok(value) => {
                metrics::PROVIDER_REQUESTS
                    .with_label_values(&[name, operation, "success"])
                    .inc();
                ProviderCall {
                    value,
                    error: None,
                    elapsed,
                }
            }
            Err(e) => {
                let kind = e.kind();
                warn!(
                    provider = %name,
                    operation = operation,
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Provider call failed"
                );
                metrics::PROVIDER_REQUESTS
                    .with_label_values(&[name, operation, kind.as_str()])
                    .inc();
                ProviderCall {
                    value: T::default(),
                    error: Some(kind),
                    elapsed,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;

    #[tokio::test]
    async fn test_guard_passes_results_through() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider
            .set_records(vec![
                RawRecord::new("Heat", "wrong-tag").with_links(vec![Link::new(
                    "1080p",
                    "2 GB",
                    5,
                    "magnet:?xt=urn:btih:heat",
                    "",
                )]),
            ])
            .await;

        let guarded = GuardedProvider::new(provider, Duration::from_secs(1));
        let call = guarded.search("heat", 10).await;

        assert!(call.is_ok());
        assert_eq!(call.value.len(), 1);
        assert_eq!(call.value[0].source, "mock");
        assert_eq!(call.value[0].links[0].source, "mock");
    }

    #[tokio::test]
    async fn test_guard_converts_errors_to_empty() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider
            .set_records(vec![RawRecord::new("Heat", "mock")])
            .await;
        provider
            .set_next_error(ProviderError::Unavailable("HTTP 502".into()))
            .await;

        let guarded = GuardedProvider::new(provider, Duration::from_secs(1));
        let call = guarded.search("heat", 10).await;

        assert!(call.value.is_empty());
        assert_eq!(call.error, Some(ProviderErrorKind::Unavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_times_out_slow_provider() {
        let provider = Arc::new(MockProvider::new("slow"));
        provider.set_delay(Duration::from_secs(30)).await;
        provider
            .set_records(vec![RawRecord::new("Heat", "slow")])
            .await;

        let guarded = GuardedProvider::new(provider, Duration::from_secs(2));
        let call = guarded.search("heat", 10).await;

        assert!(call.value.is_empty());
        assert_eq!(call.error, Some(ProviderErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_guard_truncates_to_limit() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider
            .set_records(vec![
                RawRecord::new("A", "mock"),
                RawRecord::new("B", "mock"),
                RawRecord::new("C", "mock"),
            ])
            .await;

        let guarded = GuardedProvider::new(provider, Duration::from_secs(1));
        let call = guarded.search("x", 2).await;
        assert_eq!(call.value.len(), 2);
    }
}
