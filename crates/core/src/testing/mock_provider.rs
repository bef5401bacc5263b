//! Mock provider for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::model::{Capability, Link, ProviderDescriptor, RawRecord};
use crate::provider::{Provider, ProviderError};

/// Mock implementation of the Provider trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable records and links
/// - Track searched terms and resolved titles for assertions
/// - Simulate failures and delays
///
/// # Example
///
/// ```rust,ignore
/// use reelhound_core::testing::{MockProvider, fixtures};
///
/// let provider = MockProvider::new("yts");
/// provider.set_records(fixtures::inception_records()).await;
///
/// let records = provider.search("inception", 10).await?;
/// assert_eq!(provider.searched_terms().await, vec!["inception"]);
/// ```
pub struct MockProvider {
    descriptor: ProviderDescriptor,
    /// Records returned by `search`.
    records: Arc<RwLock<Vec<RawRecord>>>,
    /// Links returned by `resolve`.
    links: Arc<RwLock<Vec<Link>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
    /// If true, every call fails.
    always_fail: Arc<RwLock<bool>>,
    /// Delay applied before answering.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Recorded search terms.
    searches: Arc<RwLock<Vec<String>>>,
    /// Recorded resolved titles.
    resolves: Arc<RwLock<Vec<String>>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("descriptor", &self.descriptor)
            .field("records", &"<records>")
            .field("links", &"<links>")
            .finish()
    }
}

impl MockProvider {
    /// Create a mock provider that returns nothing.
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(name, 0, Capability::Both),
            records: Arc::new(RwLock::new(Vec::new())),
            links: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            always_fail: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(None)),
            searches: Arc::new(RwLock::new(Vec::new())),
            resolves: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.descriptor.priority = priority;
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.descriptor.capability = capability;
        self
    }

    pub fn with_master_title(mut self, prefers: bool) -> Self {
        self.descriptor.prefers_master_title = prefers;
        self
    }

    /// Set the records to return for subsequent searches.
    pub async fn set_records(&self, records: Vec<RawRecord>) {
        *self.records.write().await = records;
    }

    /// Set the links to return for subsequent resolves.
    pub async fn set_links(&self, links: Vec<Link>) {
        *self.links.write().await = links;
    }

    /// Make the next call fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every call fail until switched off.
    pub async fn set_always_fail(&self, fail: bool) {
        *self.always_fail.write().await = fail;
    }

    /// Delay every answer by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Terms passed to `search`, in call order.
    pub async fn searched_terms(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Titles passed to `resolve`, in call order.
    pub async fn resolved_titles(&self) -> Vec<String> {
        self.resolves.read().await.clone()
    }

    pub async fn resolve_count(&self) -> usize {
        self.resolves.read().await.len()
    }

    async fn simulate(&self) -> Result<(), ProviderError> {
        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if *self.always_fail.read().await {
            return Err(ProviderError::Unavailable("mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        self.searches.write().await.push(term.to_string());
        self.simulate().await?;

        let records = self.records.read().await;
        Ok(records
            .iter()
            .take(limit)
            .cloned()
            .map(|mut r| {
                r.source = self.descriptor.name.clone();
                r
            })
            .collect())
    }

    async fn resolve(&self, record: &RawRecord) -> Result<Vec<Link>, ProviderError> {
        self.resolves.write().await.push(record.title.clone());
        self.simulate().await?;
        Ok(self.links.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_records_calls() {
        let provider = MockProvider::new("mock");
        provider
            .set_records(vec![RawRecord::new("Heat", "other")])
            .await;

        let records = provider.search("heat", 5).await.unwrap();
        assert_eq!(records[0].source, "mock");
        assert_eq!(provider.searched_terms().await, vec!["heat"]);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let provider = MockProvider::new("mock");
        provider.set_next_error(ProviderError::Timeout).await;

        assert!(provider.search("a", 5).await.is_err());
        assert!(provider.search("a", 5).await.is_ok());
    }

    #[tokio::test]
    async fn test_always_fail() {
        let provider = MockProvider::new("mock");
        provider.set_always_fail(true).await;
        let record = RawRecord::new("Heat", "x");

        assert!(provider.resolve(&record).await.is_err());
        assert!(provider.resolve(&record).await.is_err());
        assert_eq!(provider.resolved_titles().await, vec!["Heat", "Heat"]);
    }
}
