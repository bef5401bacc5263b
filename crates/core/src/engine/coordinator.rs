//! Parallel fan-out of one query to every fan-out provider.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::types::{FanOutReport, ProviderOutcome, ProviderReport, RunToken};
use crate::cache::{search_key, CacheValue, ResultCache};
use crate::metrics;
use crate::model::{Query, RawRecord};
use crate::provider::GuardedProvider;

/// Queries every fan-out provider concurrently, consulting the cache first.
pub struct FanOutCoordinator {
    providers: Vec<GuardedProvider>,
    cache: Arc<dyn ResultCache>,
    ttl: Duration,
    limit: usize,
}

impl FanOutCoordinator {
    pub fn new(
        providers: Vec<GuardedProvider>,
        cache: Arc<dyn ResultCache>,
        ttl: Duration,
        limit: usize,
    ) -> Self {
        Self {
            providers,
            cache,
            ttl,
            limit,
        }
    }

    pub fn providers(&self) -> &[GuardedProvider] {
        &self.providers
    }

    /// Collect records for `query` from all providers.
    ///
    /// Never fails: a provider that errors or times out contributes nothing.
    /// Records are returned grouped by provider in configuration order,
    /// regardless of which provider answered first.
    pub async fn collect(&self, query: &Query, run: &RunToken) -> FanOutReport {
        let calls = self
            .providers
            .iter()
            .map(|provider| self.collect_one(provider, query, run));

        let results = futures::future::join_all(calls).await;

        let mut report = FanOutReport::default();
        for (mut records, provider_report) in results {
            report.records.append(&mut records);
            report.providers.push(provider_report);
        }
        report
    }

    async fn collect_one(
        &self,
        provider: &GuardedProvider,
        query: &Query,
        run: &RunToken,
    ) -> (Vec<RawRecord>, ProviderReport) {
        let name = provider.name();
        let term = query.term_for(provider.descriptor());
        let key = search_key(name, &term);
        let start = Instant::now();

        if let Some(CacheValue::Records(records)) = self.cache.get(&key).await {
            metrics::CACHE_LOOKUPS
                .with_label_values(&["search", "hit"])
                .inc();
            debug!(run = %run, provider = %name, term = %term, "Search served from cache");
            let outcome = ProviderOutcome::Cached {
                records: records.len(),
            };
            return (
                records,
                ProviderReport::new(name, &term, outcome, start.elapsed()),
            );
        }
        metrics::CACHE_LOOKUPS
            .with_label_values(&["search", "miss"])
            .inc();

        let call = provider.search(&term, self.limit).await;
        let outcome = match call.error {
            None => {
                self.cache
                    .set(&key, CacheValue::Records(call.value.clone()), self.ttl)
                    .await;
                ProviderOutcome::Fresh {
                    records: call.value.len(),
                }
            }
            Some(error) => ProviderOutcome::Failed { error },
        };

        debug!(run = %run, provider = %name, term = %term, outcome = ?outcome, "Provider searched");
        (
            call.value,
            ProviderReport::new(name, &term, outcome, call.elapsed),
        )
    }
}
