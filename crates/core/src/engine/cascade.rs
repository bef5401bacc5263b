//! Sequential fallback probing for titles without usable links.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::merge::dedup_links;
use super::rank::rank_links;
use super::types::{CascadeState, Resolution, ResolveOutcome};
use crate::cache::{resolve_key, CacheValue, ResultCache};
use crate::metrics;
use crate::model::{Link, Title};
use crate::provider::GuardedProvider;

/// Walks the fallback providers one at a time until one supplies links.
pub struct CascadeResolver {
    providers: Vec<GuardedProvider>,
    cache: Arc<dyn ResultCache>,
    ttl: Duration,
}

impl CascadeResolver {
    /// Providers are probed in ascending priority; ties keep the given order.
    /// Providers whose capability supplies no links are left out.
    pub fn new(
        mut providers: Vec<GuardedProvider>,
        cache: Arc<dyn ResultCache>,
        ttl: Duration,
    ) -> Self {
        providers.retain(|p| {
            let supplies_links = p.descriptor().capability.supplies_links();
            if !supplies_links {
                warn!(provider = %p.name(), "Metadata-only provider skipped as fallback");
            }
            supplies_links
        });
        providers.sort_by_key(|p| p.descriptor().priority);
        Self {
            providers,
            cache,
            ttl,
        }
    }

    /// Providers in probe order.
    pub fn providers(&self) -> &[GuardedProvider] {
        &self.providers
    }

    /// Find links for `title` if it has none it can use.
    ///
    /// Every call on a linkless title starts from the first provider, so a
    /// title that was exhausted earlier gets a fresh attempt.
    pub async fn resolve(&self, mut title: Title) -> Resolution {
        if title.has_usable_links() {
            metrics::CASCADE_OUTCOMES
                .with_label_values(&["already_resolved"])
                .inc();
            return Resolution {
                title,
                outcome: ResolveOutcome::AlreadyResolved,
                probed: Vec::new(),
            };
        }

        let key = title.key();
        let record = title.as_record();
        let mut probed = Vec::new();
        let mut state = CascadeState::Idle;

        loop {
            state = match state {
                CascadeState::Idle => CascadeState::Probing(0),
                CascadeState::Probing(i) if i >= self.providers.len() => CascadeState::Exhausted,
                CascadeState::Probing(i) => {
                    let provider = &self.providers[i];
                    probed.push(provider.name().to_string());

                    let links = self.probe(provider, &key, &record).await;
                    if links.is_empty() {
                        debug!(title = %key, provider = %provider.name(), "No links, trying next provider");
                        CascadeState::Probing(i + 1)
                    } else {
                        title.links = links;
                        title.add_provider(provider.name());
                        CascadeState::Resolved
                    }
                }
                CascadeState::Resolved | CascadeState::Exhausted => break,
            };
        }

        metrics::CASCADE_PROBES
            .with_label_values(&[])
            .observe(probed.len() as f64);

        let outcome = match state {
            CascadeState::Resolved => {
                let provider = probed.last().cloned().unwrap_or_default();
                info!(title = %key, provider = %provider, probed = probed.len(), "Title resolved");
                ResolveOutcome::Resolved { provider }
            }
            _ => {
                info!(title = %key, probed = probed.len(), "Fallback providers exhausted");
                ResolveOutcome::Exhausted
            }
        };
        metrics::CASCADE_OUTCOMES
            .with_label_values(&[outcome.as_str()])
            .inc();

        Resolution {
            title,
            outcome,
            probed,
        }
    }

    /// Usable links from one provider, deduplicated and ranked.
    async fn probe(
        &self,
        provider: &GuardedProvider,
        title_key: &str,
        record: &crate::model::RawRecord,
    ) -> Vec<Link> {
        let key = resolve_key(provider.name(), title_key);

        if let Some(CacheValue::Links(links)) = self.cache.get(&key).await {
            metrics::CACHE_LOOKUPS
                .with_label_values(&["resolve", "hit"])
                .inc();
            return links;
        }
        metrics::CACHE_LOOKUPS
            .with_label_values(&["resolve", "miss"])
            .inc();

        let call = provider.resolve(record).await;
        let mut links = dedup_links(call.value.into_iter().filter(Link::is_usable).collect());
        rank_links(&mut links);

        // Empty answers are not cached so a later attempt asks again.
        if !links.is_empty() {
            self.cache
                .set(&key, CacheValue::Links(links.clone()), self.ttl)
                .await;
        }
        links
    }
}
