//! Multi-source aggregation engine.
//!
//! [`Engine::aggregate`] turns a query into ranked, merged titles by fanning
//! out to every configured provider. [`Engine::resolve_links`] runs the
//! fallback cascade for a title the caller picked that has no usable links.
//! The engine keeps no state between calls apart from the result cache;
//! callers own their working set through a [`SearchSession`].

mod cascade;
mod coordinator;
pub mod merge;
pub mod rank;
mod session;
mod types;

pub use cascade::CascadeResolver;
pub use coordinator::FanOutCoordinator;
pub use merge::merge;
pub use rank::{rank_links, rank_titles};
pub use session::SearchSession;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{master_key, CacheValue, ResultCache};
use crate::config::Config;
use crate::metrics;
use crate::model::{Query, Title};
use crate::provider::{
    GuardedProvider, MasterTitle, MasterTitleResolver, Provider, ProviderError, ProviderRegistry,
};

/// Tunables of one engine instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub provider_timeout: Duration,
    pub per_provider_limit: usize,
    pub max_titles: usize,
    pub cache_ttl: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            provider_timeout: config.engine.provider_timeout(),
            per_provider_limit: config.engine.per_provider_limit,
            max_titles: config.engine.max_titles,
            cache_ttl: config.cache.ttl(),
        }
    }
}

/// The aggregation engine.
pub struct Engine {
    options: EngineOptions,
    coordinator: FanOutCoordinator,
    cascade: CascadeResolver,
    master_resolver: Option<Arc<dyn MasterTitleResolver>>,
    cache: Arc<dyn ResultCache>,
}

impl Engine {
    pub fn new(
        options: EngineOptions,
        fan_out: Vec<Arc<dyn Provider>>,
        fallback: Vec<Arc<dyn Provider>>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        let guard = |providers: Vec<Arc<dyn Provider>>| -> Vec<GuardedProvider> {
            providers
                .into_iter()
                .map(|p| GuardedProvider::new(p, options.provider_timeout))
                .collect()
        };

        let coordinator = FanOutCoordinator::new(
            guard(fan_out),
            cache.clone(),
            options.cache_ttl,
            options.per_provider_limit,
        );
        let cascade = CascadeResolver::new(guard(fallback), cache.clone(), options.cache_ttl);

        Self {
            options,
            coordinator,
            cascade,
            master_resolver: None,
            cache,
        }
    }

    /// Build the engine from configuration, selecting providers by name.
    ///
    /// Fails if a fallback provider can only supply metadata.
    pub fn from_config(
        config: &Config,
        registry: &ProviderRegistry,
        cache: Arc<dyn ResultCache>,
    ) -> Result<Self, ProviderError> {
        let fan_out = registry.select(&config.engine.fan_out)?;
        let fallback = registry.select(&config.engine.fallback)?;
        if let Some(p) = fallback
            .iter()
            .find(|p| !p.descriptor().capability.supplies_links())
        {
            return Err(ProviderError::NotConfigured(format!(
                "engine.fallback cannot contain '{}': it supplies no links",
                p.name()
            )));
        }

        let engine = Self::new(EngineOptions::from(config), fan_out, fallback, cache);
        Ok(match registry.master_resolver() {
            Some(resolver) => engine.with_master_resolver(resolver),
            None => engine,
        })
    }

    /// Look up master titles with `resolver` before fanning out.
    pub fn with_master_resolver(mut self, resolver: Arc<dyn MasterTitleResolver>) -> Self {
        self.master_resolver = Some(resolver);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Fan-out providers, in merge order.
    pub fn fan_out_providers(&self) -> &[GuardedProvider] {
        self.coordinator.providers()
    }

    /// Fallback providers, in probe order.
    pub fn fallback_providers(&self) -> &[GuardedProvider] {
        self.cascade.providers()
    }

    pub fn cache(&self) -> &Arc<dyn ResultCache> {
        &self.cache
    }

    /// Search every fan-out provider and return merged, ranked titles.
    ///
    /// Never fails. If every provider comes back empty (or fails) the
    /// outcome is [`SearchOutcome::NoResultsFound`].
    pub async fn aggregate(&self, query: Query) -> AggregateRun {
        let run = RunToken::new();
        self.aggregate_run(query, run).await
    }

    /// [`Engine::aggregate`] under a token the caller already holds, as
    /// issued by [`SearchSession::begin`].
    pub async fn aggregate_run(&self, query: Query, run: RunToken) -> AggregateRun {
        if query.is_empty() {
            metrics::SEARCHES.with_label_values(&["no_results"]).inc();
            return AggregateRun {
                run,
                query,
                outcome: SearchOutcome::NoResultsFound,
                providers: Vec::new(),
            };
        }

        let query = self.with_master_title(query).await;
        let report = self.coordinator.collect(&query, &run).await;

        let mut titles = merge(report.records);
        rank_titles(&mut titles);
        titles.truncate(self.options.max_titles);

        metrics::TITLES_PER_SEARCH
            .with_label_values(&[])
            .observe(titles.len() as f64);

        let failed = report
            .providers
            .iter()
            .filter(|p| matches!(p.outcome, ProviderOutcome::Failed { .. }))
            .count();
        info!(
            run = %run,
            query = %query.text(),
            titles = titles.len(),
            providers = report.providers.len(),
            failed = failed,
            "Aggregation finished"
        );

        let outcome = if titles.is_empty() {
            metrics::SEARCHES.with_label_values(&["no_results"]).inc();
            SearchOutcome::NoResultsFound
        } else {
            metrics::SEARCHES.with_label_values(&["found"]).inc();
            SearchOutcome::Found(titles)
        };

        AggregateRun {
            run,
            query,
            outcome,
            providers: report.providers,
        }
    }

    /// Run the fallback cascade for `title`.
    pub async fn resolve_links(&self, title: Title) -> Resolution {
        self.cascade.resolve(title).await
    }

    /// Fill in the master title if the caller did not supply one.
    ///
    /// Lookup failures and timeouts leave the query as it was.
    async fn with_master_title(&self, query: Query) -> Query {
        if query.master_title().is_some() {
            return query;
        }
        let Some(resolver) = &self.master_resolver else {
            return query;
        };

        let key = master_key(query.text());
        let master = match self.cache.get(&key).await {
            Some(CacheValue::Master(master)) => {
                metrics::CACHE_LOOKUPS
                    .with_label_values(&["master", "hit"])
                    .inc();
                master
            }
            _ => {
                metrics::CACHE_LOOKUPS
                    .with_label_values(&["master", "miss"])
                    .inc();
                match self.lookup_master(resolver.as_ref(), query.text()).await {
                    Ok(master) => {
                        self.cache
                            .set(&key, CacheValue::Master(master.clone()), self.options.cache_ttl)
                            .await;
                        master
                    }
                    Err(e) => {
                        warn!(query = %query.text(), error = %e, "Master title lookup failed");
                        None
                    }
                }
            }
        };

        match master {
            Some(MasterTitle { title, year }) => {
                debug!(query = %query.text(), master = %title, year = ?year, "Master title found");
                query.with_master(Some(title), year)
            }
            None => query,
        }
    }

    async fn lookup_master(
        &self,
        resolver: &dyn MasterTitleResolver,
        text: &str,
    ) -> Result<Option<MasterTitle>, ProviderError> {
        tokio::time::timeout(self.options.provider_timeout, resolver.master_title(text))
            .await
            .unwrap_or(Err(ProviderError::Timeout))
    }
}
