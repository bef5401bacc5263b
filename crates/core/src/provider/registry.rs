//! Named provider instances built from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::{
    ApibayProvider, ArchiveProvider, JackettProvider, MasterTitleResolver, Provider,
    ProviderError, SearchLinksProvider, TelegramProvider, TmdbProvider, YtsProvider,
};
use crate::config::ProvidersConfig;

/// All configured providers, looked up by name.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    master_resolver: Option<Arc<dyn MasterTitleResolver>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every provider that has a config section.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, ProviderError> {
        let mut registry = Self::new();

        if let Some(cfg) = &config.tmdb {
            let tmdb = Arc::new(TmdbProvider::new(cfg.clone())?);
            registry.set_master_resolver(tmdb.clone());
            registry.register(tmdb);
        }
        if let Some(cfg) = &config.yts {
            registry.register(Arc::new(YtsProvider::new(cfg.clone())?));
        }
        if let Some(cfg) = &config.apibay {
            registry.register(Arc::new(ApibayProvider::new(cfg.clone())?));
        }
        if let Some(cfg) = &config.jackett {
            registry.register(Arc::new(JackettProvider::new(cfg.clone())?));
        }
        if let Some(cfg) = &config.archive {
            registry.register(Arc::new(ArchiveProvider::new(cfg.clone())?));
        }
        if let Some(cfg) = &config.telegram {
            registry.register(Arc::new(TelegramProvider::new(cfg.clone())?));
        }
        if let Some(cfg) = &config.search_links {
            registry.register(Arc::new(SearchLinksProvider::new(cfg.clone())?));
        }

        info!(providers = ?registry.names(), "Providers initialized");
        Ok(registry)
    }

    /// Add a provider, replacing any with the same name.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn set_master_resolver(&mut self, resolver: Arc<dyn MasterTitleResolver>) {
        self.master_resolver = Some(resolver);
    }

    pub fn master_resolver(&self) -> Option<Arc<dyn MasterTitleResolver>> {
        self.master_resolver.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Providers for `names`, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Vec<Arc<dyn Provider>>, ProviderError> {
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    ProviderError::NotConfigured(format!("unknown provider '{}'", name))
                })
            })
            .collect()
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::testing::MockProvider;

    #[test]
    fn test_from_config() {
        let config = load_config_from_str(
            r#"
[providers.tmdb]
api_key = "key"

[providers.yts]

[providers.search_links]
"#,
        )
        .unwrap();

        let registry = ProviderRegistry::from_config(&config.providers).unwrap();
        assert_eq!(registry.names(), vec!["search_links", "tmdb", "yts"]);
        assert!(registry.master_resolver().is_some());
    }

    #[test]
    fn test_invalid_provider_config_fails() {
        let config = load_config_from_str(
            r#"
[providers.tmdb]
api_key = ""
"#,
        )
        .unwrap();

        let result = ProviderRegistry::from_config(&config.providers);
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_select_keeps_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProvider::new("a")));
        registry.register(Arc::new(MockProvider::new("b")));

        let selected = registry
            .select(&["b".to_string(), "a".to_string()])
            .unwrap();
        let names: Vec<_> = selected.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);

        assert!(registry.select(&["c".to_string()]).is_err());
    }
}
