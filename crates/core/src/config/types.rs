use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::provider::{
    ApibayConfig, ArchiveConfig, JackettConfig, SearchLinksConfig, TelegramConfig, TmdbConfig,
    YtsConfig,
};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions without activity for this long are dropped; 0 keeps them
    /// forever (default: 3600).
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_secs > 0).then(|| Duration::from_secs(self.session_ttl_secs))
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_session_ttl() -> u64 {
    3600
}

/// Aggregation engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Time budget of a single provider call (default: 15).
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
    /// Records requested from each provider per search (default: 10).
    #[serde(default = "default_per_provider_limit")]
    pub per_provider_limit: usize,
    /// Titles kept after ranking (default: 25).
    #[serde(default = "default_max_titles")]
    pub max_titles: usize,
    /// Providers queried in parallel for every search, in merge order.
    #[serde(default)]
    pub fan_out: Vec<String>,
    /// Providers probed one by one for a title with no usable links.
    #[serde(default)]
    pub fallback: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: default_provider_timeout(),
            per_provider_limit: default_per_provider_limit(),
            max_titles: default_max_titles(),
            fan_out: Vec::new(),
            fallback: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

fn default_provider_timeout() -> u64 {
    15
}

fn default_per_provider_limit() -> usize {
    10
}

fn default_max_titles() -> usize {
    25
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Lifetime of a cached provider result (default: 3600).
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// How often expired entries are purged; 0 disables the reaper (default: 300).
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            reaper_interval_secs: default_reaper_interval(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn reaper_interval(&self) -> Option<Duration> {
        (self.reaper_interval_secs > 0).then(|| Duration::from_secs(self.reaper_interval_secs))
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_reaper_interval() -> u64 {
    300
}

/// Per-provider sections. A provider exists only if its section is present.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yts: Option<YtsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apibay: Option<ApibayConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jackett: Option<JackettConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_links: Option<SearchLinksConfig>,
}

impl ProvidersConfig {
    /// Names of the providers with a config section.
    pub fn configured(&self) -> Vec<&'static str> {
        [
            ("tmdb", self.tmdb.is_some()),
            ("yts", self.yts.is_some()),
            ("apibay", self.apibay.is_some()),
            ("jackett", self.jackett.is_some()),
            ("archive", self.archive.is_some()),
            ("telegram", self.telegram.is_some()),
            ("search_links", self.search_links.is_some()),
        ]
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_configured(&self, name: &str) -> bool {
        self.configured().contains(&name)
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub providers: SanitizedProvidersConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<SanitizedTmdbConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yts: Option<YtsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apibay: Option<ApibayConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jackett: Option<SanitizedJackettConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_links: Option<SearchLinksConfig>,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Sanitized Jackett config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJackettConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub indexers: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let providers = &config.providers;
        Self {
            server: config.server.clone(),
            engine: config.engine.clone(),
            cache: config.cache.clone(),
            providers: SanitizedProvidersConfig {
                tmdb: providers.tmdb.as_ref().map(|t| SanitizedTmdbConfig {
                    api_key_configured: !t.api_key.is_empty(),
                    base_url: t.base_url.clone(),
                    language: t.language.clone(),
                }),
                yts: providers.yts.clone(),
                apibay: providers.apibay.clone(),
                jackett: providers.jackett.as_ref().map(|j| SanitizedJackettConfig {
                    url: j.url.clone(),
                    api_key_configured: !j.api_key.is_empty(),
                    indexers: j.indexers.clone(),
                }),
                archive: providers.archive.clone(),
                telegram: providers.telegram.clone(),
                search_links: providers.search_links.clone(),
            },
        }
    }
}
