pub mod cache;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod testing;

pub use cache::{spawn_reaper, CacheValue, MemoryCache, ResultCache};
pub use config::{
    load_config, load_config_from_str, validate_config, CacheConfig, Config, ConfigError,
    EngineConfig, ProvidersConfig, SanitizedConfig, ServerConfig,
};
pub use engine::{
    AggregateRun, Engine, EngineOptions, ProviderOutcome, ProviderReport, Resolution,
    ResolveOutcome, RunToken, SearchOutcome, SearchSession,
};
pub use model::{Capability, Link, ProviderDescriptor, Query, RawRecord, Title};
pub use provider::{
    GuardedProvider, MasterTitle, MasterTitleResolver, Provider, ProviderError,
    ProviderErrorKind, ProviderRegistry,
};
