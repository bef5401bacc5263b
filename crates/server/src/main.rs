use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelhound_core::{
    load_config, spawn_reaper, validate_config, CacheConfig, Config, Engine, MemoryCache,
    ProviderRegistry, ResultCache,
};

use reelhound_server::api::create_router;
use reelhound_server::state::{spawn_session_pruner, AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "REELHOUND_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<()> {
    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = read_config(&config_path)?;

    let registry =
        ProviderRegistry::from_config(&config.providers).context("Failed to create providers")?;
    let cache: Arc<dyn ResultCache> = Arc::new(MemoryCache::new());
    let engine = Engine::from_config(&config, &registry, Arc::clone(&cache))
        .context("Failed to build engine")?;
    info!(
        fan_out = engine.fan_out_providers().len(),
        fallback = engine.fallback_providers().len(),
        master_lookup = registry.master_resolver().is_some(),
        "Engine ready"
    );

    let reaper = start_reaper(&config.cache, &cache);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let session_ttl = config.server.session_ttl();
    let state = Arc::new(AppState::new(config, Arc::new(engine)));

    let pruner = session_ttl.map(|ttl| {
        info!(ttl_secs = ttl.as_secs(), "Idle session pruning enabled");
        spawn_session_pruner(Arc::clone(&state), ttl)
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down");
    for task in reaper.into_iter().chain(pruner) {
        task.abort();
    }

    Ok(())
}

/// Load and validate the config file, logging a short fingerprint of it.
fn read_config(path: &Path) -> Result<Config> {
    info!("Reading configuration from {:?}", path);
    let config = load_config(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let digest = Sha256::digest(serde_json::to_vec(&config).unwrap_or_default());
    let config_hash = format!("{:x}", digest);
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded"
    );
    Ok(config)
}

fn start_reaper(config: &CacheConfig, cache: &Arc<dyn ResultCache>) -> Option<JoinHandle<()>> {
    match config.reaper_interval() {
        Some(interval) => {
            info!(interval_secs = interval.as_secs(), "Cache reaper started");
            Some(spawn_reaper(Arc::clone(cache), interval))
        }
        None => {
            info!("Cache reaper disabled");
            None
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
