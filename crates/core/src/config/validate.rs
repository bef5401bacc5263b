use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Provider timeout and cache TTL are positive
/// - Every fan-out/fallback name has a provider section
///
/// Whether a fallback provider can supply links depends on the built
/// provider, so that check happens in `Engine::from_config`.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.engine.provider_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.provider_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs must be greater than 0".to_string(),
        ));
    }

    for (list, names) in [
        ("engine.fan_out", &config.engine.fan_out),
        ("engine.fallback", &config.engine.fallback),
    ] {
        if let Some(missing) = names
            .iter()
            .find(|n| !config.providers.is_configured(n))
        {
            return Err(ConfigError::ValidationError(format!(
                "{} names '{}' but [providers.{}] is not configured",
                list, missing, missing
            )));
        }
    }

    Ok(())
}
