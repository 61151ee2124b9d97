use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::StorageConfig;

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into())
}

/// Initialize tracing with an `EnvFilter` read from `RUST_LOG`, falling back to
/// `default_filter`.
///
/// Returns `false` when a global subscriber was already installed, which makes
/// repeated calls (tests, embedding applications) harmless.
pub fn init_telemetry(default_filter: &str) -> bool {
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );
    let installed = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(console_fmt)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = %default_filter, "Tracing initialized");
    }
    installed
}

/// Like [`init_telemetry`], but emits JSON lines in production so the output
/// can be shipped to a log pipeline as-is.
pub fn init_telemetry_for(config: &StorageConfig, default_filter: &str) -> bool {
    if !config.is_production() {
        return init_telemetry(default_filter);
    }

    let installed = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            filter = %default_filter,
            environment = %config.environment,
            "JSON tracing initialized"
        );
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_telemetry_is_idempotent() {
        init_telemetry("stowage=debug");
        assert!(!init_telemetry("stowage=debug"));
    }

    #[test]
    fn test_init_for_production_config() {
        let config = StorageConfig::from_lookup(|name: &str| match name {
            "ENVIRONMENT" => Some("production".to_string()),
            "STORAGE_BACKEND" => Some("local".to_string()),
            "LOCAL_STORAGE_PATH" => Some("/var/lib/stowage".to_string()),
            "LOCAL_STORAGE_BASE_URL" => Some("https://files.example.com".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(config.is_production());

        init_telemetry_for(&config, "stowage=info");
        assert!(!init_telemetry_for(&config, "stowage=info"));
    }
}
