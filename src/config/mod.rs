//! Configuration management module.
//!
//! Supports loading configuration from:
//! - A `.env` file in the working directory (via `dotenvy`)
//! - TOML files (config/default.toml, config/{profile}.toml)
//! - Environment variables with `IMAGEGEN__<SECTION>__<KEY>` pattern

mod challenge;
mod service;
mod storage;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use challenge::ChallengeConfig;
pub use service::ServiceConfig;
pub use storage::{FileStorageConfig, StorageBackend, StorageConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Remote generation service.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Local challenge bridge.
    #[serde(default)]
    pub challenge: ChallengeConfig,

    /// Durable storage backend.
    #[serde(default)]
    pub storage: StorageConfig,

    /// History paging.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{IMAGEGEN_PROFILE}.toml` (if `IMAGEGEN_PROFILE` is set)
    /// 3. Environment variables with `IMAGEGEN__` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal
        dotenvy::dotenv().ok();

        let profile =
            std::env::var("IMAGEGEN_PROFILE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            // IMAGEGEN__SERVICE__BASE_URL=http://host/api -> service.base_url
            .add_source(
                Environment::with_prefix("IMAGEGEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.parsed_base_url()?;

        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "service.timeout_secs cannot be 0".to_string(),
            ));
        }

        if self.challenge.enabled && self.challenge.port == 0 {
            return Err(ConfigError::Message(
                "challenge.port cannot be 0".to_string(),
            ));
        }

        if self.challenge.enabled && self.challenge.site_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "challenge.site_key is required when the challenge bridge is enabled".to_string(),
            ));
        }

        if self.history.page_size == 0 {
            return Err(ConfigError::Message(
                "history.page_size cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// History paging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Records per history page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// How many of the newest records `recent` shows.
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

const fn default_page_size() -> usize {
    20
}

const fn default_recent_count() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            recent_count: default_recent_count(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Install the Prometheus recorder and serve `/metrics` on the bridge.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.challenge.port, 8787);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.history.page_size, 20);
        assert_eq!(config.history.recent_count, 10);
        assert_eq!(config.service.timeout_secs, 120);
    }

    #[test]
    fn test_validate_requires_site_key_when_bridge_enabled() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.challenge.enabled = true;
        assert!(config.validate().is_err());

        config.challenge.site_key = "0x4AAAAAAA".to_string();
        assert!(config.validate().is_ok());

        config.challenge.site_key.clear();
        config.challenge.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = AppConfig::default();
        config.history.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                r#"
                [service]
                base_url = "https://images.example.com/api"

                [storage]
                backend = "memory"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.service.base_url, "https://images.example.com/api");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.history.page_size, 20);
    }
}
