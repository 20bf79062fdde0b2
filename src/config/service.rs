//! Generation service configuration.

use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use url::Url;

/// Remote generation service endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL the endpoint paths are joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds. Generation is slow; keep this generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Privilege key overriding the one kept in durable storage.
    #[serde(default)]
    pub privilege_key: Option<String>,
}

impl ServiceConfig {
    /// Parse the base URL, normalized to end with `/` so relative joins keep
    /// its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot carry a path.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::Message(format!("service.base_url is invalid: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::Message(
                "service.base_url must be a hierarchical URL".to_string(),
            ));
        }
        Ok(url)
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api/".to_string()
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            privilege_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ServiceConfig {
            base_url: "http://example.com/api".to_string(),
            ..Default::default()
        };
        let url = config.parsed_base_url().unwrap();
        assert_eq!(url.as_str(), "http://example.com/api/");
        assert_eq!(
            url.join("generate").unwrap().as_str(),
            "http://example.com/api/generate"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ServiceConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.parsed_base_url().is_err());

        let config = ServiceConfig {
            base_url: "mailto:someone@example.com".to_string(),
            ..Default::default()
        };
        assert!(config.parsed_base_url().is_err());
    }
}
