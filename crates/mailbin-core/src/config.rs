//! Process-wide configuration.
//!
//! Constructed once at startup by the external bootstrap and passed into the
//! pipeline read-only; nothing here mutates after load.

use std::path::Path;

use serde::Deserialize;

use crate::retention::RetentionPolicy;
use crate::route::DomainPolicy;
use crate::{Error, Result};

/// Read-only process configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the external mail transport listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Discard mail for recipient domains not in the allow-list.
    #[serde(default)]
    pub discard_unknown: bool,

    /// Accepted domain patterns: exact (`example.com`) or wildcard suffix
    /// (`*.example.com`). Empty means no domain restriction.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Base URL prepended to attachment download references in records.
    #[serde(default)]
    pub url: String,

    /// Retention policy for stored records.
    #[serde(default)]
    pub retention: RetentionPolicy,
}

impl Config {
    /// Parses configuration from TOML text.
    ///
    /// Domain patterns are lowercased on load so that all later comparisons
    /// against lowercased recipient addresses are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text).map_err(Error::Config)?;
        for domain in &mut config.domains {
            *domain = domain.to_lowercase();
        }
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&text)
    }

    /// Builds the recipient domain policy from this configuration.
    #[must_use]
    pub fn domain_policy(&self) -> DomainPolicy {
        DomainPolicy::new(self.domains.clone(), self.discard_unknown)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            discard_unknown: false,
            domains: Vec::new(),
            url: String::new(),
            retention: RetentionPolicy::default(),
        }
    }
}

const fn default_port() -> u16 {
    25
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml(concat!(
            "port = 2525\n",
            "discard_unknown = true\n",
            "domains = [\"Example.COM\", \"*.mailbin.dev\"]\n",
            "url = \"https://mail.example.com\"\n",
            "\n",
            "[retention]\n",
            "enabled = true\n",
            "delete_older_than_days = 7\n",
        ))
        .unwrap();

        assert_eq!(config.port, 2525);
        assert!(config.discard_unknown);
        assert_eq!(config.domains, vec!["example.com", "*.mailbin.dev"]);
        assert_eq!(config.url, "https://mail.example.com");
        assert!(config.retention.enabled);
        assert_eq!(config.retention.delete_older_than_days, 7);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.port, 25);
        assert!(!config.discard_unknown);
        assert!(config.domains.is_empty());
        assert!(config.retention.max_age().is_none());
    }

    #[test]
    fn test_config_invalid_toml() {
        assert!(Config::from_toml("port = \"not a number\"").is_err());
    }
}
