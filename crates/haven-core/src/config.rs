//! Runtime configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Haven runtime configuration.
///
/// Loaded from `config/haven.toml` (optional) with a `HAVEN_`-prefixed
/// environment overlay. Vendor credentials (Anthropic, Twilio) come from
/// their own environment variables and are validated by the adapters at
/// startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HavenConfig {
    /// Redis URL for the fast cache tier
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// SQLite database path for the durable tier
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Cache-tier TTL for session payloads, in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,

    /// Inbound messages longer than this are silently ignored
    #[serde(default = "default_max_inbound_chars")]
    pub max_inbound_chars: usize,

    /// How often the fallback-tier sweep runs, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_database_path() -> String {
    "haven.db".to_string()
}

fn default_session_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_max_inbound_chars() -> usize {
    1600
}

fn default_sweep_interval() -> u64 {
    600
}

impl Default for HavenConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            database_path: default_database_path(),
            session_ttl_seconds: default_session_ttl(),
            max_inbound_chars: default_max_inbound_chars(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl HavenConfig {
    /// Load configuration from file and environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the sources cannot be read or
    /// deserialized.
    pub fn load() -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name("config/haven").required(false))
            .add_source(::config::Environment::with_prefix("HAVEN"))
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HavenConfig::default();
        assert_eq!(config.session_ttl_seconds, 86_400);
        assert_eq!(config.max_inbound_chars, 1600);
        assert!(config.redis_url.starts_with("redis://"));
    }

    #[test]
    fn test_sparse_toml_fills_defaults() {
        let config: HavenConfig =
            toml_from_str(r#"database_path = "/var/lib/haven/haven.db""#);
        assert_eq!(config.database_path, "/var/lib/haven/haven.db");
        assert_eq!(config.sweep_interval_seconds, 600);
    }

    fn toml_from_str(raw: &str) -> HavenConfig {
        ::config::Config::builder()
            .add_source(::config::File::from_str(raw, ::config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }
}
