//! Configuration management for Backchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{BackchatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main configuration structure for Backchat
///
/// This structure holds all configuration needed to serve the
/// chat-history API and to run client sessions against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Pagination limits
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Debounced existence-probe settings
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the API server to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Session token → owner id table
    ///
    /// Stands in for the external SSO provider in development; production
    /// deployments plug a real `SessionProvider` into the server instead.
    #[serde(default)]
    pub sessions: HashMap<String, String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            sessions: HashMap::new(),
        }
    }
}

/// Chat storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    ///
    /// When unset, the platform data directory is used. The
    /// `BACKCHAT_HISTORY_DB` environment variable overrides both.
    #[serde(default)]
    pub path: Option<String>,
}

/// Pagination limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when the caller does not supply a limit
    #[serde(default = "default_page_limit")]
    pub default_limit: usize,

    /// Ceiling for the `limit` query parameter
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_page_limit() -> usize {
    crate::pagination::DEFAULT_PAGE_LIMIT
}

fn default_max_limit() -> usize {
    crate::pagination::MAX_PAGE_LIMIT
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
        }
    }
}

/// Debounced existence-probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Quiet period before a probe fires, in milliseconds
    #[serde(default = "default_probe_quiet_ms")]
    pub quiet_ms: u64,

    /// Timeout budget for the probe itself, in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_probe_quiet_ms() -> u64 {
    300
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            quiet_ms: default_probe_quiet_ms(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments whose overrides are applied last
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::Config` if the file exists but cannot be
    /// read or parsed. A missing file falls back to defaults.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BackchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BackchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(bind) = std::env::var("BACKCHAT_BIND") {
            self.server.bind = bind;
        }

        if let Ok(path) = std::env::var("BACKCHAT_HISTORY_DB") {
            self.storage.path = Some(path);
        }

        if let Ok(max_limit) = std::env::var("BACKCHAT_MAX_PAGE_LIMIT") {
            if let Ok(value) = max_limit.parse() {
                self.pagination.max_limit = value;
            } else {
                tracing::warn!("Invalid BACKCHAT_MAX_PAGE_LIMIT: {}", max_limit);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.is_empty() {
            return Err(BackchatError::Config("bind address cannot be empty".to_string()).into());
        }

        if self.pagination.default_limit == 0 {
            return Err(
                BackchatError::Config("default_limit must be greater than 0".to_string()).into(),
            );
        }

        if self.pagination.max_limit < self.pagination.default_limit {
            return Err(BackchatError::Config(
                "max_limit must be at least default_limit".to_string(),
            )
            .into());
        }

        if self.probe.quiet_ms == 0 {
            return Err(
                BackchatError::Config("probe quiet_ms must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn cli_with_defaults() -> crate::cli::Cli {
        crate::cli::Cli {
            config: None,
            storage_path: None,
            verbose: false,
            command: crate::cli::Commands::Serve { bind: None },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
server:
  bind: "0.0.0.0:9000"
  sessions:
    tok-alice: alice
storage:
  path: /tmp/chats.db
pagination:
  default_limit: 20
  max_limit: 50
probe:
  quiet_ms: 150
  timeout_ms: 1000
"#;
        let config: Config = serde_yaml::from_str(yaml).expect("parse failed");
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.sessions.get("tok-alice").unwrap(), "alice");
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/chats.db"));
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.pagination.max_limit, 50);
        assert_eq!(config.probe.quiet_ms, 150);
    }

    #[test]
    fn test_partial_config_uses_section_defaults() {
        let yaml = "server:\n  bind: \"0.0.0.0:9000\"\n";
        let config: Config = serde_yaml::from_str(yaml).expect("parse failed");
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.probe.timeout_ms, 2_000);
    }

    #[test]
    fn test_validate_rejects_zero_default_limit() {
        let mut config = Config::default();
        config.pagination.default_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_max_below_default() {
        let mut config = Config::default();
        config.pagination.default_limit = 50;
        config.pagination.max_limit = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_quiet_period() {
        let mut config = Config::default();
        config.probe.quiet_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_storage_path_overrides_config() {
        let mut cli = cli_with_defaults();
        cli.storage_path = Some("/tmp/override.db".to_string());

        let mut config = Config::default();
        config.apply_cli_overrides(&cli);

        assert_eq!(config.storage.path.as_deref(), Some("/tmp/override.db"));
    }

    #[test]
    #[serial]
    fn test_env_var_overrides_bind() {
        std::env::set_var("BACKCHAT_BIND", "127.0.0.1:7777");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.server.bind, "127.0.0.1:7777");
        std::env::remove_var("BACKCHAT_BIND");
    }
}
