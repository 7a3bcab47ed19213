//! # API Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PORT=8080  VENTAS_HOST=127.0.0.1  VENTAS_DB_PATH=/data/ventas.db    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $VENTAS_CONFIG, or ./ventas.toml when present                      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:3000, ./ventas.db, 5 connections                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//!
//! [database]
//! path = "./ventas.db"
//! max_connections = 5
//! ```

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ventas_db::DbConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ventas.toml";

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file path
    pub path: PathBuf,

    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("./ventas.db"),
            max_connections: 5,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("VENTAS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            info!(?path, "Loading config from file");
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            debug!(?path, "Config file not found, using defaults");
            ApiConfig::default()
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (the process environment in [`load`]).
    ///
    /// [`load`]: ApiConfig::load
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("VENTAS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        if let Some(path) = lookup("VENTAS_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = lookup("VENTAS_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("VENTAS_DB_MAX_CONNECTIONS", &max)?;
            if self.database.max_connections == 0 {
                return Err(ConfigError::InvalidValue(
                    "VENTAS_DB_MAX_CONNECTIONS".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database.path, PathBuf::from("./ventas.db"));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_file_then_env() {
        let mut config: ApiConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [database]
            path = "/data/file.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);

        config
            .apply_overrides(lookup(&[("PORT", "9000"), ("VENTAS_HOST", "127.0.0.1")]))
            .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.database.path, PathBuf::from("/data/file.db"));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ApiConfig::default();
        let err = config
            .apply_overrides(lookup(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name) if name == "PORT"));

        let err = config
            .apply_overrides(lookup(&[("VENTAS_DB_MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
