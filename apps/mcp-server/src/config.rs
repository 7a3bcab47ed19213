//! Tool server configuration.
//!
//! Same sources as the API server: environment, then `$VENTAS_CONFIG` or
//! `./ventas.toml`, then defaults. Only the `[database]` table is read.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;
use ventas_db::DbConfig;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct McpConfig {
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
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

impl McpConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("VENTAS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ventas.toml"));

        let mut config = if path.exists() {
            debug!(?path, "Loading config from file");
            toml::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            McpConfig::default()
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("VENTAS_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("VENTAS_DB_MAX_CONNECTIONS") {
            self.database.max_connections = raw
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("VENTAS_DB_MAX_CONNECTIONS".to_string()))?;
        }
        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}

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

    #[test]
    fn test_server_table_is_ignored() {
        let config: McpConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [database]
            path = "/srv/ventas.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/srv/ventas.db"));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let mut config = McpConfig::default();
        config
            .apply_overrides(|key| (key == "VENTAS_DB_PATH").then(|| "/tmp/x.db".to_string()))
            .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));

        let err = config
            .apply_overrides(|key| {
                (key == "VENTAS_DB_MAX_CONNECTIONS").then(|| "zero".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
