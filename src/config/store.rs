use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DB_FILE_NAME: &str = "feedvault.db";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
    pub pool: PoolConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

/// Limits for the connection pool shared by the loader and readers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_idle: Option<u32>,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Upper bound on a single import invocation. `None` means no deadline.
    pub timeout_secs: Option<u64>,
}

impl StoreConfig {
    /// Loads configuration from a TOML file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with the database placed inside `data_dir`.
    #[must_use]
    pub fn for_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            database: DatabaseConfig {
                path: data_dir.as_ref().join(DB_FILE_NAME),
                ..DatabaseConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool.max_connections == 0 {
            return Err(Error::Config(
                "pool.max_connections must be at least 1".to_string(),
            ));
        }
        match self.pool.min_idle {
            Some(min_idle) if min_idle > self.pool.max_connections => {
                return Err(Error::Config(format!(
                    "pool.min_idle ({min_idle}) exceeds pool.max_connections ({})",
                    self.pool.max_connections
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data").join(DB_FILE_NAME),
            busy_timeout_ms: 5000,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_secs.map(Duration::from_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 4,
            min_idle: Some(1),
            idle_timeout_secs: Some(300),
            max_lifetime_secs: Some(1800),
        }
    }
}

impl ImportConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
