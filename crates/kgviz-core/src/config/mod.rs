//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::domain::graph::{DEFAULT_DOMAIN, normalize_domain};
use crate::domain::import::{ConflictPolicy, ImportStrategy};
use crate::error::Error;
use crate::storage::database::{DEFAULT_MAX_CONNECTIONS, default_database_path};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "KGVIZ_CONFIG_DIR";

/// Environment variable overriding the database path
pub const DATABASE_ENV: &str = "KGVIZ_DATABASE";

/// Kgviz configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub import: ImportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file; `None` means the default location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Defaults applied when an import does not name its own settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub domain: String,
    pub strategy: ImportStrategy,
    pub conflict_resolution: ConflictPolicy,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            strategy: ImportStrategy::default(),
            conflict_resolution: ConflictPolicy::default(),
        }
    }
}

const KEYS: &[&str] = &[
    "database.path",
    "database.max_connections",
    "import.domain",
    "import.strategy",
    "import.conflict_resolution",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("kgviz")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or the defaults if there is none
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(config_error("database.max_connections must be at least 1"));
        }
        Ok(())
    }

    /// Resolve the database file: explicit override, then `KGVIZ_DATABASE`,
    /// then the config file, then the default location
    pub fn database_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| env::var_os(DATABASE_ENV).map(PathBuf::from))
            .or_else(|| self.database.path.clone())
            .unwrap_or_else(default_database_path)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self
                .database
                .path
                .clone()
                .unwrap_or_else(default_database_path)
                .display()
                .to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),

            "import.domain" => Ok(self.import.domain.clone()),
            "import.strategy" => Ok(self.import.strategy.to_string()),
            "import.conflict_resolution" => Ok(self.import.conflict_resolution.to_string()),

            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                let value = value.trim();
                self.database.path = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "database.max_connections" => {
                let max: u32 = value
                    .parse()
                    .map_err(|_| config_error(format!("Invalid max_connections value: {}", value)))?;
                if max == 0 {
                    return Err(config_error("max_connections must be at least 1"));
                }
                self.database.max_connections = max;
            }

            "import.domain" => {
                self.import.domain = normalize_domain(Some(value));
            }
            "import.strategy" => {
                self.import.strategy =
                    ImportStrategy::parse(value).map_err(|e| config_error(e.to_string()))?;
            }
            "import.conflict_resolution" => {
                self.import.conflict_resolution =
                    ConflictPolicy::parse(value).map_err(|e| config_error(e.to_string()))?;
            }

            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> anyhow::Error {
    Error::ConfigError(message.into()).into()
}

fn unknown_key(key: &str) -> anyhow::Error {
    config_error(format!("Unknown configuration key: {}", key))
}
