//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `homewire.toml` in the working directory, or at the path in
//! `HOMEWIRE_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::{Path, PathBuf};

use homewire_domain::error::HomewireError;
use homewire_domain::template::Variables;
use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_PATH: &str = "homewire.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Static variables seeding the global pool.
    pub variables: Variables,
    /// Components to register, in registration order.
    pub components: Vec<ComponentConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One `[[components]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentConfig {
    pub code: String,
    /// Display name; the code when omitted.
    #[serde(default)]
    pub name: Option<String>,
    /// Factory tag (`rule-manager`, `ook-receiver`, …).
    #[serde(rename = "type")]
    pub kind: String,
    /// Factory-specific settings.
    #[serde(default)]
    pub params: toml::Table,
}

impl ComponentConfig {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }

    /// Deserialize `params` into the factory's settings type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Params`] when the table does not fit `T`.
    pub fn params<T: serde::de::DeserializeOwned>(&self) -> Result<T, ConfigError> {
        toml::Value::Table(self.params.clone())
            .try_into()
            .map_err(|source| ConfigError::Params {
                code: self.code.clone(),
                source,
            })
    }
}

impl Config {
    /// Load configuration from `HOMEWIRE_CONFIG` or `homewire.toml` (if
    /// present) then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("HOMEWIRE_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from);
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMEWIRE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homewired=info,homewire=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A component names a type no factory knows.
    #[error("unknown component type {kind:?} for {code:?}")]
    UnknownComponentType { code: String, kind: String },
    /// A component's `params` table is invalid.
    #[error("invalid params for component {code:?}")]
    Params {
        code: String,
        #[source]
        source: toml::de::Error,
    },
    /// A component could not be created.
    #[error("unable to create component {code:?}")]
    Component {
        code: String,
        #[source]
        source: HomewireError,
    },
    /// The component set could not be registered.
    #[error("invalid component set")]
    Registry(#[source] HomewireError),
}
