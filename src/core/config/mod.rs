//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Options set programmatically on the mapping (not handled here)
//!
//! # Config Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path passed to [`Config::load`]
//! 2. `$MODELGRAPH_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/modelgraph/config.toml`
//! 4. `~/.modelgraph/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use modelgraph::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Root type: {}", config.root_type());
//! if let Some(path) = config.metamodel_path() {
//!     println!("Metamodel: {}", path.display());
//! }
//! ```

pub mod schema;

pub use schema::{AttributeRulesConfig, MappingConfig};

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::labels::{DEFAULT_ROOT_NAMESPACE, DEFAULT_ROOT_TYPE};
use crate::core::types::Value;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "MODELGRAPH_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration.
///
/// Accessors apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: MappingConfig,
    /// Path the configuration was read from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the first location that exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. A missing file is not an error (defaults are used), except
    /// for an explicit path, which must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        match Self::locate() {
            Some(path) => Self::read(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: MappingConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: PathBuf::from("<string>"),
                message: e.to_string(),
            })?;
        file.validate()?;
        Ok(Self { file, path: None })
    }

    /// Find the first existing config file in the search order.
    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("modelgraph/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".modelgraph/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read, parse, and validate a config file.
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: MappingConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed and writes through a temporary
    /// file that is renamed into place.
    pub fn write(path: &Path, config: &MappingConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Path the configuration was loaded from, if it came from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Type of resource-root nodes.
    ///
    /// Defaults to `EObject`.
    pub fn root_type(&self) -> &str {
        self.file.root_type.as_deref().unwrap_or(DEFAULT_ROOT_TYPE)
    }

    /// Namespace URI of the root type.
    ///
    /// Defaults to the Ecore namespace.
    pub fn root_namespace(&self) -> &str {
        self.file
            .root_namespace
            .as_deref()
            .unwrap_or(DEFAULT_ROOT_NAMESPACE)
    }

    /// Metamodel file, resolved against the config file's directory when relative.
    pub fn metamodel_path(&self) -> Option<PathBuf> {
        let metamodel = self.file.metamodel.as_ref()?;
        if metamodel.is_absolute() {
            return Some(metamodel.clone());
        }
        let base = self.path.as_ref().and_then(|p| p.parent());
        Some(match base {
            Some(dir) => dir.join(metamodel),
            None => metamodel.clone(),
        })
    }

    /// Configured read-default rules (empty if none).
    pub fn read_defaults(&self) -> BTreeMap<String, Value> {
        self.file
            .attributes
            .as_ref()
            .and_then(|a| a.read_defaults.clone())
            .unwrap_or_default()
    }

    /// Configured absent-write rules (empty if none).
    pub fn absent_write(&self) -> BTreeMap<String, Value> {
        self.file
            .attributes
            .as_ref()
            .and_then(|a| a.absent_write.clone())
            .unwrap_or_default()
    }
}
