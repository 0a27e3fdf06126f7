//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! root_type = "EObject"
//! root_namespace = "http://www.eclipse.org/emf/2002/Ecore"
//! metamodel = "/path/to/java.toml"
//!
//! [attributes.read_defaults]
//! visibility = "none"
//! inheritance = "none"
//! proxy = "false"
//!
//! [attributes.absent_write]
//! isAbstract = false
//! ```
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., `root_type` must be a
//! valid type name and `root_namespace` cannot be empty).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{validate_type_name, Value};

/// Mapping configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// Type of resource-root nodes
    pub root_type: Option<String>,

    /// Namespace URI of the root type
    pub root_namespace: Option<String>,

    /// Path to a TOML metamodel description
    pub metamodel: Option<PathBuf>,

    /// Attribute default-value rules
    pub attributes: Option<AttributeRulesConfig>,
}

impl MappingConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root_type) = &self.root_type {
            validate_type_name(root_type).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid root_type: {}", e))
            })?;
        }

        if let Some(ns) = &self.root_namespace {
            if ns.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "root_namespace cannot be empty".to_string(),
                ));
            }
        }

        if let Some(attributes) = &self.attributes {
            attributes.validate()?;
        }

        Ok(())
    }
}

/// Attribute default rules, by feature name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeRulesConfig {
    /// Values reported for unset attributes when a metamodel is configured
    pub read_defaults: Option<BTreeMap<String, Value>>,

    /// Values stored when an attribute is written without a value
    pub absent_write: Option<BTreeMap<String, Value>>,
}

impl AttributeRulesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let tables = [&self.read_defaults, &self.absent_write];
        for table in tables.into_iter().flatten() {
            if table.keys().any(|k| k.is_empty()) {
                return Err(ConfigError::InvalidValue(
                    "attribute rule names cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
