//! Runtime configuration
//!
//! Settings that influence object identity and diagnostics. Loaded from TOML:
//!
//! ```toml
//! no_duplicate_ids = true
//! uid_prefix = "__"
//! log_deprecation = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration shared by the registries of a runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    /// Reject registration of a second live object under an existing id
    pub no_duplicate_ids: bool,
    /// Prefix of generated object ids
    pub uid_prefix: String,
    /// Emit a warning whenever a deprecated generated accessor is used
    pub log_deprecation: bool,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            no_duplicate_ids: true,
            uid_prefix: "__".to_string(),
            log_deprecation: true,
        }
    }
}

impl BaseConfig {
    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BaseConfig = toml::from_str(text)
            .map_err(|e| Error::configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.uid_prefix.is_empty() {
            return Err(Error::configuration("uid_prefix must not be empty"));
        }
        Ok(())
    }
}
