//! Lowering configuration
//!
//! Options are read from the `[lowering]` table of a TOML file. Every key is
//! optional.
//!
//! ```toml
//! [lowering]
//! core_library = "dart:core"
//! temporary_prefix = "tmp"
//! verify = true
//! check_idempotence = false
//!
//! [lowering.sdk_imports]
//! "dart.typeddata" = "dart:typed_data"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Options controlling the lowering pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringOptions {
    /// Library whose names clash with source declarations
    pub core_library: String,

    /// Source package to target SDK library, for import-alias annotations naming
    /// a source package
    pub sdk_imports: BTreeMap<String, String>,

    /// Prefix of subject temporaries (`tmp0_subject`, ...)
    pub temporary_prefix: String,

    /// Validate input before lowering and check for dangling symbols after
    pub verify: bool,

    /// Lower a second time and fail if anything changes
    pub check_idempotence: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        let mut sdk_imports = BTreeMap::new();
        sdk_imports.insert("dart.typeddata".to_string(), "dart:typed_data".to_string());
        Self {
            core_library: "dart:core".to_string(),
            sdk_imports,
            temporary_prefix: "tmp".to_string(),
            verify: true,
            check_idempotence: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    lowering: LoweringOptions,
}

impl LoweringOptions {
    /// Parse options from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.lowering.validate()?;
        Ok(file.lowering)
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check that the options are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_library.is_empty() {
            return Err(ConfigError::ValidationError("core_library must not be empty".to_string()));
        }
        let valid_prefix = self
            .temporary_prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && self
                .temporary_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_prefix {
            return Err(ConfigError::ValidationError(format!(
                "temporary_prefix '{}' is not an identifier",
                self.temporary_prefix
            )));
        }
        Ok(())
    }

    /// Target library for an import annotation, mapping source packages to SDK
    /// libraries
    pub fn resolve_library<'a>(&'a self, library: &'a str) -> &'a str {
        self.sdk_imports
            .get(library)
            .map(String::as_str)
            .unwrap_or(library)
    }
}
