//! The `extension.toml` manifest format.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Standard extension manifest file name.
pub const MANIFEST_FILE_NAME: &str = "extension.toml";

/// Default unit directory, relative to the extension folder.
pub const DEFAULT_UNITS_DIR: &str = "units";

/// An extension manifest.
///
/// ```toml
/// name = "core"
/// version = "1.0"
/// description = "Core gameplay hooks"
///
/// [[nested]]
/// name = "core-compat"
/// path = "compat"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionManifest {
    /// Extension name. Must not contain `@`.
    pub name: String,
    /// Extension version. Must not contain `@`.
    pub version: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Directory holding the extension's own units.
    #[serde(default = "default_units_dir")]
    pub units: PathBuf,
    /// Nested units loaded by child loaders.
    #[serde(default)]
    pub nested: Vec<NestedDef>,
}

/// A nested unit declared by a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedDef {
    /// Child loader name.
    pub name: String,
    /// Unit directory, relative to the extension folder.
    pub path: PathBuf,
}

fn default_units_dir() -> PathBuf {
    PathBuf::from(DEFAULT_UNITS_DIR)
}

impl ExtensionManifest {
    /// Check the identity fields can round-trip through a `name@version`
    /// token.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [("name", &self.name), ("version", &self.version)] {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
            if value.contains('@') {
                return Err(format!("{field} must not contain '@': {value}"));
            }
        }
        for nested in &self.nested {
            if nested.name.trim().is_empty() {
                return Err("nested unit name must not be empty".to_string());
            }
            if nested.path.is_absolute() {
                return Err(format!(
                    "nested unit '{}' path must be relative",
                    nested.name
                ));
            }
        }
        Ok(())
    }
}

/// Load and validate a single manifest.
///
/// # Errors
///
/// Returns [`CatalogError::ManifestParseError`] if the file cannot be read,
/// is not valid TOML, or fails validation.
pub fn load_manifest(path: &Path) -> CatalogResult<ExtensionManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::ManifestParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let manifest: ExtensionManifest =
        toml::from_str(&content).map_err(|e| CatalogError::ManifestParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    manifest
        .validate()
        .map_err(|message| CatalogError::ManifestParseError {
            path: path.to_path_buf(),
            message,
        })?;

    Ok(manifest)
}
