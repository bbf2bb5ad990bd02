//! Configuration types.

use std::path::PathBuf;

use lodestar_catalog::{EnablementPolicy, PrototypeList, enabled_tokens};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default extension repository authority.
pub const DEFAULT_REPOSITORY_AUTHORITY: &str = "https://localhost:26676/";

/// The launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LauncherConfig {
    /// Host program to launch.
    pub target_jar: PathBuf,
    /// Whether extension loading is enabled at all.
    pub do_extensions: bool,
    /// Whether patch loading is enabled.
    pub do_patches: bool,
    /// Folder scanned for extensions.
    pub folder_extensions: PathBuf,
    /// Folder scanned for patches.
    pub folder_patches: PathBuf,
    /// Folder for extension data.
    pub folder_data: PathBuf,
    /// Extension enablement.
    pub extensions: ExtensionsSection,
    /// Extension repository base URL.
    #[serde(default = "default_authority")]
    pub extension_repository_authority: String,
    /// Keys not modelled above, preserved across load and save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `extensions` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionsSection {
    /// Enabled prototypes as `name@version` tokens.
    pub enabled: Vec<String>,
    /// Enable every discovered prototype, ignoring `enabled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_by_default: Option<bool>,
    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_authority() -> String {
    DEFAULT_REPOSITORY_AUTHORITY.to_string()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            target_jar: PathBuf::from("./jar/galimulator-desktop.jar"),
            do_extensions: true,
            do_patches: false,
            folder_extensions: PathBuf::from("extensions/"),
            folder_patches: PathBuf::from("patches/"),
            folder_data: PathBuf::from("data/"),
            extensions: ExtensionsSection::default(),
            extension_repository_authority: default_authority(),
            extra: Map::new(),
        }
    }
}

impl LauncherConfig {
    /// The enablement mode selected by this configuration.
    ///
    /// `enable-by-default = true` wins over any persisted list.
    #[must_use]
    pub fn policy(&self) -> EnablementPolicy {
        if self.extensions.enable_by_default == Some(true) {
            EnablementPolicy::EnableAll
        } else {
            EnablementPolicy::Explicit(self.extensions.enabled.clone())
        }
    }

    /// Replace the persisted tokens with the list's enabled prototypes.
    ///
    /// Tokens that no longer match a discovered prototype are dropped.
    pub fn sync_enabled(&mut self, list: &PrototypeList) {
        self.extensions.enabled = enabled_tokens(list);
    }
}
