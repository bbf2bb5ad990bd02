//! Filesystem fixtures: extension folders, host units and launcher configs.

use std::path::{Path, PathBuf};

use lodestar_catalog::{DEFAULT_UNITS_DIR, ExtensionManifest, MANIFEST_FILE_NAME, NestedDef};
use lodestar_core::{DEFAULT_UNIT_EXTENSION, unit_path};
use tempfile::TempDir;

/// A manifest with just a name and version.
#[must_use]
pub fn manifest(name: &str, version: &str) -> ExtensionManifest {
    ExtensionManifest {
        name: name.to_string(),
        version: version.to_string(),
        description: None,
        units: PathBuf::from(DEFAULT_UNITS_DIR),
        nested: Vec::new(),
    }
}

/// Write one unit file under `dir` at the path its name maps to.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_unit(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(unit_path(name, DEFAULT_UNIT_EXTENSION));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create unit directory");
    }
    std::fs::write(&path, bytes).expect("Failed to write unit");
    path
}

/// A temporary host layout:
///
/// ```text
/// <tmp>/
///   host/            host units served by the root loader
///   extensions/      one folder per extension
///   launcher.json
/// ```
#[derive(Debug)]
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Create the layout in a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directories cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::create_dir_all(dir.path().join("host")).expect("Failed to create host dir");
        std::fs::create_dir_all(dir.path().join("extensions"))
            .expect("Failed to create extensions dir");
        Self { dir }
    }

    /// Root of the workspace.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory of host units.
    #[must_use]
    pub fn host_dir(&self) -> PathBuf {
        self.dir.path().join("host")
    }

    /// Directory scanned for extensions.
    #[must_use]
    pub fn extensions_dir(&self) -> PathBuf {
        self.dir.path().join("extensions")
    }

    /// Path of the launcher configuration.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("launcher.json")
    }

    /// Write a host unit.
    pub fn host_unit(&self, name: &str, bytes: &[u8]) -> PathBuf {
        write_unit(&self.host_dir(), name, bytes)
    }

    /// Start building an extension folder named `<name>-<version>`.
    #[must_use]
    pub fn extension(&self, name: &str, version: &str) -> ExtensionFixture {
        ExtensionFixture::new(
            self.extensions_dir().join(format!("{name}-{version}")),
            manifest(name, version),
        )
    }

    /// Write a launcher configuration pointing at this workspace.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_config(&self, enabled: &[&str]) -> PathBuf {
        let config = serde_json::json!({
            "target-jar": self.dir.path().join("host.jar"),
            "do-extensions": true,
            "do-patches": false,
            "folder-extensions": self.extensions_dir(),
            "folder-patches": self.dir.path().join("patches"),
            "folder-data": self.dir.path().join("data"),
            "extensions": { "enabled": enabled },
        });
        let path = self.config_path();
        std::fs::write(
            &path,
            serde_json::to_string_pretty(&config).expect("Failed to serialize config"),
        )
        .expect("Failed to write config");
        path
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one extension folder.
#[derive(Debug)]
pub struct ExtensionFixture {
    dir: PathBuf,
    manifest: ExtensionManifest,
    units: Vec<(PathBuf, String, Vec<u8>)>,
}

impl ExtensionFixture {
    /// Build an extension at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, manifest: ExtensionManifest) -> Self {
        Self {
            dir: dir.into(),
            manifest,
            units: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.manifest.description = Some(description.to_string());
        self
    }

    /// Add a unit to the extension's own storage.
    #[must_use]
    pub fn unit(mut self, name: &str, bytes: &[u8]) -> Self {
        let units = self.manifest.units.clone();
        self.units.push((units, name.to_string(), bytes.to_vec()));
        self
    }

    /// Declare a nested unit directory, served by a child loader.
    #[must_use]
    pub fn nested(mut self, name: &str, path: &str) -> Self {
        self.manifest.nested.push(NestedDef {
            name: name.to_string(),
            path: PathBuf::from(path),
        });
        self
    }

    /// Add a unit under a nested directory.
    #[must_use]
    pub fn nested_unit(mut self, path: &str, name: &str, bytes: &[u8]) -> Self {
        self.units
            .push((PathBuf::from(path), name.to_string(), bytes.to_vec()));
        self
    }

    /// Write the manifest and units. Returns the extension folder.
    ///
    /// # Panics
    ///
    /// Panics if any file cannot be written.
    pub fn write(self) -> PathBuf {
        std::fs::create_dir_all(self.dir.join(&self.manifest.units))
            .expect("Failed to create units dir");
        let body = toml::to_string(&self.manifest).expect("Failed to serialize manifest");
        std::fs::write(self.dir.join(MANIFEST_FILE_NAME), body).expect("Failed to write manifest");
        for (subdir, name, bytes) in &self.units {
            write_unit(&self.dir.join(subdir), name, bytes);
        }
        self.dir
    }
}
