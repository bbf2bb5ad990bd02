//! Backing stores that enumerate extension candidates.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::manifest::{ExtensionManifest, MANIFEST_FILE_NAME, load_manifest};

/// Key the catalog caches prototype lists under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreLocation {
    /// A directory on disk.
    Directory(PathBuf),
    /// An in-memory store, keyed by label.
    Memory(String),
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "dir:{}", path.display()),
            Self::Memory(label) => write!(f, "memory:{label}"),
        }
    }
}

/// One candidate found by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredExtension {
    /// The parsed manifest.
    pub manifest: ExtensionManifest,
    /// Folder the manifest was found in.
    pub location: PathBuf,
}

/// Something that can enumerate extension candidates.
pub trait PrototypeStore: Send + Sync {
    /// Stable key for caching.
    fn location(&self) -> StoreLocation;

    /// Enumerate candidates in discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store as a whole is unreadable; bad
    /// individual entries are skipped.
    fn enumerate(&self) -> CatalogResult<Vec<DiscoveredExtension>>;
}

/// A directory whose subdirectories each hold an `extension.toml`.
///
/// Subdirectories are visited in file-name order so discovery order is
/// stable across platforms.
#[derive(Debug, Clone)]
pub struct ManifestDirStore {
    dir: PathBuf,
}

impl ManifestDirStore {
    /// Create a store over `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The scanned directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PrototypeStore for ManifestDirStore {
    fn location(&self) -> StoreLocation {
        StoreLocation::Directory(self.dir.clone())
    }

    fn enumerate(&self) -> CatalogResult<Vec<DiscoveredExtension>> {
        let read_err = |source| CatalogError::ReadError {
            path: self.dir.clone(),
            source,
        };

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        let mut found = Vec::new();
        for dir in dirs {
            let manifest_path = dir.join(MANIFEST_FILE_NAME);
            if !manifest_path.is_file() {
                debug!(path = %dir.display(), "Skipping directory without manifest");
                continue;
            }
            match load_manifest(&manifest_path) {
                Ok(manifest) => {
                    debug!(
                        path = %manifest_path.display(),
                        extension = %manifest.name,
                        version = %manifest.version,
                        "Loaded extension manifest"
                    );
                    found.push(DiscoveredExtension {
                        manifest,
                        location: dir,
                    });
                },
                Err(e) => {
                    warn!(
                        path = %manifest_path.display(),
                        error = %e,
                        "Failed to load extension manifest"
                    );
                },
            }
        }
        Ok(found)
    }
}

/// An in-memory store for hosts that assemble extensions programmatically.
#[derive(Debug)]
pub struct MemoryStore {
    label: String,
    entries: Mutex<Vec<DiscoveredExtension>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Add a candidate, builder style.
    #[must_use]
    pub fn with(self, manifest: ExtensionManifest, location: impl Into<PathBuf>) -> Self {
        self.push(manifest, location);
        self
    }

    /// Add a candidate.
    pub fn push(&self, manifest: ExtensionManifest, location: impl Into<PathBuf>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DiscoveredExtension {
                manifest,
                location: location.into(),
            });
    }
}

impl PrototypeStore for MemoryStore {
    fn location(&self) -> StoreLocation {
        StoreLocation::Memory(self.label.clone())
    }

    fn enumerate(&self) -> CatalogResult<Vec<DiscoveredExtension>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
