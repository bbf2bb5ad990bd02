//! Code-unit sources.
//!
//! A source is a key-based store of raw, untransformed code units. The root
//! loader owns one for host symbols and every extension loader owns one for
//! its private units.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::unit::{is_valid_unit_name, unit_path};

/// File extension used by [`DirectorySource`] unless overridden.
pub const DEFAULT_UNIT_EXTENSION: &str = "unit";

/// A key-based store of raw code units.
///
/// `Ok(None)` means the unit is absent from this source. `Err` is reserved
/// for real I/O failures and is never used to signal absence.
pub trait CodeSource: Send + Sync {
    /// Look up the raw bytes of `name`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the store exists but cannot be read.
    fn lookup(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Short human-readable description used in diagnostics.
    fn describe(&self) -> String;
}

/// An in-memory source backed by a `HashMap`.
#[derive(Clone, Default)]
pub struct MemorySource {
    label: String,
    units: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Create an empty source with a diagnostic label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            units: HashMap::new(),
        }
    }

    /// Add a unit (builder style).
    #[must_use]
    pub fn with_unit(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Add or replace a unit.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.units.insert(name.into(), bytes.into());
    }

    /// Number of units held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the source is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl CodeSource for MemorySource {
    fn lookup(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.units.get(name).cloned())
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("label", &self.label)
            .field("unit_count", &self.units.len())
            .finish()
    }
}

/// A source that maps qualified names onto files below a root directory.
///
/// `host.api.Registry` is read from `<root>/host/api/Registry.<ext>`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    /// Create a source rooted at `root` using [`DEFAULT_UNIT_EXTENSION`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_UNIT_EXTENSION.to_string(),
        }
    }

    /// Override the unit file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory of this source.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk path for `name`, or `None` if the name cannot be
    /// mapped safely.
    #[must_use]
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        is_valid_unit_name(name).then(|| self.root.join(unit_path(name, &self.extension)))
    }
}

impl CodeSource for DirectorySource {
    fn lookup(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(path) = self.path_for(name) else {
            debug!(unit = name, "Rejected unmappable unit name");
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_lookup() {
        let source = MemorySource::new("host").with_unit("a.B", b"payload".to_vec());
        assert_eq!(source.lookup("a.B").unwrap(), Some(b"payload".to_vec()));
        assert_eq!(source.lookup("a.C").unwrap(), None);
        assert_eq!(source.describe(), "memory:host");
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_directory_source_reads_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("host").join("api");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("Registry.unit"), b"registry").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(
            source.lookup("host.api.Registry").unwrap(),
            Some(b"registry".to_vec())
        );
        assert_eq!(source.lookup("host.api.Missing").unwrap(), None);
    }

    #[test]
    fn test_directory_source_custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Main.bin"), b"main").unwrap();

        let source = DirectorySource::new(dir.path()).with_extension("bin");
        assert_eq!(source.lookup("Main").unwrap(), Some(b"main".to_vec()));
    }

    #[test]
    fn test_directory_source_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(source.path_for("..secret").is_none());
        assert_eq!(source.lookup("a/../../etc").unwrap(), None);
    }
}
