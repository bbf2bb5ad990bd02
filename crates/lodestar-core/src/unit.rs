//! Code unit identity and payload.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// One independently named, loadable block of code.
///
/// The payload is shared behind an `Arc<[u8]>` so cloning a unit never
/// copies bytes. A unit is immutable once constructed: loaders hand out
/// `Arc<CodeUnit>` and there is no API to mutate it afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeUnit {
    name: String,
    bytes: Arc<[u8]>,
    defined_by: String,
}

impl CodeUnit {
    /// Create a unit defined by the loader named `defined_by`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        defined_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            defined_by: defined_by.into(),
        }
    }

    /// Fully qualified name, e.g. `host.api.Registry`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The (transformed) payload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Name of the loader that defined this unit.
    #[must_use]
    pub fn defined_by(&self) -> &str {
        &self.defined_by
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for CodeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeUnit")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("defined_by", &self.defined_by)
            .finish()
    }
}

/// Check that a qualified name can be mapped onto a relative path.
///
/// Names are dot-separated segments. Empty segments and path separators are
/// rejected so a name can never escape the root of a directory source.
#[must_use]
pub fn is_valid_unit_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|segment| !segment.is_empty() && !segment.contains(['/', '\\']))
}

/// Map a qualified name to a relative path: `a.b.C` becomes `a/b/C.<ext>`.
///
/// The caller is expected to have checked [`is_valid_unit_name`].
#[must_use]
pub fn unit_path(name: &str, extension: &str) -> PathBuf {
    let mut path: PathBuf = name.split('.').collect();
    if !extension.is_empty() {
        path.set_extension(extension);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_accessors() {
        let unit = CodeUnit::new("host.api.Registry", b"abc".to_vec(), "root");
        assert_eq!(unit.name(), "host.api.Registry");
        assert_eq!(unit.bytes(), b"abc");
        assert_eq!(unit.defined_by(), "root");
        assert_eq!(unit.len(), 3);
        assert!(!unit.is_empty());
    }

    #[test]
    fn test_debug_omits_payload() {
        let unit = CodeUnit::new("a.B", vec![0xCA, 0xFE], "root");
        let debug = format!("{unit:?}");
        assert!(debug.contains("len: 2"));
        assert!(!debug.contains("bytes"));
    }

    #[test]
    fn test_unit_name_validation() {
        assert!(is_valid_unit_name("Main"));
        assert!(is_valid_unit_name("host.api.Registry"));
        assert!(!is_valid_unit_name(""));
        assert!(!is_valid_unit_name("host..Registry"));
        assert!(!is_valid_unit_name(".hidden"));
        assert!(!is_valid_unit_name("host/../etc"));
        assert!(!is_valid_unit_name("host\\api"));
    }

    #[test]
    fn test_unit_path_mirrors_name() {
        let path = unit_path("host.api.Registry", "unit");
        assert_eq!(path, PathBuf::from("host").join("api").join("Registry.unit"));

        let bare = unit_path("Main", "");
        assert_eq!(bare, PathBuf::from("Main"));
    }
}
