//! Prototype identity and state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::manifest::NestedDef;

/// Identity of a prototype: `(name, version)`.
///
/// Version is part of identity, not a sort key: `core@1.0` and `core@2.0`
/// are unrelated prototypes that happen to share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrototypeKey {
    /// Extension name.
    pub name: String,
    /// Extension version, compared by exact string equality.
    pub version: String,
}

impl PrototypeKey {
    /// Create a key.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse a persisted `name@version` token.
    ///
    /// The token must split on `@` into exactly two non-empty fields;
    /// anything else yields `None`.
    #[must_use]
    pub fn parse_token(token: &str) -> Option<Self> {
        let mut fields = token.split('@');
        let name = fields.next()?;
        let version = fields.next()?;
        if fields.next().is_some() || name.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(name, version))
    }

    /// The persisted token form, `name@version`.
    #[must_use]
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PrototypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A discovered, not-yet-activated extension.
///
/// The enabled flag is atomic so a shared, cached list can be toggled in
/// place.
#[derive(Debug)]
pub struct ExtensionPrototype {
    key: PrototypeKey,
    enabled: AtomicBool,
    location: PathBuf,
    description: Option<String>,
    units_dir: PathBuf,
    nested: Vec<NestedDef>,
}

impl ExtensionPrototype {
    /// Create a disabled prototype.
    #[must_use]
    pub fn new(key: PrototypeKey, location: impl Into<PathBuf>) -> Self {
        Self {
            key,
            enabled: AtomicBool::new(false),
            location: location.into(),
            description: None,
            units_dir: PathBuf::new(),
            nested: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the unit directory, relative to the location.
    #[must_use]
    pub fn with_units_dir(mut self, units_dir: impl Into<PathBuf>) -> Self {
        self.units_dir = units_dir.into();
        self
    }

    /// Set the statically known nested units.
    #[must_use]
    pub fn with_nested(mut self, nested: Vec<NestedDef>) -> Self {
        self.nested = nested;
        self
    }

    /// Identity.
    #[must_use]
    pub fn key(&self) -> &PrototypeKey {
        &self.key
    }

    /// Extension name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Extension version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.key.version
    }

    /// Opaque source location (for directory stores, the extension folder).
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Directory holding the extension's own units.
    #[must_use]
    pub fn units_path(&self) -> PathBuf {
        self.location.join(&self.units_dir)
    }

    /// Human-readable description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Nested units that become child loaders on activation.
    #[must_use]
    pub fn nested(&self) -> &[NestedDef] {
        &self.nested
    }

    /// Whether the prototype is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Toggle the enabled flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_accepts_two_fields() {
        let key = PrototypeKey::parse_token("core@1.0").unwrap();
        assert_eq!(key, PrototypeKey::new("core", "1.0"));
        assert_eq!(key.token(), "core@1.0");
    }

    #[test]
    fn test_parse_token_rejects_malformed() {
        for token in ["core", "core@", "@1.0", "core@1.0@beta", "", "@"] {
            assert!(PrototypeKey::parse_token(token).is_none(), "{token}");
        }
    }

    #[test]
    fn test_prototype_toggle() {
        let proto = ExtensionPrototype::new(PrototypeKey::new("ui", "2.0"), "/ext/ui");
        assert!(!proto.is_enabled());
        proto.set_enabled(true);
        assert!(proto.is_enabled());
        assert_eq!(proto.name(), "ui");
        assert_eq!(proto.version(), "2.0");
        assert_eq!(proto.units_path(), PathBuf::from("/ext/ui"));
    }
}
