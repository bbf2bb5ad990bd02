//! Prototype lists, scan caching and enablement reconciliation.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::CatalogResult;
use crate::prototype::{ExtensionPrototype, PrototypeKey};
use crate::store::{PrototypeStore, StoreLocation};

/// The deduplicated prototypes built from one store location.
#[derive(Debug)]
pub struct PrototypeList {
    location: StoreLocation,
    prototypes: Vec<ExtensionPrototype>,
}

impl PrototypeList {
    /// Location this list was built from.
    #[must_use]
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Every version sharing `name`, in discovery order.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Vec<&ExtensionPrototype> {
        self.prototypes.iter().filter(|p| p.name() == name).collect()
    }

    /// Look up an exact `(name, version)`.
    #[must_use]
    pub fn get(&self, key: &PrototypeKey) -> Option<&ExtensionPrototype> {
        self.prototypes.iter().find(|p| p.key() == key)
    }

    /// All prototypes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionPrototype> {
        self.prototypes.iter()
    }

    /// Currently enabled prototypes, in discovery order.
    #[must_use]
    pub fn enabled(&self) -> Vec<&ExtensionPrototype> {
        self.prototypes.iter().filter(|p| p.is_enabled()).collect()
    }

    /// Toggle one prototype. Returns `false` if it is not in the list.
    pub fn set_enabled(&self, key: &PrototypeKey, enabled: bool) -> bool {
        match self.get(key) {
            Some(proto) => {
                proto.set_enabled(enabled);
                true
            },
            None => false,
        }
    }

    /// Number of prototypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

/// How enabled flags are derived at configuration-load time.
///
/// The two modes are exclusive: `EnableAll` ignores any persisted tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnablementPolicy {
    /// Every discovered prototype is enabled.
    EnableAll,
    /// Only prototypes matching a persisted `name@version` token.
    Explicit(Vec<String>),
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Prototypes that were enabled.
    pub enabled: Vec<PrototypeKey>,
    /// Tokens that were malformed or matched nothing.
    pub ignored: Vec<String>,
}

/// Apply an enablement policy to a list.
///
/// In explicit mode, prototypes not named by any token keep their current
/// flag. Ignored tokens are reported, never errors, and disappear on the
/// next save since only enabled prototypes are persisted.
pub fn reconcile(list: &PrototypeList, policy: &EnablementPolicy) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    match policy {
        EnablementPolicy::EnableAll => {
            for proto in list.iter() {
                proto.set_enabled(true);
                report.enabled.push(proto.key().clone());
            }
        },
        EnablementPolicy::Explicit(tokens) => {
            for token in tokens {
                let Some(key) = PrototypeKey::parse_token(token) else {
                    warn!(token = %token, "Ignoring malformed enablement token");
                    report.ignored.push(token.clone());
                    continue;
                };
                if list.set_enabled(&key, true) {
                    report.enabled.push(key);
                } else {
                    debug!(token = %token, "Enablement token matches no discovered extension");
                    report.ignored.push(token.clone());
                }
            }
        },
    }
    info!(
        location = %list.location(),
        enabled = report.enabled.len(),
        ignored = report.ignored.len(),
        "Reconciled extension enablement"
    );
    report
}

/// The tokens to persist: exactly the currently enabled prototypes, sorted.
#[must_use]
pub fn enabled_tokens(list: &PrototypeList) -> Vec<String> {
    list.iter()
        .filter(|p| p.is_enabled())
        .map(|p| p.key().token())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds and caches the prototype list for the most recently scanned
/// location.
#[derive(Debug, Default)]
pub struct ExtensionCatalog {
    current: Option<Arc<PrototypeList>>,
}

impl ExtensionCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `store`, or return the cached list if its location is unchanged.
    ///
    /// # Errors
    ///
    /// Propagates store enumeration failures; the cached list is kept in
    /// that case.
    pub fn scan(&mut self, store: &dyn PrototypeStore) -> CatalogResult<Arc<PrototypeList>> {
        let location = store.location();
        if let Some(current) = &self.current
            && current.location == location
        {
            debug!(location = %location, "Reusing cached prototype list");
            return Ok(Arc::clone(current));
        }

        let discovered = store.enumerate()?;
        let mut seen = HashSet::new();
        let mut prototypes = Vec::with_capacity(discovered.len());
        for found in discovered {
            let manifest = found.manifest;
            let key = PrototypeKey::new(manifest.name, manifest.version);
            if !seen.insert(key.clone()) {
                warn!(
                    extension = %key,
                    path = %found.location.display(),
                    "Duplicate extension prototype ignored"
                );
                continue;
            }
            prototypes.push(
                ExtensionPrototype::new(key, found.location)
                    .with_description(manifest.description)
                    .with_units_dir(manifest.units)
                    .with_nested(manifest.nested),
            );
        }

        info!(location = %location, count = prototypes.len(), "Scanned extension prototypes");
        let list = Arc::new(PrototypeList {
            location,
            prototypes,
        });
        self.current = Some(Arc::clone(&list));
        Ok(list)
    }

    /// The cached list, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Arc<PrototypeList>> {
        self.current.as_ref()
    }

    /// Every version sharing `name` in the cached list.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Vec<&ExtensionPrototype> {
        self.current
            .as_deref()
            .map(|list| list.by_name(name))
            .unwrap_or_default()
    }

    /// Drop the cached list so the next scan re-enumerates.
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
