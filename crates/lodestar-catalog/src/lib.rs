//! Lodestar Catalog - extension prototypes and their enablement.
//!
//! A prototype is a discovered, not-yet-activated extension identified by
//! its `(name, version)` pair. The catalog builds prototype lists from a
//! [`PrototypeStore`], caches the list per store location, and reconciles
//! the enabled flags against persisted `name@version` tokens.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod catalog;
mod error;
mod manifest;
mod prototype;
mod store;

pub use catalog::{
    EnablementPolicy, ExtensionCatalog, PrototypeList, ReconcileReport, enabled_tokens, reconcile,
};
pub use error::{CatalogError, CatalogResult};
pub use manifest::{
    DEFAULT_UNITS_DIR, ExtensionManifest, MANIFEST_FILE_NAME, NestedDef, load_manifest,
};
pub use prototype::{ExtensionPrototype, PrototypeKey};
pub use store::{DiscoveredExtension, ManifestDirStore, MemoryStore, PrototypeStore, StoreLocation};
