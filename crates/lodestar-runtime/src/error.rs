//! Host error types.

use std::path::PathBuf;

use lodestar_catalog::{CatalogError, PrototypeKey};
use lodestar_config::ConfigError;
use lodestar_loader::LoaderError;
use thiserror::Error;

/// Errors surfaced by the [`ExtensionHost`](crate::ExtensionHost).
#[derive(Debug, Error)]
pub enum HostError {
    /// Resolution or loader lifecycle failure.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Prototype discovery failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Configuration load or save failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `do-extensions` is off.
    #[error("Extension support is disabled")]
    ExtensionsDisabled,

    /// No prototype list has been built yet.
    #[error("Extensions have not been discovered")]
    NotDiscovered,

    /// The key names no discovered prototype.
    #[error("Unknown extension {0}")]
    UnknownExtension(PrototypeKey),

    /// The extension has no active loader.
    #[error("Extension {0} is not active")]
    NotActive(PrototypeKey),

    /// The extension's unit directory is missing.
    #[error("Extension {key} has no unit directory at {}", path.display())]
    MissingUnits {
        /// The extension.
        key: PrototypeKey,
        /// Expected directory.
        path: PathBuf,
    },
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
