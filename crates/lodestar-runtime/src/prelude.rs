//! Prelude module - commonly used types for convenient import.
//!
//! Use `use lodestar_runtime::prelude::*;` to import all essential types.

// Errors
pub use crate::{HostError, HostResult};

// Host
pub use crate::{ActivationReport, ExtensionHost};

// Commonly paired types from the other crates
pub use lodestar_catalog::{ExtensionPrototype, PrototypeKey};
pub use lodestar_config::LauncherConfig;
pub use lodestar_loader::{Diagnostics, LoaderContext};
