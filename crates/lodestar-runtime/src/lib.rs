//! Lodestar Runtime - the extension host.
//!
//! [`ExtensionHost`] ties the pieces together:
//!
//! 1. scan the configured extensions folder into a prototype list,
//! 2. reconcile enabled flags against the launcher configuration,
//! 3. create one extension loader per enabled prototype (plus a child loader
//!    per nested unit), all wired to the shared root loader,
//! 4. persist the enabled set and tear everything down on shutdown.
//!
//! Lifecycle calls take `&mut self`, so activation and deactivation of the
//! same extension are serialized by construction. Resolution through
//! [`ExtensionHost::resolve`] only needs `&self`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lodestar_core::DirectorySource;
//! use lodestar_loader::{Diagnostics, LoaderContext};
//! use lodestar_runtime::ExtensionHost;
//!
//! # fn main() -> Result<(), lodestar_runtime::HostError> {
//! let context = LoaderContext::init(
//!     Arc::new(DirectorySource::new("host/units")),
//!     Diagnostics::from_env(),
//! );
//! let mut host = ExtensionHost::open(context, "launcher.json")?;
//! host.discover()?;
//! let report = host.activate_enabled();
//! for (key, err) in &report.failed {
//!     tracing::warn!(extension = %key, error = %err, "Extension not activated");
//! }
//! host.save_config()?;
//! host.shutdown();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod host;

pub use error::{HostError, HostResult};
pub use host::{ActivationReport, ExtensionHost};
