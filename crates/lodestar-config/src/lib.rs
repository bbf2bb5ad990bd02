//! Lodestar Config - the persisted launcher configuration.
//!
//! The configuration is a single JSON object:
//!
//! ```json
//! {
//!     "target-jar": "./jar/host.jar",
//!     "do-extensions": true,
//!     "do-patches": false,
//!     "folder-extensions": "extensions/",
//!     "folder-patches": "patches/",
//!     "folder-data": "data/",
//!     "extensions": {
//!         "enabled": ["core@1.0"]
//!     }
//! }
//! ```
//!
//! Loading is all-or-nothing: a missing field, a parse failure or a
//! validation failure leaves any existing in-memory configuration untouched.
//! Keys this crate does not know about are carried through to the next save.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{REQUIRED_FIELDS, load, open, save};
pub use types::{DEFAULT_REPOSITORY_AUTHORITY, ExtensionsSection, LauncherConfig};
pub use validate::validate;
