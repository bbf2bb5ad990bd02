//! Lodestar Loader - the loader hierarchy.
//!
//! Every resolution starts at an [`ExtensionLoader`], which always asks the
//! shared [`RootLoader`] first so symbols common to all extensions are
//! defined exactly once. On a root miss the extension falls back to its own
//! private storage and then to its children, in registration order.
//!
//! ```text
//!   ExtensionLoader::resolve("x.Y")
//!        │
//!        ├─► RootLoader::resolve ──► cache ─► source ─► transformers ─► define
//!        │         (NotFound)
//!        └─► local cache ─► private storage ─► RootLoader::transform ─► define
//!                  (miss)
//!              └─► child[0].search ─► child[1].search ─► ...
//! ```
//!
//! Both levels guarantee define-once: concurrent resolutions of the same
//! name run the transformer chain a single time and all observe the same
//! `Arc<CodeUnit>`.
//!
//! Process-wide state lives in a [`LoaderContext`] that the host creates
//! once at startup and shuts down explicitly.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cache;
mod context;
mod diagnostics;
mod error;
mod extension;
mod root;

pub use context::LoaderContext;
pub use diagnostics::{DEBUG_ENV, DEFAULT_DUMP_DIR, DUMP_ENV, Diagnostics};
pub use error::{LoaderError, LoaderResult, NotFound, SearchStep};
pub use extension::ExtensionLoader;
pub use root::{ROOT_LOADER_NAME, RootLoader};
