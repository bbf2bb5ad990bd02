//! Lodestar Core - shared types for the Lodestar extension loader.
//!
//! This crate provides:
//! - [`CodeUnit`], the immutable, named block of code that loaders define
//! - The [`CodeSource`] contract implemented by every backing store
//! - In-memory and directory-backed sources
//!
//! # Example
//!
//! ```rust
//! use lodestar_core::{CodeSource, MemorySource};
//!
//! let source = MemorySource::new("host")
//!     .with_unit("host.api.Registry", b"registry".to_vec());
//!
//! let bytes = source.lookup("host.api.Registry").unwrap();
//! assert_eq!(bytes.as_deref(), Some(&b"registry"[..]));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod source;
mod unit;

pub use source::{CodeSource, DEFAULT_UNIT_EXTENSION, DirectorySource, MemorySource};
pub use unit::{CodeUnit, is_valid_unit_name, unit_path};
