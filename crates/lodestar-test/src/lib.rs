//! Lodestar Test - Shared test utilities.
//!
//! Mock transformers and sources for exercising the loader, plus
//! filesystem fixtures for building extension folders and launcher
//! configurations in temporary directories.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! lodestar-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use lodestar_test::{RecordingTransformer, TestWorkspace};
//!
//! #[test]
//! fn test_extension_units_are_transformed() {
//!     let ws = TestWorkspace::new();
//!     ws.extension("core", "1.0").unit("core.Main", b"main").write();
//!     let tagger = RecordingTransformer::new("tag", 0);
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
