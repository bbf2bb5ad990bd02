//! Prelude module - commonly used types for convenient import.
//!
//! Use `use lodestar_core::prelude::*;` to import all essential types.

pub use crate::{CodeSource, CodeUnit, DirectorySource, MemorySource};
