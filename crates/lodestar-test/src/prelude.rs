//! Prelude module - commonly used types for convenient import.
//!
//! Use `use lodestar_test::prelude::*;` to import all essential types.

// Mocks
pub use crate::{
    CountingSource, FailingTransformer, RecordingTransformer, SlowTransformer, ToggleTransformer,
};

// Fixtures
pub use crate::{ExtensionFixture, TestWorkspace, manifest, write_unit};

// Harness
pub use crate::{run_concurrently, setup_test_logging, setup_test_logging_default};
