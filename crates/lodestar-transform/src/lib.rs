//! Lodestar Transform - the transformer chain applied to every code unit
//! before it is defined.
//!
//! Transformers are registered once and then applied, in ascending
//! [`Transformer::priority`] order, to each unit they target. Lower values
//! run first, so a structural rewrite registered at `-10_000` always sees
//! the raw unit and ordinary instrumentation at `0` sees the rewritten one.
//! Equal priorities run in registration order.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod registry;
mod transformer;

pub use error::{BoxError, TransformError, TransformResult};
pub use registry::TransformerRegistry;
pub use transformer::Transformer;
