//! The transformer contract.

use crate::error::BoxError;

/// A pluggable rewrite applied to code units before they are defined.
///
/// Only the contract lives here; what a transformer does to the bytes is its
/// own business.
pub trait Transformer: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Whether this transformer wants to see the unit called `name`.
    fn is_valid_target(&self, name: &str) -> bool;

    /// Whether the transformer is currently usable.
    ///
    /// Re-checked on every application, so a transformer can switch itself
    /// off at runtime.
    fn is_valid(&self) -> bool {
        true
    }

    /// Ordering key. Lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    /// Rewrite the payload of `name`.
    ///
    /// The unit's identity cannot change: the name is only borrowed.
    ///
    /// # Errors
    ///
    /// Any error aborts the chain for this unit.
    fn apply(&self, name: &str, bytes: Vec<u8>) -> Result<Vec<u8>, BoxError>;
}
