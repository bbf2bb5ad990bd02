//! Transform error types.

use thiserror::Error;

/// Boxed error returned by an individual transformer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A transformer in the chain failed.
///
/// The whole chain is aborted for that unit; no partially transformed bytes
/// are returned alongside this error.
#[derive(Debug, Error)]
#[error("transformer '{transformer}' failed on unit '{unit}': {source}")]
pub struct TransformError {
    /// Name of the failing transformer.
    pub transformer: String,
    /// Qualified name of the unit being transformed.
    pub unit: String,
    /// The underlying cause.
    #[source]
    pub source: BoxError,
}

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;
