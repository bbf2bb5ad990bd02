//! Loader error types.

use std::fmt;
use std::io;

use lodestar_transform::TransformError;
use thiserror::Error;

/// Errors that can occur while resolving code units.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The unit is absent everywhere that was searched.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// A transformer in the chain failed. No cache was modified.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// A source exists but could not be read.
    #[error("failed to read unit '{name}' from {source_desc}: {source}")]
    Source {
        /// Qualified unit name.
        name: String,
        /// Description of the failing source.
        source_desc: String,
        /// The I/O error.
        #[source]
        source: io::Error,
    },

    /// A define-once or hierarchy invariant was broken.
    ///
    /// This is a programming fault; the operation is aborted instead of
    /// overwriting state.
    #[error("loader invariant violated: {0}")]
    InvariantViolation(String),
}

impl LoaderError {
    /// Whether this is a [`LoaderError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// One place that was searched without finding the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStep {
    /// Name of the loader that missed.
    pub loader: String,
    /// The source it consulted.
    pub source: String,
}

impl SearchStep {
    /// Create a step.
    #[must_use]
    pub fn new(loader: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for SearchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.loader, self.source)
    }
}

/// A unit was not found.
///
/// `trail` lists every loader that was consulted, in attempt order, so a
/// failed hierarchy search shows exactly where it looked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct NotFound {
    /// Qualified unit name.
    pub name: String,
    /// Loaders searched, in attempt order.
    pub trail: Vec<SearchStep>,
}

impl NotFound {
    /// A miss at a single loader.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        loader: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            trail: vec![SearchStep::new(loader, source)],
        }
    }

    /// Names of the searched loaders, in attempt order.
    #[must_use]
    pub fn searched(&self) -> Vec<&str> {
        self.trail.iter().map(|s| s.loader.as_str()).collect()
    }

    /// Whether `loader` was consulted.
    #[must_use]
    pub fn references(&self, loader: &str) -> bool {
        self.trail.iter().any(|s| s.loader == loader)
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit '{}' not found; searched: ", self.name)?;
        for (i, step) in self.trail.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
