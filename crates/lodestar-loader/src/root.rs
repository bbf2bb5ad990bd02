//! The root loader: single authority for shared symbols and for the
//! transformer pipeline.

use std::sync::Arc;

use lodestar_core::{CodeSource, CodeUnit};
use lodestar_transform::TransformerRegistry;
use tracing::{debug, info};

use crate::cache::DefineCache;
use crate::diagnostics::Diagnostics;
use crate::error::{LoaderError, LoaderResult, NotFound};

/// Default name of the root loader.
pub const ROOT_LOADER_NAME: &str = "root";

/// The shared root loader.
///
/// Resolves each name at most once: cache, then backing source, then the
/// transformer chain, then define and cache.
pub struct RootLoader {
    name: String,
    source: Arc<dyn CodeSource>,
    transformers: Arc<TransformerRegistry>,
    diagnostics: Diagnostics,
    cache: DefineCache,
}

impl RootLoader {
    /// Create a root loader over `source`.
    #[must_use]
    pub fn new(
        source: Arc<dyn CodeSource>,
        transformers: Arc<TransformerRegistry>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            name: ROOT_LOADER_NAME.to_string(),
            source,
            transformers,
            diagnostics,
            cache: DefineCache::new(ROOT_LOADER_NAME),
        }
    }

    /// Loader name, used as `defined_by` for root units.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared transformer registry.
    #[must_use]
    pub fn transformers(&self) -> &Arc<TransformerRegistry> {
        &self.transformers
    }

    /// Diagnostic settings.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Resolve `name` against the root source.
    ///
    /// # Errors
    ///
    /// - [`LoaderError::NotFound`] if the source does not hold the unit
    /// - [`LoaderError::Transform`] if the chain fails; nothing is cached
    /// - [`LoaderError::Source`] if the source cannot be read
    pub fn resolve(&self, name: &str) -> LoaderResult<Arc<CodeUnit>> {
        let defined = self.cache.get_or_define(name, || {
            let Some(raw) = self.source.lookup(name).map_err(|e| LoaderError::Source {
                name: name.to_string(),
                source_desc: self.source.describe(),
                source: e,
            })?
            else {
                return Ok(None);
            };
            let bytes = self.transform(name, raw)?;
            debug!(unit = name, len = bytes.len(), "Root defined unit");
            Ok(Some(CodeUnit::new(name, bytes, self.name.as_str())))
        })?;

        defined
            .ok_or_else(|| NotFound::new(name, self.name.as_str(), self.source.describe()).into())
    }

    /// Run the shared transformer pipeline over raw bytes.
    ///
    /// Extension loaders call this so units they define in their own
    /// namespace still go through the one pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Transform`] if any transformer fails.
    pub fn transform(&self, name: &str, bytes: Vec<u8>) -> LoaderResult<Vec<u8>> {
        if self.diagnostics.is_tracing() {
            let chain: Vec<String> = self
                .transformers
                .applicable(name)
                .iter()
                .map(|t| t.name().to_string())
                .collect();
            info!(unit = name, input_len = bytes.len(), chain = ?chain, "Transforming unit");
        }

        let transformed = self.transformers.apply_all(name, bytes)?;

        if self.diagnostics.is_tracing() {
            info!(unit = name, output_len = transformed.len(), "Transformed unit");
        }
        self.diagnostics.dump(name, &transformed);
        Ok(transformed)
    }

    /// Whether `name` has been defined by the root.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    /// Number of units currently cached.
    #[must_use]
    pub fn defined_count(&self) -> usize {
        self.cache.len()
    }

    /// Number of define attempts that reached the source.
    #[must_use]
    pub fn define_passes(&self) -> usize {
        self.cache.passes()
    }

    #[cfg(test)]
    pub(crate) fn pending_locks(&self) -> usize {
        self.cache.pending_locks()
    }

    /// Release every cached unit. Returns how many were released.
    pub fn clear(&self) -> usize {
        let released = self.cache.clear();
        info!(loader = %self.name, released_units = released, "Root loader cache cleared");
        released
    }
}

impl std::fmt::Debug for RootLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootLoader")
            .field("name", &self.name)
            .field("source", &self.source.describe())
            .field("defined_count", &self.cache.len())
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
