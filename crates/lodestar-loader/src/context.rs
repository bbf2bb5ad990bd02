//! Process-wide loader state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lodestar_core::CodeSource;
use lodestar_transform::{Transformer, TransformerRegistry};
use tracing::info;

use crate::diagnostics::Diagnostics;
use crate::error::{LoaderError, LoaderResult};
use crate::extension::ExtensionLoader;
use crate::root::RootLoader;

/// Owner of the transformer registry, the root loader, and every top-level
/// extension loader it created.
///
/// Create exactly one at startup, pass it by reference to whatever needs to
/// create loaders, and call [`LoaderContext::shutdown`] when the host exits.
pub struct LoaderContext {
    transformers: Arc<TransformerRegistry>,
    root: Arc<RootLoader>,
    loaders: Mutex<Vec<Arc<ExtensionLoader>>>,
    shut_down: AtomicBool,
}

impl LoaderContext {
    /// Initialize with a fresh transformer registry.
    #[must_use]
    pub fn init(host_source: Arc<dyn CodeSource>, diagnostics: Diagnostics) -> Self {
        Self::with_registry(host_source, Arc::new(TransformerRegistry::new()), diagnostics)
    }

    /// Initialize around an existing registry.
    #[must_use]
    pub fn with_registry(
        host_source: Arc<dyn CodeSource>,
        transformers: Arc<TransformerRegistry>,
        diagnostics: Diagnostics,
    ) -> Self {
        info!(
            host_source = %host_source.describe(),
            trace = diagnostics.is_tracing(),
            dump_dir = ?diagnostics.dump_dir(),
            "Loader context initialized"
        );
        let root = Arc::new(RootLoader::new(
            host_source,
            Arc::clone(&transformers),
            diagnostics,
        ));
        Self {
            transformers,
            root,
            loaders: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// The shared root loader.
    #[must_use]
    pub fn root(&self) -> &Arc<RootLoader> {
        &self.root
    }

    /// The shared transformer registry.
    #[must_use]
    pub fn transformers(&self) -> &Arc<TransformerRegistry> {
        &self.transformers
    }

    /// Register a transformer with the shared registry.
    pub fn register_transformer(&self, transformer: Arc<dyn Transformer>) {
        self.transformers.register(transformer);
    }

    /// Create a top-level extension loader wired to the root.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvariantViolation`] after shutdown.
    pub fn create_loader(
        &self,
        name: impl Into<String>,
        storage: Arc<dyn CodeSource>,
    ) -> LoaderResult<Arc<ExtensionLoader>> {
        if self.is_shut_down() {
            return Err(LoaderError::InvariantViolation(
                "loader context has been shut down".to_string(),
            ));
        }
        let loader = ExtensionLoader::new(name, &self.root, storage);
        self.lock_loaders().push(Arc::clone(&loader));
        Ok(loader)
    }

    /// Tear down a top-level loader and forget it.
    ///
    /// Returns `false` if the loader was not created by this context.
    pub fn release(&self, loader: &Arc<ExtensionLoader>) -> bool {
        let removed = {
            let mut loaders = self.lock_loaders();
            let before = loaders.len();
            loaders.retain(|l| !Arc::ptr_eq(l, loader));
            loaders.len() != before
        };
        if removed {
            loader.teardown();
        }
        removed
    }

    /// Top-level loaders that are still active.
    #[must_use]
    pub fn loaders(&self) -> Vec<Arc<ExtensionLoader>> {
        self.lock_loaders().clone()
    }

    /// Whether [`LoaderContext::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Tear down every loader and release the root cache. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let loaders = std::mem::take(&mut *self.lock_loaders());
        for loader in &loaders {
            loader.teardown();
        }
        let released = self.root.clear();
        info!(
            loaders = loaders.len(),
            root_units = released,
            "Loader context shut down"
        );
    }

    fn lock_loaders(&self) -> std::sync::MutexGuard<'_, Vec<Arc<ExtensionLoader>>> {
        self.loaders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderContext")
            .field("root", &self.root)
            .field("transformers", &self.transformers)
            .field("loader_count", &self.lock_loaders().len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
