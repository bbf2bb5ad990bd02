//! The extension host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lodestar_catalog::{
    EnablementPolicy, ExtensionCatalog, ManifestDirStore, PrototypeKey, PrototypeList,
    PrototypeStore, reconcile,
};
use lodestar_config::LauncherConfig;
use lodestar_core::{CodeUnit, DirectorySource};
use lodestar_loader::{ExtensionLoader, LoaderContext};
use tracing::{debug, info, warn};

use crate::error::{HostError, HostResult};

/// Outcome of [`ExtensionHost::activate_enabled`].
#[derive(Debug, Default)]
pub struct ActivationReport {
    /// Extensions now active, in discovery order.
    pub activated: Vec<PrototypeKey>,
    /// Extensions that could not be activated, with the reason.
    pub failed: Vec<(PrototypeKey, HostError)>,
}

impl ActivationReport {
    /// Whether every enabled extension was activated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the loader context, catalog and launcher configuration, and maps
/// enabled prototypes to live extension loaders.
pub struct ExtensionHost {
    context: LoaderContext,
    catalog: ExtensionCatalog,
    config: LauncherConfig,
    config_path: PathBuf,
    prototypes: Option<Arc<PrototypeList>>,
    active: Vec<(PrototypeKey, Arc<ExtensionLoader>)>,
}

impl ExtensionHost {
    /// Create a host from an already loaded configuration.
    #[must_use]
    pub fn new(
        context: LoaderContext,
        config: LauncherConfig,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            context,
            catalog: ExtensionCatalog::new(),
            config,
            config_path: config_path.into(),
            prototypes: None,
            active: Vec::new(),
        }
    }

    /// Create a host, loading the configuration from `config_path` or
    /// falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] if an existing file cannot be loaded.
    pub fn open(context: LoaderContext, config_path: impl Into<PathBuf>) -> HostResult<Self> {
        let config_path = config_path.into();
        let config = lodestar_config::open(&config_path)?;
        Ok(Self::new(context, config, config_path))
    }

    /// The loader context.
    #[must_use]
    pub fn context(&self) -> &LoaderContext {
        &self.context
    }

    /// The launcher configuration.
    #[must_use]
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Mutable access to the launcher configuration.
    pub fn config_mut(&mut self) -> &mut LauncherConfig {
        &mut self.config
    }

    /// Where the configuration is saved.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The current prototype list, if discovery has run.
    #[must_use]
    pub fn prototypes(&self) -> Option<&Arc<PrototypeList>> {
        self.prototypes.as_ref()
    }

    /// Scan the configured extensions folder.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Catalog`] if the folder cannot be read.
    pub fn discover(&mut self) -> HostResult<Arc<PrototypeList>> {
        let store = ManifestDirStore::new(self.config.folder_extensions.clone());
        self.discover_from(&store)
    }

    /// Scan `store` and, if a new list was built, reconcile it against the
    /// configuration's enablement policy.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Catalog`] if the store cannot be enumerated.
    pub fn discover_from(&mut self, store: &dyn PrototypeStore) -> HostResult<Arc<PrototypeList>> {
        let list = self.catalog.scan(store)?;
        let fresh = self
            .prototypes
            .as_ref()
            .is_none_or(|previous| !Arc::ptr_eq(previous, &list));
        if fresh {
            let policy = self.config.policy();
            if policy == EnablementPolicy::EnableAll && !self.config.extensions.enabled.is_empty() {
                warn!(
                    tokens = self.config.extensions.enabled.len(),
                    "enable-by-default is set; ignoring the explicit enabled list"
                );
            }
            let report = reconcile(&list, &policy);
            for token in &report.ignored {
                debug!(token = %token, "Enabled token will be pruned on next save");
            }
            self.prototypes = Some(Arc::clone(&list));
        }
        Ok(list)
    }

    /// Toggle a discovered prototype.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotDiscovered`] before discovery, or
    /// [`HostError::UnknownExtension`] if `key` is not in the list.
    pub fn set_enabled(&mut self, key: &PrototypeKey, enabled: bool) -> HostResult<()> {
        if self.prototype_list()?.set_enabled(key, enabled) {
            Ok(())
        } else {
            Err(HostError::UnknownExtension(key.clone()))
        }
    }

    /// Activate every enabled prototype, continuing past failures.
    ///
    /// Does nothing when `do-extensions` is off.
    pub fn activate_enabled(&mut self) -> ActivationReport {
        let mut report = ActivationReport::default();
        if !self.config.do_extensions {
            info!("Extension support disabled, skipping activation");
            return report;
        }
        let Some(list) = self.prototypes.clone() else {
            warn!("Activation requested before discovery");
            return report;
        };

        for proto in list.enabled() {
            let key = proto.key().clone();
            match self.activate(&key) {
                Ok(_) => report.activated.push(key),
                Err(e) => {
                    warn!(extension = %key, error = %e, "Failed to activate extension");
                    report.failed.push((key, e));
                },
            }
        }
        info!(
            activated = report.activated.len(),
            failed = report.failed.len(),
            "Extension activation complete"
        );
        report
    }

    /// Activate one prototype, enabled or not. Returns the existing loader
    /// if it is already active.
    ///
    /// Creates a loader over the prototype's unit directory and one child
    /// per nested unit, in manifest order.
    ///
    /// # Errors
    ///
    /// Returns an error if extensions are disabled, the prototype is
    /// unknown, its unit directory is missing, or the loader context has
    /// been shut down.
    pub fn activate(&mut self, key: &PrototypeKey) -> HostResult<Arc<ExtensionLoader>> {
        if let Some(loader) = self.loader(key) {
            return Ok(Arc::clone(loader));
        }
        if !self.config.do_extensions {
            return Err(HostError::ExtensionsDisabled);
        }

        let list = Arc::clone(self.prototype_list()?);
        let proto = list
            .get(key)
            .ok_or_else(|| HostError::UnknownExtension(key.clone()))?;
        let units = proto.units_path();
        if !units.is_dir() {
            return Err(HostError::MissingUnits {
                key: key.clone(),
                path: units,
            });
        }

        let loader = self
            .context
            .create_loader(key.token(), Arc::new(DirectorySource::new(units)))?;
        for nested in proto.nested() {
            let storage = DirectorySource::new(proto.location().join(&nested.path));
            if let Err(e) = loader.spawn_child(nested.name.clone(), Arc::new(storage)) {
                self.context.release(&loader);
                return Err(e.into());
            }
        }

        info!(
            extension = %key,
            location = %proto.location().display(),
            nested = proto.nested().len(),
            "Extension activated"
        );
        self.active.push((key.clone(), Arc::clone(&loader)));
        Ok(loader)
    }

    /// Tear down an active extension and all of its child loaders.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotActive`] if the extension is not active.
    pub fn deactivate(&mut self, key: &PrototypeKey) -> HostResult<()> {
        let index = self
            .active
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| HostError::NotActive(key.clone()))?;
        let (_, loader) = self.active.remove(index);
        self.context.release(&loader);
        info!(extension = %key, "Extension deactivated");
        Ok(())
    }

    /// The loader of an active extension.
    #[must_use]
    pub fn loader(&self, key: &PrototypeKey) -> Option<&Arc<ExtensionLoader>> {
        self.active
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, loader)| loader)
    }

    /// Keys of active extensions, in activation order.
    #[must_use]
    pub fn active_keys(&self) -> Vec<PrototypeKey> {
        self.active.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Resolve `name` through an active extension's loader.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotActive`] or the loader's error.
    pub fn resolve(&self, key: &PrototypeKey, name: &str) -> HostResult<Arc<CodeUnit>> {
        let loader = self
            .loader(key)
            .ok_or_else(|| HostError::NotActive(key.clone()))?;
        Ok(loader.resolve(name)?)
    }

    /// Re-read the configuration file. On failure the current
    /// configuration and prototype list are kept.
    ///
    /// On success the prototype list is dropped, so the next
    /// [`ExtensionHost::discover`] rescans and applies the reloaded
    /// enablement policy. Active loaders are left running.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] if the file cannot be loaded.
    pub fn reload_config(&mut self) -> HostResult<()> {
        self.config.reload(&self.config_path)?;
        self.catalog.invalidate();
        self.prototypes = None;
        info!(path = %self.config_path.display(), "Configuration reloaded");
        Ok(())
    }

    /// Persist the configuration.
    ///
    /// After discovery the saved `extensions.enabled` is exactly the set of
    /// enabled prototypes; before discovery the loaded tokens are kept.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] if the file cannot be written.
    pub fn save_config(&mut self) -> HostResult<()> {
        if let Some(list) = &self.prototypes {
            self.config.sync_enabled(list);
        }
        self.config.save(&self.config_path)?;
        Ok(())
    }

    /// Tear down every extension and release the loader context.
    pub fn shutdown(&mut self) {
        let count = self.active.len();
        self.active.clear();
        self.context.shutdown();
        info!(extensions = count, "Extension host shut down");
    }

    fn prototype_list(&self) -> HostResult<&Arc<PrototypeList>> {
        self.prototypes.as_ref().ok_or(HostError::NotDiscovered)
    }
}

impl std::fmt::Debug for ExtensionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionHost")
            .field("config_path", &self.config_path)
            .field("prototypes", &self.prototypes.as_ref().map(|l| l.len()))
            .field("active", &self.active_keys())
            .finish_non_exhaustive()
    }
}
