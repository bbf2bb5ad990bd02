//! Extension loaders and hierarchy fallback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use lodestar_core::{CodeSource, CodeUnit};
use tracing::{debug, info};

use crate::cache::DefineCache;
use crate::error::{LoaderError, LoaderResult, NotFound, SearchStep};
use crate::root::RootLoader;

/// Outcome of a hierarchy search. Misses are data, not errors.
enum Search {
    Found(Arc<CodeUnit>),
    Missing(Vec<SearchStep>),
}

/// A loader for one activated extension (or one nested unit of it).
///
/// Loaders form a strict tree: children are append-only, each child has
/// exactly one parent, and a torn-down node is detached and unusable.
pub struct ExtensionLoader {
    name: String,
    root: Weak<RootLoader>,
    storage: Arc<dyn CodeSource>,
    cache: DefineCache,
    children: RwLock<Vec<Arc<ExtensionLoader>>>,
    parent: Mutex<Option<Weak<ExtensionLoader>>>,
    torn_down: AtomicBool,
}

impl ExtensionLoader {
    /// Create a detached loader over private `storage`.
    ///
    /// Only a weak reference to `root` is kept; the root's lifetime is owned
    /// by the [`LoaderContext`](crate::LoaderContext).
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        root: &Arc<RootLoader>,
        storage: Arc<dyn CodeSource>,
    ) -> Arc<Self> {
        let name = name.into();
        debug!(loader = %name, storage = %storage.describe(), "Created extension loader");
        Arc::new(Self {
            cache: DefineCache::new(name.clone()),
            name,
            root: Arc::downgrade(root),
            storage,
            children: RwLock::new(Vec::new()),
            parent: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        })
    }

    /// Loader name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a symbol: root first, then this loader's own hierarchy.
    ///
    /// # Errors
    ///
    /// - [`LoaderError::NotFound`] when neither the root nor any loader in
    ///   this subtree holds the unit; the trail lists all of them
    /// - [`LoaderError::Transform`] / [`LoaderError::Source`] from whichever
    ///   loader was defining the unit
    /// - [`LoaderError::InvariantViolation`] if this loader was torn down or
    ///   the root is gone
    pub fn resolve(&self, name: &str) -> LoaderResult<Arc<CodeUnit>> {
        self.ensure_live()?;
        let root = self.root()?;

        let root_miss = match root.resolve(name) {
            Ok(unit) => return Ok(unit),
            Err(LoaderError::NotFound(miss)) => miss,
            Err(e) => return Err(e),
        };

        match self.search(name, &root)? {
            Search::Found(unit) => Ok(unit),
            Search::Missing(trail) => {
                let mut miss = root_miss;
                miss.trail.extend(trail);
                Err(miss.into())
            },
        }
    }

    /// Resolve from this loader's own storage and children, skipping the root.
    ///
    /// Local cache, then private storage (transformed through the root's
    /// pipeline and defined here), then each child in registration order. A
    /// unit found in a child stays owned by that child and is not cached here.
    ///
    /// # Errors
    ///
    /// Same as [`ExtensionLoader::resolve`], without the root in the trail.
    pub fn load_own(&self, name: &str) -> LoaderResult<Arc<CodeUnit>> {
        self.ensure_live()?;
        let root = self.root()?;

        match self.search(name, &root)? {
            Search::Found(unit) => Ok(unit),
            Search::Missing(trail) => Err(NotFound {
                name: name.to_string(),
                trail,
            }
            .into()),
        }
    }

    fn search(&self, name: &str, root: &RootLoader) -> LoaderResult<Search> {
        if self.is_torn_down() {
            return Ok(Search::Missing(vec![SearchStep::new(&self.name, "torn down")]));
        }

        let local = self.cache.get_or_define(name, || {
            let Some(raw) = self.storage.lookup(name).map_err(|e| LoaderError::Source {
                name: name.to_string(),
                source_desc: self.storage.describe(),
                source: e,
            })?
            else {
                return Ok(None);
            };
            let bytes = root.transform(name, raw)?;
            debug!(loader = %self.name, unit = name, len = bytes.len(), "Extension defined unit");
            Ok(Some(CodeUnit::new(name, bytes, self.name.as_str())))
        })?;

        if let Some(unit) = local {
            return Ok(Search::Found(unit));
        }

        let mut trail = vec![SearchStep::new(&self.name, self.storage.describe())];
        for child in self.children() {
            match child.search(name, root)? {
                Search::Found(unit) => {
                    debug!(
                        loader = %self.name,
                        child = %child.name,
                        unit = name,
                        "Resolved unit via child"
                    );
                    return Ok(Search::Found(unit));
                },
                Search::Missing(child_trail) => trail.extend(child_trail),
            }
        }
        Ok(Search::Missing(trail))
    }

    /// Append `child` to this loader's children.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvariantViolation`] if either node is torn
    /// down, the child already has a parent, or the edge would form a cycle.
    pub fn add_child(self: &Arc<Self>, child: Arc<ExtensionLoader>) -> LoaderResult<()> {
        self.ensure_live()?;
        if child.is_torn_down() {
            return Err(LoaderError::InvariantViolation(format!(
                "cannot attach torn-down loader '{}' to '{}'",
                child.name, self.name
            )));
        }

        let mut ancestor = Some(Arc::clone(self));
        while let Some(node) = ancestor {
            if Arc::ptr_eq(&node, &child) {
                return Err(LoaderError::InvariantViolation(format!(
                    "attaching '{}' under '{}' would create a cycle",
                    child.name, self.name
                )));
            }
            ancestor = node.parent();
        }

        {
            let mut parent = child.parent.lock().unwrap_or_else(PoisonError::into_inner);
            if parent.is_some() {
                return Err(LoaderError::InvariantViolation(format!(
                    "loader '{}' already has a parent",
                    child.name
                )));
            }
            *parent = Some(Arc::downgrade(self));
        }

        debug!(parent = %self.name, child = %child.name, "Attached child loader");
        self.children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
        Ok(())
    }

    /// Create a loader over `storage` and attach it as the last child.
    ///
    /// # Errors
    ///
    /// Same as [`ExtensionLoader::add_child`], plus a gone root.
    pub fn spawn_child(
        self: &Arc<Self>,
        name: impl Into<String>,
        storage: Arc<dyn CodeSource>,
    ) -> LoaderResult<Arc<Self>> {
        let root = self.root()?;
        let child = Self::new(name, &root, storage);
        self.add_child(Arc::clone(&child))?;
        Ok(child)
    }

    /// Snapshot of the children in registration order.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<ExtensionLoader>> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The parent loader, if attached and still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<ExtensionLoader>> {
        self.parent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Whether `name` is defined in this loader's own cache.
    #[must_use]
    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    /// Number of units defined by this loader.
    #[must_use]
    pub fn defined_count(&self) -> usize {
        self.cache.len()
    }

    /// Whether [`ExtensionLoader::teardown`] has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Tear this loader and all of its descendants down.
    ///
    /// Descendants go first. Each node releases its cache and is detached
    /// from its parent, so none of its units stay reachable through the
    /// hierarchy. Idempotent.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let children = std::mem::take(
            &mut *self
                .children
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for child in &children {
            child.teardown();
        }

        let released = self.cache.clear();

        let parent = self
            .parent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(parent) = parent.as_ref().and_then(Weak::upgrade) {
            parent
                .children
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|c| !std::ptr::eq(Arc::as_ptr(c), self));
        }

        info!(
            loader = %self.name,
            released_units = released,
            torn_down_children = children.len(),
            "Extension loader torn down"
        );
    }

    fn ensure_live(&self) -> LoaderResult<()> {
        if self.is_torn_down() {
            return Err(LoaderError::InvariantViolation(format!(
                "loader '{}' used after teardown",
                self.name
            )));
        }
        Ok(())
    }

    fn root(&self) -> LoaderResult<Arc<RootLoader>> {
        self.root.upgrade().ok_or_else(|| {
            LoaderError::InvariantViolation(format!(
                "root loader of '{}' has been shut down",
                self.name
            ))
        })
    }
}

impl std::fmt::Debug for ExtensionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let children: Vec<String> = self.children().iter().map(|c| c.name.clone()).collect();
        f.debug_struct("ExtensionLoader")
            .field("name", &self.name)
            .field("storage", &self.storage.describe())
            .field("children", &children)
            .field("defined_count", &self.cache.len())
            .field("torn_down", &self.is_torn_down())
            .finish_non_exhaustive()
    }
}
