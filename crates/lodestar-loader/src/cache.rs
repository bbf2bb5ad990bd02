//! Insert-once unit cache with per-name define locks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lodestar_core::CodeUnit;

use crate::error::{LoaderError, LoaderResult};

/// Cache of defined units owned by one loader.
///
/// Lookups are lock-free reads on the `DashMap`. On a miss the caller takes
/// the per-name lock, re-checks, and only then runs `define`. A lock leaves
/// the lock table once no caller holds or waits on it, whatever the outcome.
pub(crate) struct DefineCache {
    owner: String,
    units: DashMap<String, Arc<CodeUnit>>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    passes: AtomicUsize,
}

impl DefineCache {
    pub(crate) fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            units: DashMap::new(),
            locks: DashMap::new(),
            passes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<CodeUnit>> {
        self.units.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached unit for `name`, or run `define` exactly once.
    ///
    /// `define` returns `Ok(None)` when the unit is absent; nothing is cached
    /// in that case, nor when it fails.
    pub(crate) fn get_or_define<F>(
        &self,
        name: &str,
        define: F,
    ) -> LoaderResult<Option<Arc<CodeUnit>>>
    where
        F: FnOnce() -> LoaderResult<Option<CodeUnit>>,
    {
        if let Some(unit) = self.get(name) {
            return Ok(Some(unit));
        }

        let lock = Arc::clone(
            self.locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let outcome = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.define_locked(name, define)
        };

        // Clones are only taken under the shard lock, so a count of one
        // means nobody is waiting.
        drop(lock);
        self.locks.remove_if(name, |_, lock| Arc::strong_count(lock) == 1);
        outcome
    }

    fn define_locked<F>(&self, name: &str, define: F) -> LoaderResult<Option<Arc<CodeUnit>>>
    where
        F: FnOnce() -> LoaderResult<Option<CodeUnit>>,
    {
        if let Some(unit) = self.get(name) {
            return Ok(Some(unit));
        }

        self.passes.fetch_add(1, Ordering::Relaxed);
        let Some(unit) = define()? else {
            return Ok(None);
        };

        let unit = Arc::new(unit);
        match self.units.entry(name.to_string()) {
            Entry::Occupied(_) => Err(LoaderError::InvariantViolation(format!(
                "unit '{name}' defined twice in loader '{}'",
                self.owner
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&unit));
                Ok(Some(unit))
            },
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }

    /// Number of define attempts that ran (hits excluded).
    pub(crate) fn passes(&self) -> usize {
        self.passes.load(Ordering::Relaxed)
    }

    /// Number of per-name locks currently held or awaited.
    pub(crate) fn pending_locks(&self) -> usize {
        self.locks.len()
    }

    /// Drop every cached unit. Returns how many were released.
    ///
    /// The lock table is left alone so a define still in flight keeps
    /// excluding new callers for its name.
    pub(crate) fn clear(&self) -> usize {
        let released = self.units.len();
        self.units.clear();
        released
    }
}
