//! Transformer registry.
//!
//! Holds registered transformers and applies the filtered, ordered chain to
//! a single code unit.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::{TransformError, TransformResult};
use crate::transformer::Transformer;

/// Registry of transformers.
///
/// Registration is append-only. The list is read-mostly: `apply_all` copies
/// an `Arc` snapshot out of the lock so transformers never run while the
/// lock is held, and a concurrent `register` only affects later calls.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: RwLock<Vec<Arc<dyn Transformer>>>,
}

impl TransformerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer.
    ///
    /// Registration order breaks priority ties.
    pub fn register(&self, transformer: Arc<dyn Transformer>) {
        info!(
            transformer = transformer.name(),
            priority = transformer.priority(),
            "Registered transformer"
        );
        self.transformers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(transformer);
    }

    /// Number of registered transformers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no transformer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Names of all registered transformers in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// The chain that would run for `name` right now, in execution order.
    ///
    /// Filters on [`Transformer::is_valid_target`] and
    /// [`Transformer::is_valid`], then stable-sorts by priority so equal
    /// priorities keep registration order.
    #[must_use]
    pub fn applicable(&self, name: &str) -> Vec<Arc<dyn Transformer>> {
        let mut chain: Vec<Arc<dyn Transformer>> = self
            .snapshot()
            .into_iter()
            .filter(|t| t.is_valid_target(name) && t.is_valid())
            .collect();
        chain.sort_by_key(|t| t.priority());
        chain
    }

    /// Apply the chain for `name` to `bytes`.
    ///
    /// Each transformer receives the previous one's output.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] naming the first transformer that failed.
    /// The partially transformed bytes are dropped.
    pub fn apply_all(&self, name: &str, bytes: Vec<u8>) -> TransformResult<Vec<u8>> {
        let chain = self.applicable(name);
        if chain.is_empty() {
            return Ok(bytes);
        }

        debug!(unit = name, chain_len = chain.len(), "Applying transformer chain");

        let mut current = bytes;
        for transformer in chain {
            current = transformer
                .apply(name, current)
                .map_err(|source| TransformError {
                    transformer: transformer.name().to_string(),
                    unit: name.to_string(),
                    source,
                })?;
        }
        Ok(current)
    }

    fn snapshot(&self) -> Vec<Arc<dyn Transformer>> {
        self.transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("transformers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::error::BoxError;

    /// Appends its own tag to the payload and records that it ran.
    struct Tagger {
        tag: &'static str,
        priority: i32,
        prefix: &'static str,
        enabled: AtomicBool,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Tagger {
        fn new(tag: &'static str, priority: i32, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self {
                tag,
                priority,
                prefix: "",
                enabled: AtomicBool::new(true),
                fail: false,
                log: Arc::clone(log),
            }
        }
    }

    impl Transformer for Tagger {
        fn name(&self) -> &str {
            self.tag
        }

        fn is_valid_target(&self, name: &str) -> bool {
            name.starts_with(self.prefix)
        }

        fn is_valid(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn apply(&self, _name: &str, mut bytes: Vec<u8>) -> Result<Vec<u8>, BoxError> {
            self.log.lock().unwrap().push(self.tag);
            if self.fail {
                return Err(format!("{} refused", self.tag).into());
            }
            bytes.extend_from_slice(self.tag.as_bytes());
            Ok(bytes)
        }
    }

    fn log() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_empty_registry_is_identity() {
        let registry = TransformerRegistry::new();
        let out = registry.apply_all("a.B", b"raw".to_vec()).unwrap();
        assert_eq!(out, b"raw");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ascending_priority_regardless_of_registration() {
        let log = log();
        let registry = TransformerRegistry::new();
        registry.register(Arc::new(Tagger::new("c", 50, &log)));
        registry.register(Arc::new(Tagger::new("a", -10_000, &log)));
        registry.register(Arc::new(Tagger::new("b", 0, &log)));

        let out = registry.apply_all("a.B", b">".to_vec()).unwrap();
        assert_eq!(out, b">abc");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let log = log();
        let registry = TransformerRegistry::new();
        registry.register(Arc::new(Tagger::new("first", 7, &log)));
        registry.register(Arc::new(Tagger::new("second", 7, &log)));
        registry.register(Arc::new(Tagger::new("early", -1, &log)));
        registry.register(Arc::new(Tagger::new("third", 7, &log)));

        registry.apply_all("x.Y", Vec::new()).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["early", "first", "second", "third"]
        );
    }

    #[test]
    fn test_filters_targets_and_validity_at_call_time() {
        let log = log();
        let registry = TransformerRegistry::new();
        let mut scoped = Tagger::new("scoped", 0, &log);
        scoped.prefix = "mod.";
        let toggle = Arc::new(Tagger::new("toggle", 1, &log));
        registry.register(Arc::new(scoped));
        registry.register(Arc::clone(&toggle) as Arc<dyn Transformer>);

        assert_eq!(registry.apply_all("host.A", Vec::new()).unwrap(), b"toggle");
        assert_eq!(
            registry.apply_all("mod.A", Vec::new()).unwrap(),
            b"scopedtoggle"
        );

        toggle.enabled.store(false, Ordering::SeqCst);
        assert_eq!(registry.apply_all("mod.A", Vec::new()).unwrap(), b"scoped");
        assert_eq!(registry.applicable("host.A").len(), 0);
    }

    #[test]
    fn test_failure_aborts_chain() {
        let log = log();
        let registry = TransformerRegistry::new();
        let mut failing = Tagger::new("broken", 0, &log);
        failing.fail = true;
        registry.register(Arc::new(Tagger::new("before", -1, &log)));
        registry.register(Arc::new(failing));
        registry.register(Arc::new(Tagger::new("after", 1, &log)));

        let err = registry.apply_all("a.B", b"raw".to_vec()).unwrap_err();
        assert_eq!(err.transformer, "broken");
        assert_eq!(err.unit, "a.B");
        assert!(err.to_string().contains("broken refused"));
        assert_eq!(*log.lock().unwrap(), vec!["before", "broken"]);
    }

    #[test]
    fn test_names_in_registration_order() {
        let log = log();
        let registry = TransformerRegistry::new();
        registry.register(Arc::new(Tagger::new("z", -5, &log)));
        registry.register(Arc::new(Tagger::new("y", 5, &log)));
        assert_eq!(registry.names(), vec!["z", "y"]);
        assert_eq!(registry.len(), 2);
    }
}
