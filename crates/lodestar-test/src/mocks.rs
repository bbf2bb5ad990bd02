//! Mock transformers and code sources.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lodestar_core::CodeSource;
use lodestar_transform::{BoxError, Transformer};

/// Shared log of `(transformer, unit)` applications, in call order.
pub type CallLog = Arc<Mutex<Vec<(String, String)>>>;

/// Create an empty [`CallLog`].
#[must_use]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Transformer that appends `"+<name>"` to every payload and records the
/// call.
///
/// Several recorders can share one [`CallLog`] to observe chain order.
#[derive(Debug, Clone)]
pub struct RecordingTransformer {
    name: String,
    priority: i32,
    prefix: Option<String>,
    log: CallLog,
}

impl RecordingTransformer {
    /// Create a recorder with its own log.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            prefix: None,
            log: call_log(),
        }
    }

    /// Record into a shared log.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Only target units whose name starts with `prefix`.
    #[must_use]
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The call log.
    #[must_use]
    pub fn log(&self) -> CallLog {
        Arc::clone(&self.log)
    }

    /// Number of recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.log.lock().expect("lock poisoned").len()
    }
}

impl Transformer for RecordingTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid_target(&self, name: &str) -> bool {
        self.prefix.as_deref().is_none_or(|p| name.starts_with(p))
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, name: &str, mut bytes: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        self.log
            .lock()
            .map_err(|_| "call log poisoned")?
            .push((self.name.clone(), name.to_string()));
        bytes.push(b'+');
        bytes.extend_from_slice(self.name.as_bytes());
        Ok(bytes)
    }
}

/// Transformer that always fails.
#[derive(Debug, Clone)]
pub struct FailingTransformer {
    name: String,
    priority: i32,
    message: String,
}

impl FailingTransformer {
    /// Create a failing transformer.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            message: "rewrite rejected".to_string(),
        }
    }

    /// Set the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Transformer for FailingTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid_target(&self, _name: &str) -> bool {
        true
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, _name: &str, _bytes: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        Err(self.message.clone().into())
    }
}

/// Transformer whose validity can be flipped at runtime.
#[derive(Debug)]
pub struct ToggleTransformer {
    inner: RecordingTransformer,
    valid: AtomicBool,
}

impl ToggleTransformer {
    /// Create a transformer that starts valid.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            inner: RecordingTransformer::new(name, priority),
            valid: AtomicBool::new(true),
        }
    }

    /// Flip validity.
    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    /// Number of applications so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

impl Transformer for ToggleTransformer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_valid_target(&self, name: &str) -> bool {
        self.inner.is_valid_target(name)
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn priority(&self) -> i32 {
        self.inner.priority()
    }

    fn apply(&self, name: &str, bytes: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        self.inner.apply(name, bytes)
    }
}

/// Transformer that sleeps before passing bytes through, widening the
/// window for concurrent resolutions to collide.
#[derive(Debug)]
pub struct SlowTransformer {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowTransformer {
    /// Create a transformer that sleeps for `delay` per application.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of applications so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transformer for SlowTransformer {
    fn name(&self) -> &str {
        "slow"
    }

    fn is_valid_target(&self, _name: &str) -> bool {
        true
    }

    fn apply(&self, _name: &str, bytes: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(bytes)
    }
}

/// Source wrapper that counts lookups per unit name.
#[derive(Debug)]
pub struct CountingSource<S> {
    inner: S,
    lookups: Mutex<HashMap<String, usize>>,
}

impl<S: CodeSource> CountingSource<S> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lookups: Mutex::new(HashMap::new()),
        }
    }

    /// Lookups recorded for `name`.
    ///
    /// # Panics
    ///
    /// Panics if the counter mutex is poisoned.
    #[must_use]
    pub fn lookups(&self, name: &str) -> usize {
        self.lookups
            .lock()
            .expect("lock poisoned")
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Total lookups across all names.
    ///
    /// # Panics
    ///
    /// Panics if the counter mutex is poisoned.
    #[must_use]
    pub fn total_lookups(&self) -> usize {
        self.lookups.lock().expect("lock poisoned").values().sum()
    }
}

impl<S: CodeSource> CodeSource for CountingSource<S> {
    fn lookup(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        if let Ok(mut lookups) = self.lookups.lock() {
            let count = lookups.entry(name.to_string()).or_insert(0);
            *count = count.saturating_add(1);
        }
        self.inner.lookup(name)
    }

    fn describe(&self) -> String {
        format!("counting({})", self.inner.describe())
    }
}
