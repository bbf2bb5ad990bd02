//! Test harness helpers.

use std::thread;

use tracing_subscriber::EnvFilter;

/// Set up test logging with the given filter.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .with_thread_names(true)
        .try_init();
}

/// Set up test logging at warn level.
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// Run `f` on `threads` threads released together by a barrier and collect
/// the results in thread order.
///
/// # Panics
///
/// Panics if any thread panics.
pub fn run_concurrently<T, F>(threads: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let barrier = std::sync::Arc::new(std::sync::Barrier::new(threads));
    let f = std::sync::Arc::new(f);
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let barrier = std::sync::Arc::clone(&barrier);
            let f = std::sync::Arc::clone(&f);
            thread::Builder::new()
                .name(format!("resolver-{i}"))
                .spawn(move || {
                    barrier.wait();
                    f(i)
                })
                .expect("Failed to spawn thread")
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect()
}
