//! Integration tests for the define-once guarantee under contention.

use std::sync::Arc;
use std::time::Duration;

use lodestar_core::MemorySource;
use lodestar_loader::{Diagnostics, LoaderContext};
use lodestar_test::{CountingSource, SlowTransformer, run_concurrently};

const THREADS: usize = 16;

#[test]
fn test_concurrent_root_resolution_defines_once() {
    let source = Arc::new(CountingSource::new(
        MemorySource::new("host").with_unit("host.Hot", b"hot".to_vec()),
    ));
    let slow = Arc::new(SlowTransformer::new(Duration::from_millis(20)));
    let ctx = Arc::new(LoaderContext::init(source.clone(), Diagnostics::new()));
    ctx.register_transformer(slow.clone());

    let shared = Arc::clone(&ctx);
    let units = run_concurrently(THREADS, move |_| shared.root().resolve("host.Hot").unwrap());

    assert_eq!(slow.calls(), 1);
    assert_eq!(source.lookups("host.Hot"), 1);
    assert_eq!(ctx.root().define_passes(), 1);
    assert!(units.iter().all(|u| Arc::ptr_eq(u, &units[0])));
}

#[test]
fn test_concurrent_extension_resolution_defines_once() {
    let slow = Arc::new(SlowTransformer::new(Duration::from_millis(20)));
    let ctx = Arc::new(LoaderContext::init(
        Arc::new(MemorySource::new("host")),
        Diagnostics::new(),
    ));
    ctx.register_transformer(slow.clone());
    let loader = ctx
        .create_loader(
            "ext",
            Arc::new(MemorySource::new("ext").with_unit("ext.Own", b"own".to_vec())),
        )
        .unwrap();

    let shared = Arc::clone(&loader);
    let units = run_concurrently(THREADS, move |_| shared.resolve("ext.Own").unwrap());

    assert_eq!(slow.calls(), 1);
    assert_eq!(loader.defined_count(), 1);
    assert!(units.iter().all(|u| Arc::ptr_eq(u, &units[0])));
    assert_eq!(units[0].defined_by(), "ext");
}

#[test]
fn test_sequential_resolution_defines_once() {
    let source = Arc::new(CountingSource::new(
        MemorySource::new("host").with_unit("host.Api", b"api".to_vec()),
    ));
    let ctx = LoaderContext::init(source.clone(), Diagnostics::new());

    let first = ctx.root().resolve("host.Api").unwrap();
    for _ in 0..10 {
        assert!(Arc::ptr_eq(&first, &ctx.root().resolve("host.Api").unwrap()));
    }
    assert_eq!(source.lookups("host.Api"), 1);
}
