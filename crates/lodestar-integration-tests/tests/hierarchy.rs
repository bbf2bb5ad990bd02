//! Integration tests for root delegation and hierarchy fallback.

use std::sync::Arc;

use lodestar_core::MemorySource;
use lodestar_loader::{Diagnostics, LoaderContext, LoaderError};
use lodestar_test::RecordingTransformer;

fn context() -> LoaderContext {
    let host = MemorySource::new("host").with_unit("host.Shared", b"shared".to_vec());
    LoaderContext::init(Arc::new(host), Diagnostics::new())
}

#[test]
fn test_fallback_reaches_second_child() {
    let ctx = context();
    let l = ctx.create_loader("L", Arc::new(MemorySource::new("l"))).unwrap();
    let a = l.spawn_child("A", Arc::new(MemorySource::new("a"))).unwrap();
    let b = l
        .spawn_child("B", Arc::new(MemorySource::new("b").with_unit("X", b"x".to_vec())))
        .unwrap();

    let unit = l.resolve("X").unwrap();
    assert_eq!(unit.bytes(), b"x");
    assert_eq!(unit.defined_by(), "B");
    assert!(b.is_defined_locally("X"));
    assert!(!a.is_defined_locally("X"));
    assert!(!l.is_defined_locally("X"));
}

#[test]
fn test_total_miss_trail_references_every_loader() {
    let ctx = context();
    let l = ctx.create_loader("L", Arc::new(MemorySource::new("l"))).unwrap();
    l.spawn_child("A", Arc::new(MemorySource::new("a"))).unwrap();
    l.spawn_child("B", Arc::new(MemorySource::new("b"))).unwrap();

    let LoaderError::NotFound(miss) = l.resolve("X").unwrap_err() else {
        panic!("expected NotFound");
    };
    assert_eq!(miss.name, "X");
    assert_eq!(miss.searched(), vec!["root", "L", "A", "B"]);
    for loader in ["L", "A", "B"] {
        assert!(miss.references(loader), "{loader} missing from trail");
    }
    let message = miss.to_string();
    assert!(message.contains("memory:a"));
}

#[test]
fn test_shared_symbols_identical_across_extensions() {
    let ctx = context();
    let tagger = RecordingTransformer::new("tag", 0);
    ctx.register_transformer(Arc::new(tagger.clone()));

    let first = ctx.create_loader("one", Arc::new(MemorySource::new("one"))).unwrap();
    let second = ctx
        .create_loader(
            "two",
            // A private copy must never shadow the root's unit.
            Arc::new(MemorySource::new("two").with_unit("host.Shared", b"shadow".to_vec())),
        )
        .unwrap();

    let a = first.resolve("host.Shared").unwrap();
    let b = second.resolve("host.Shared").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.bytes(), b"shared+tag");
    assert_eq!(tagger.calls(), 1);
}

#[test]
fn test_child_units_run_through_shared_pipeline() {
    let ctx = context();
    ctx.register_transformer(Arc::new(RecordingTransformer::new("tag", 0)));
    let l = ctx.create_loader("L", Arc::new(MemorySource::new("l"))).unwrap();
    l.spawn_child(
        "A",
        Arc::new(MemorySource::new("a").with_unit("a.Deep", b"deep".to_vec())),
    )
    .unwrap();

    assert_eq!(l.resolve("a.Deep").unwrap().bytes(), b"deep+tag");
}

#[test]
fn test_teardown_leaves_nothing_reachable() {
    let ctx = context();
    let l = ctx.create_loader("L", Arc::new(MemorySource::new("l"))).unwrap();
    let a = l
        .spawn_child("A", Arc::new(MemorySource::new("a").with_unit("X", b"x".to_vec())))
        .unwrap();
    l.resolve("X").unwrap();
    assert_eq!(a.defined_count(), 1);

    assert!(ctx.release(&l));
    assert!(a.is_torn_down());
    assert_eq!(a.defined_count(), 0);
    assert!(a.parent().is_none());
    assert!(matches!(
        l.resolve("X"),
        Err(LoaderError::InvariantViolation(_))
    ));
}

#[test]
fn test_second_parent_rejected() {
    let ctx = context();
    let p1 = ctx.create_loader("P1", Arc::new(MemorySource::new("p1"))).unwrap();
    let p2 = ctx.create_loader("P2", Arc::new(MemorySource::new("p2"))).unwrap();
    let child = p1.spawn_child("C", Arc::new(MemorySource::new("c"))).unwrap();

    assert!(matches!(
        p2.add_child(Arc::clone(&child)),
        Err(LoaderError::InvariantViolation(_))
    ));
    assert!(p2.children().is_empty());
    assert_eq!(p1.children().len(), 1);
}
