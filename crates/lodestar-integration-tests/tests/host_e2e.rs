//! End-to-end tests: configuration, discovery, activation, resolution,
//! persistence and shutdown through the extension host.

use std::sync::Arc;

use lodestar_catalog::PrototypeKey;
use lodestar_core::DirectorySource;
use lodestar_loader::{Diagnostics, LoaderContext, LoaderError};
use lodestar_runtime::{ExtensionHost, HostError};
use lodestar_test::{RecordingTransformer, TestWorkspace};

fn key(name: &str, version: &str) -> PrototypeKey {
    PrototypeKey::new(name, version)
}

#[test]
fn test_full_lifecycle() {
    let ws = TestWorkspace::new();
    ws.host_unit("host.api.Registry", b"registry");
    ws.extension("core", "1.0")
        .unit("core.Main", b"main")
        .nested("compat", "compat")
        .nested_unit("compat", "core.compat.Shim", b"shim")
        .write();
    ws.extension("ui", "2.0").unit("ui.Panel", b"panel").write();
    let config_path = ws.write_config(&["core@1.0"]);

    let dump = ws.path().join("dump");
    let context = LoaderContext::init(
        Arc::new(DirectorySource::new(ws.host_dir())),
        Diagnostics::new().with_trace(true).with_dump_dir(&dump),
    );
    context.register_transformer(Arc::new(RecordingTransformer::new("tag", 0)));
    let mut host = ExtensionHost::open(context, &config_path).unwrap();

    host.discover().unwrap();
    let report = host.activate_enabled();
    assert_eq!(report.activated, vec![key("core", "1.0")]);

    let core = key("core", "1.0");
    assert_eq!(
        host.resolve(&core, "host.api.Registry").unwrap().bytes(),
        b"registry+tag"
    );
    assert_eq!(host.resolve(&core, "core.Main").unwrap().bytes(), b"main+tag");
    assert_eq!(
        host.resolve(&core, "core.compat.Shim").unwrap().defined_by(),
        "compat"
    );
    assert_eq!(
        std::fs::read(dump.join("core/Main.unit")).unwrap(),
        b"main+tag"
    );

    let Err(HostError::Loader(LoaderError::NotFound(miss))) = host.resolve(&core, "ui.Panel")
    else {
        panic!("expected NotFound");
    };
    assert_eq!(miss.searched(), vec!["root", "core@1.0", "compat"]);

    host.set_enabled(&key("ui", "2.0"), true).unwrap();
    host.activate(&key("ui", "2.0")).unwrap();
    host.save_config().unwrap();
    host.shutdown();

    let saved = lodestar_config::load(&config_path).unwrap();
    let mut tokens = saved.extensions.enabled;
    tokens.sort();
    assert_eq!(tokens, vec!["core@1.0", "ui@2.0"]);
}

#[test]
fn test_rescan_after_folder_change() {
    let first = TestWorkspace::new();
    first.extension("core", "1.0").unit("core.Main", b"a").write();
    let second = TestWorkspace::new();
    second.extension("other", "1.0").unit("other.Main", b"b").write();

    let context = LoaderContext::init(
        Arc::new(DirectorySource::new(first.host_dir())),
        Diagnostics::new(),
    );
    let mut host = ExtensionHost::open(context, first.write_config(&["core@1.0"])).unwrap();
    let before = host.discover().unwrap();
    assert!(Arc::ptr_eq(&before, &host.discover().unwrap()));

    host.config_mut().folder_extensions = second.extensions_dir();
    let after = host.discover().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.len(), 1);
    assert!(after.enabled().is_empty());
}
