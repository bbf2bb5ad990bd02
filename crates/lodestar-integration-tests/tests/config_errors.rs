//! Integration tests for all-or-nothing configuration loading.

use lodestar_config::{ConfigError, LauncherConfig};
use lodestar_test::TestWorkspace;

fn write_without(ws: &TestWorkspace, field: &str) -> std::path::PathBuf {
    let path = ws.write_config(&["core@1.0"]);
    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    value.as_object_mut().unwrap().remove(field);
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

#[test]
fn test_missing_folder_extensions_keeps_defaults() {
    let ws = TestWorkspace::new();
    let path = write_without(&ws, "folder-extensions");

    let mut config = LauncherConfig::default();
    let before = config.clone();
    let err = config.reload(&path).unwrap_err();

    assert!(
        matches!(err, ConfigError::MissingField { ref field, .. } if field == "folder-extensions")
    );
    assert_eq!(config, before);
}

#[test]
fn test_every_required_field_is_checked() {
    for field in [
        "target-jar",
        "do-extensions",
        "do-patches",
        "folder-patches",
        "folder-data",
        "extensions",
    ] {
        let ws = TestWorkspace::new();
        let path = write_without(&ws, field);
        assert!(
            matches!(
                lodestar_config::load(&path),
                Err(ConfigError::MissingField { .. })
            ),
            "{field}"
        );
    }
}

#[test]
fn test_invalid_authority_rejected() {
    let ws = TestWorkspace::new();
    let path = ws.write_config(&[]);
    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    value["extension-repository-authority"] = serde_json::json!("gopher://old.example/");
    std::fs::write(&path, value.to_string()).unwrap();

    assert!(matches!(
        lodestar_config::load(&path),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn test_save_of_load_is_stable() {
    let ws = TestWorkspace::new();
    let path = ws.write_config(&["core@1.0"]);
    let config = lodestar_config::load(&path).unwrap();

    let out = ws.path().join("resaved.json");
    config.save(&out).unwrap();
    let once = std::fs::read_to_string(&out).unwrap();
    lodestar_config::load(&out).unwrap().save(&out).unwrap();
    assert_eq!(once, std::fs::read_to_string(&out).unwrap());
}
