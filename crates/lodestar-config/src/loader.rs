//! Reading and writing the configuration file.

use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::LauncherConfig;
use crate::validate;

/// Fields that must be present in a persisted configuration.
pub const REQUIRED_FIELDS: &[&str] = &[
    "target-jar",
    "do-extensions",
    "do-patches",
    "folder-extensions",
    "folder-patches",
    "folder-data",
    "extensions",
    "extensions.enabled",
];

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load and validate a configuration file.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, a
/// required field is missing, or validation fails.
pub fn load(path: &Path) -> ConfigResult<LauncherConfig> {
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    check_required(path, &value)?;

    let config: LauncherConfig =
        serde_json::from_value(value).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;

    validate::validate(&config)?;
    debug!(path = %path.display(), "Loaded launcher configuration");
    Ok(config)
}

/// Load `path`, or fall back to defaults if it does not exist.
///
/// When falling back, the default extensions folder is created so a fresh
/// install can be scanned immediately. Nothing is written to `path`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file exists but cannot be loaded, or the
/// extensions folder cannot be created.
pub fn open(path: &Path) -> ConfigResult<LauncherConfig> {
    match std::fs::metadata(path) {
        Ok(_) => load(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let config = LauncherConfig::default();
            std::fs::create_dir_all(&config.folder_extensions).map_err(|e| {
                ConfigError::WriteError {
                    path: config.folder_extensions.display().to_string(),
                    source: e,
                }
            })?;
            info!(path = %path.display(), "No launcher configuration found, using defaults");
            Ok(config)
        },
        Err(e) => Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// Write `config` to `path` as JSON with a four-space indent.
///
/// # Errors
///
/// Returns a [`ConfigError`] if serialization or the write fails.
pub fn save(config: &LauncherConfig, path: &Path) -> ConfigResult<()> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    config
        .serialize(&mut ser)
        .map_err(ConfigError::SerializeError)?;
    buf.push(b'\n');

    std::fs::write(path, &buf).map_err(|e| ConfigError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), bytes = buf.len(), "Saved launcher configuration");
    Ok(())
}

impl LauncherConfig {
    /// Replace `self` with the contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns the load error; `self` is unchanged in that case.
    pub fn reload(&mut self, path: &Path) -> ConfigResult<()> {
        *self = load(path)?;
        Ok(())
    }

    /// Shorthand for [`save`].
    ///
    /// # Errors
    ///
    /// See [`save`].
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        save(self, path)
    }
}

fn check_required(path: &Path, value: &Value) -> ConfigResult<()> {
    for field in REQUIRED_FIELDS {
        let present = field
            .split('.')
            .try_fold(value, |v, key| v.as_object().and_then(|o| o.get(key)))
            .is_some();
        if !present {
            return Err(ConfigError::MissingField {
                path: path.display().to_string(),
                field: (*field).to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"{
        "target-jar": "./jar/host.jar",
        "do-extensions": true,
        "do-patches": false,
        "folder-extensions": "mods/",
        "folder-patches": "patches/",
        "folder-data": "data/",
        "launcher-theme": "dark",
        "extensions": {
            "enabled": ["core@1.0", "stale@0.1"],
            "pinned": true
        }
    }"#;

    fn write(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_sample() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load(&write(tmp.path(), SAMPLE)).unwrap();
        assert_eq!(config.folder_extensions, PathBuf::from("mods/"));
        assert_eq!(config.extensions.enabled, vec!["core@1.0", "stale@0.1"]);
        assert_eq!(
            config.extension_repository_authority,
            crate::DEFAULT_REPOSITORY_AUTHORITY
        );
        assert_eq!(config.extra["launcher-theme"], "dark");
        assert_eq!(config.extensions.extra["pinned"], true);
    }

    #[test]
    fn test_missing_field_leaves_config_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let good = load(&write(tmp.path(), SAMPLE)).unwrap();
        let mut current = good.clone();

        let broken = SAMPLE.replace("\"folder-extensions\": \"mods/\",", "");
        let path = write(tmp.path(), &broken);
        let err = current.reload(&path).unwrap_err();

        match err {
            ConfigError::MissingField { field, .. } => assert_eq!(field, "folder-extensions"),
            other => panic!("expected MissingField, got {other:?}"),
        }
        assert_eq!(current, good);
    }

    #[test]
    fn test_missing_nested_field() {
        let tmp = tempfile::tempdir().unwrap();
        let broken = SAMPLE.replace("\"enabled\": [\"core@1.0\", \"stale@0.1\"],", "");
        let err = load(&write(tmp.path(), &broken)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField { ref field, .. } if field == "extensions.enabled"
        ));
    }

    #[test]
    fn test_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load(&write(tmp.path(), "{ not json")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let broken = SAMPLE.replace("\"do-patches\": false", "\"do-patches\": \"no\"");
        let err = load(&write(tmp.path(), &broken)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let first = load(&write(tmp.path(), SAMPLE)).unwrap();

        let out = tmp.path().join("saved.json");
        save(&first, &out).unwrap();
        let saved_once = std::fs::read_to_string(&out).unwrap();
        assert!(saved_once.contains("\n    \"do-extensions\": true"));

        let second = load(&out).unwrap();
        assert_eq!(first, second);
        save(&second, &out).unwrap();
        assert_eq!(saved_once, std::fs::read_to_string(&out).unwrap());
    }

    #[test]
    fn test_load_nonexistent() {
        let err = load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_open_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = open(&write(tmp.path(), SAMPLE)).unwrap();
        assert_eq!(config.target_jar, PathBuf::from("./jar/host.jar"));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("big.json");
        let body = " ".repeat(1_048_577);
        std::fs::write(&path, body).unwrap();
        assert!(matches!(
            load(&path).unwrap_err(),
            ConfigError::ValidationError { .. }
        ));
    }
}
