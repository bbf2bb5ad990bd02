//! Post-parse configuration validation.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::types::LauncherConfig;

/// Validate a deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &LauncherConfig) -> ConfigResult<()> {
    validate_paths(config)?;
    validate_authority(&config.extension_repository_authority)?;
    Ok(())
}

fn validate_paths(config: &LauncherConfig) -> ConfigResult<()> {
    for (field, path) in [
        ("target-jar", &config.target_jar),
        ("folder-extensions", &config.folder_extensions),
        ("folder-patches", &config.folder_patches),
        ("folder-data", &config.folder_data),
    ] {
        if is_blank(path) {
            return Err(ConfigError::ValidationError {
                field: field.to_owned(),
                message: "path must not be empty".to_owned(),
            });
        }
    }
    Ok(())
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

fn validate_authority(authority: &str) -> ConfigResult<()> {
    let field = "extension-repository-authority";
    let parsed = url::Url::parse(authority).map_err(|e| ConfigError::ValidationError {
        field: field.to_owned(),
        message: format!("invalid URL '{authority}': {e}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: format!(
                "unsupported scheme '{}'; expected http or https",
                parsed.scheme()
            ),
        });
    }
    if parsed.host_str().is_none() {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: format!("URL '{authority}' has no host"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&LauncherConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_folder_rejected() {
        let config = LauncherConfig {
            folder_data: PathBuf::from("  "),
            ..LauncherConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "folder-data")
        );
    }

    #[test]
    fn test_authority_scheme() {
        let config = LauncherConfig {
            extension_repository_authority: "ftp://mirror.example/".to_owned(),
            ..LauncherConfig::default()
        };
        assert!(validate(&config).is_err());

        let config = LauncherConfig {
            extension_repository_authority: "not a url".to_owned(),
            ..LauncherConfig::default()
        };
        assert!(validate(&config).is_err());

        let config = LauncherConfig {
            extension_repository_authority: "http://mirror.example:8080/repo/".to_owned(),
            ..LauncherConfig::default()
        };
        assert!(validate(&config).is_ok());
    }
}
