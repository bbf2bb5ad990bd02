//! Diagnostic toggles: verbose pipeline tracing and transformed-unit dumps.
//!
//! Purely observational. Nothing here can make a resolution fail.

use std::path::{Path, PathBuf};

use lodestar_core::{is_valid_unit_name, unit_path};
use tracing::{debug, warn};

/// Enables verbose tracing (and dumping) when set to a truthy value.
pub const DEBUG_ENV: &str = "LODESTAR_LOADER_DEBUG";
/// Enables dumping of transformed units when set to a truthy value.
pub const DUMP_ENV: &str = "LODESTAR_LOADER_DUMP";
/// Dump directory used when dumping is switched on through the environment.
pub const DEFAULT_DUMP_DIR: &str = "units";

const DUMP_EXTENSION: &str = "unit";

/// Diagnostic settings shared by every loader of a context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    trace: bool,
    dump_dir: Option<PathBuf>,
}

impl Diagnostics {
    /// Everything off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle verbose pipeline tracing.
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Persist every transformed unit below `dir`.
    #[must_use]
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    /// Build from the two boolean switches. `debug` implies `dump`.
    #[must_use]
    pub fn from_flags(debug: bool, dump: bool) -> Self {
        let mut diagnostics = Self::new().with_trace(debug);
        if debug || dump {
            diagnostics.dump_dir = Some(PathBuf::from(DEFAULT_DUMP_DIR));
        }
        diagnostics
    }

    /// Read [`DEBUG_ENV`] and [`DUMP_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_flags(env_flag(DEBUG_ENV), env_flag(DUMP_ENV))
    }

    /// Whether verbose tracing is on.
    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.trace
    }

    /// The dump directory, if dumping is on.
    #[must_use]
    pub fn dump_dir(&self) -> Option<&Path> {
        self.dump_dir.as_deref()
    }

    /// Write `bytes` to `<dump_dir>/<qualified/name/as/path>.unit`.
    ///
    /// Returns the written path. Failures are logged and swallowed.
    pub fn dump(&self, name: &str, bytes: &[u8]) -> Option<PathBuf> {
        let dir = self.dump_dir.as_ref()?;
        if !is_valid_unit_name(name) {
            warn!(unit = name, "Skipping dump of unmappable unit name");
            return None;
        }

        let path = dir.join(unit_path(name, DUMP_EXTENSION));
        let result = match path.parent() {
            Some(parent) => std::fs::create_dir_all(parent),
            None => Ok(()),
        }
        .and_then(|()| std::fs::write(&path, bytes));

        match result {
            Ok(()) => {
                debug!(unit = name, path = %path.display(), "Dumped transformed unit");
                Some(path)
            },
            Err(e) => {
                warn!(
                    unit = name,
                    path = %path.display(),
                    error = %e,
                    "Failed to dump transformed unit"
                );
                None
            },
        }
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .is_ok_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_silent() {
        let diagnostics = Diagnostics::new();
        assert!(!diagnostics.is_tracing());
        assert!(diagnostics.dump_dir().is_none());
        assert!(diagnostics.dump("a.B", b"x").is_none());
    }

    #[test]
    fn test_debug_implies_dump() {
        let diagnostics = Diagnostics::from_flags(true, false);
        assert!(diagnostics.is_tracing());
        assert_eq!(diagnostics.dump_dir(), Some(Path::new(DEFAULT_DUMP_DIR)));

        let dump_only = Diagnostics::from_flags(false, true);
        assert!(!dump_only.is_tracing());
        assert!(dump_only.dump_dir().is_some());
    }

    #[test]
    fn test_dump_mirrors_qualified_name() {
        let dir = tempfile::tempdir().unwrap();
        let diagnostics = Diagnostics::new().with_dump_dir(dir.path());

        let path = diagnostics.dump("host.api.Registry", b"patched").unwrap();
        assert_eq!(
            path,
            dir.path().join("host").join("api").join("Registry.unit")
        );
        assert_eq!(std::fs::read(path).unwrap(), b"patched");
    }

    #[test]
    fn test_dump_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("host");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let diagnostics = Diagnostics::new().with_dump_dir(dir.path());
        assert!(diagnostics.dump("host.Api", b"x").is_none());
        assert!(diagnostics.dump("..bad", b"x").is_none());
    }
}
