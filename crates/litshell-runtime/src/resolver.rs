//! Python interpreter and entry-script resolution.
//!
//! The supervisor consumes resolved paths and never searches the
//! filesystem itself; this module is the collaborator that does the
//! searching, including the constrained-platform fallbacks for hosts
//! where the bundled interpreter cannot ship.

use litshell_core::BackendError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};
use which::which;

/// Entry script looked up under the app directory when the caller does
/// not name one explicitly.
pub const DEFAULT_ENTRY_SCRIPT: &str = "gui.py";

/// Directory holding the bundled interpreter inside the resources dir.
const BUNDLED_ENV_DIR: &str = "python-env";

/// Resolve the Python interpreter to launch the backend with.
///
/// Packaged builds prefer the bundled interpreter under
/// `resources_dir/python-env`; when it is missing (common on constrained
/// hosts where the bundle cannot include native wheels), well-known
/// install locations are probed before falling back to whatever is on
/// the PATH. Development builds go straight to the system interpreter.
pub fn resolve_python(
    packaged: bool,
    resources_dir: &Path,
    constrained: bool,
) -> Result<PathBuf, BackendError> {
    if !packaged {
        let python = system_python().ok_or(BackendError::PythonNotFound)?;
        debug!(python = %python.display(), "using development interpreter");
        return Ok(python);
    }

    let bundled = resources_dir.join(BUNDLED_ENV_DIR).join(bundled_relative());
    if bundled.exists() {
        info!(python = %bundled.display(), "using bundled interpreter");
        return Ok(bundled);
    }
    warn!(path = %bundled.display(), "bundled interpreter missing");

    if constrained {
        for candidate in well_known_locations() {
            if candidate.exists() {
                info!(python = %candidate.display(), "using well-known system interpreter");
                return Ok(candidate);
            }
        }
    }

    system_python().ok_or(BackendError::PythonNotFound)
}

/// Resolve the backend entry script under `app_dir`, verifying it exists.
pub fn resolve_script(app_dir: &Path) -> Result<PathBuf, BackendError> {
    let script = app_dir.join(DEFAULT_ENTRY_SCRIPT);
    if script.exists() {
        Ok(script)
    } else {
        Err(BackendError::ScriptNotFound(script))
    }
}

/// Probe whether the backend module is importable for `python`.
///
/// A failed probe (including a broken interpreter path) reports false;
/// the caller decides whether to run the installer.
pub async fn has_streamlit_module(python: &Path) -> bool {
    let probe = Command::new(python)
        .arg("-c")
        .arg("import streamlit")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;

    match probe {
        Ok(status) => status.success(),
        Err(e) => {
            debug!(python = %python.display(), error = %e, "module probe failed to run");
            false
        }
    }
}

fn bundled_relative() -> &'static str {
    if cfg!(windows) {
        "Scripts/python.exe"
    } else {
        "bin/python"
    }
}

fn well_known_locations() -> Vec<PathBuf> {
    if cfg!(windows) {
        ["Python312", "Python311", "Python310", "Python39"]
            .iter()
            .flat_map(|v| {
                [
                    PathBuf::from(format!("C:\\Program Files\\{v}\\python.exe")),
                    PathBuf::from(format!("C:\\{v}\\python.exe")),
                ]
            })
            .collect()
    } else {
        vec![
            PathBuf::from("/usr/local/bin/python3"),
            PathBuf::from("/opt/homebrew/bin/python3"),
            PathBuf::from("/usr/bin/python3"),
        ]
    }
}

fn system_python() -> Option<PathBuf> {
    which("python3").or_else(|_| which("python")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn bundled_interpreter_is_preferred() {
        let dir = TempDir::new().unwrap();
        let bundled = dir.path().join(BUNDLED_ENV_DIR).join(bundled_relative());
        std::fs::create_dir_all(bundled.parent().unwrap()).unwrap();
        std::fs::write(&bundled, "").unwrap();

        let resolved = resolve_python(true, dir.path(), false).unwrap();
        assert_eq!(resolved, bundled);
    }

    #[test]
    fn missing_script_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_script(dir.path()).unwrap_err();
        assert!(matches!(err, BackendError::ScriptNotFound(_)));
    }

    #[test]
    fn present_script_resolves() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_ENTRY_SCRIPT), "import streamlit").unwrap();
        let script = resolve_script(dir.path()).unwrap();
        assert!(script.ends_with(DEFAULT_ENTRY_SCRIPT));
    }

    #[tokio::test]
    async fn module_probe_reports_false_for_broken_interpreter() {
        assert!(!has_streamlit_module(Path::new("/nonexistent/python")).await);
    }
}
