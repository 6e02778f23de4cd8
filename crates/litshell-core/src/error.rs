//! Errors surfaced by the backend runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while launching or supervising the backend.
///
/// Fatal user-facing reporting goes through the notifier port with
/// remediation text; these variants are the programmatic side of the
/// same conditions.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The entry script is missing. The app is likely installed wrong.
    #[error("backend script not found: {0}")]
    ScriptNotFound(PathBuf),

    /// No usable Python interpreter could be resolved.
    #[error("no Python interpreter found")]
    PythonNotFound,

    /// The spawn syscall itself failed.
    #[error("failed to spawn backend: {0}")]
    Spawn(String),

    /// The backend did not become ready before the (final) deadline.
    #[error("backend not ready within {0} seconds")]
    StartupTimedOut(u64),

    /// The backend exited before becoming ready.
    #[error("backend terminated unexpectedly (code: {code:?})")]
    Exited {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
    },

    /// The supervisor's monitor went away without reporting a state.
    #[error("backend monitor terminated unexpectedly")]
    MonitorGone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_exit_code() {
        let err = BackendError::Exited { code: Some(1) };
        assert_eq!(
            err.to_string(),
            "backend terminated unexpectedly (code: Some(1))"
        );
    }

    #[test]
    fn display_names_missing_script() {
        let err = BackendError::ScriptNotFound(PathBuf::from("/opt/app/gui.py"));
        assert!(err.to_string().contains("/opt/app/gui.py"));
    }
}
