//! Dependency installer port.
//!
//! On constrained platforms the backend's Python dependencies may be
//! missing on first run. The supervisor invokes this collaborator with
//! the resolved interpreter path before spawning; the boolean result
//! feeds logging and the patience-notice flow but is otherwise opaque.
//! Installation failure is never fatal — launch continues optimistically.

use async_trait::async_trait;
use std::path::Path;

/// Port for installing the backend's Python dependencies.
#[async_trait]
pub trait DependencyInstallerPort: Send + Sync {
    /// Ensure backend dependencies are importable for `python`.
    ///
    /// Returns whether installation (or verification) succeeded.
    async fn ensure_dependencies(&self, python: &Path) -> bool;
}

/// Installer that does nothing and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstaller;

#[async_trait]
impl DependencyInstallerPort for NoopInstaller {
    async fn ensure_dependencies(&self, _python: &Path) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_installer_reports_success() {
        let installer = NoopInstaller;
        assert!(installer.ensure_dependencies(Path::new("python3")).await);
    }
}
