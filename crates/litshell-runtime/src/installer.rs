//! pip-based dependency installer.
//!
//! Thin adapter for the installer port: one pip invocation against a
//! requirements file, preferring binary wheels so constrained hosts
//! without build toolchains still succeed. Anything beyond that single
//! call (environment bundling, version pinning policy) is out of scope.

use async_trait::async_trait;
use litshell_core::DependencyInstallerPort;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

/// Installs backend requirements with `python -m pip`.
#[derive(Debug, Clone)]
pub struct PipInstaller {
    requirements: PathBuf,
}

impl PipInstaller {
    /// Installer driven by the given requirements file.
    #[must_use]
    pub fn new(requirements: impl Into<PathBuf>) -> Self {
        Self {
            requirements: requirements.into(),
        }
    }
}

#[async_trait]
impl DependencyInstallerPort for PipInstaller {
    async fn ensure_dependencies(&self, python: &Path) -> bool {
        if !self.requirements.exists() {
            warn!(
                requirements = %self.requirements.display(),
                "requirements file missing, skipping installation"
            );
            return false;
        }

        info!(
            python = %python.display(),
            requirements = %self.requirements.display(),
            "installing backend requirements"
        );
        let result = Command::new(python)
            .arg("-m")
            .arg("pip")
            .arg("install")
            .arg("--prefer-binary")
            .arg("-r")
            .arg(&self.requirements)
            .status()
            .await;

        match result {
            Ok(status) if status.success() => {
                info!("backend requirements installed");
                true
            }
            Ok(status) => {
                warn!(code = ?status.code(), "pip exited with failure");
                false
            }
            Err(e) => {
                warn!(error = %e, "failed to run pip");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_requirements_file_reports_failure() {
        let installer = PipInstaller::new("/nonexistent/requirements.txt");
        assert!(!installer.ensure_dependencies(Path::new("python3")).await);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn successful_install_command_reports_success() {
        let dir = TempDir::new().unwrap();
        let requirements = dir.path().join("requirements.txt");
        std::fs::write(&requirements, "streamlit\n").unwrap();

        // `true` ignores the pip arguments and exits 0.
        let installer = PipInstaller::new(&requirements);
        assert!(installer.ensure_dependencies(Path::new("true")).await);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn failing_install_command_reports_failure() {
        let dir = TempDir::new().unwrap();
        let requirements = dir.path().join("requirements.txt");
        std::fs::write(&requirements, "streamlit\n").unwrap();

        let installer = PipInstaller::new(&requirements);
        assert!(!installer.ensure_dependencies(Path::new("false")).await);
    }
}
