//! Launch configuration for the backend subprocess.
//!
//! This is an intent-based configuration — it expresses what the caller
//! wants launched, not how the runtime spawns or supervises it. It is
//! constructed once by the composition root (environment resolver) and
//! is immutable for the lifetime of a launch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default base port for the upward scan (Streamlit's own default).
pub const DEFAULT_BASE_PORT: u16 = 8501;

/// Default ceiling for the port scan. Exhaustion falls back to the base
/// port rather than looping forever.
pub const DEFAULT_PORT_SCAN_ATTEMPTS: u16 = 100;

/// Capability descriptor for the host platform.
///
/// Computed once and passed into the supervisor, instead of re-deriving
/// architecture checks at every decision point. Constrained platforms
/// (ARM devices doing first-run setup) get a patience notice and an
/// extended deadline instead of an immediate fatal timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Whether startup is expected to be slow (e.g. first run on ARM).
    pub constrained: bool,
}

impl PlatformProfile {
    /// Detect the profile for the current host.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            constrained: std::env::consts::ARCH == "aarch64",
        }
    }

    /// Profile for a constrained (slow first-run) platform.
    #[must_use]
    pub const fn constrained() -> Self {
        Self { constrained: true }
    }
}

/// Startup deadlines for the timeout supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupTimeouts {
    /// First deadline: readiness expected within this window.
    pub initial: Duration,
    /// Second deadline armed on constrained platforms after the first
    /// expires with a patience notice.
    pub extended: Duration,
    /// Delay between sentinel detection and acting on readiness, to let
    /// the server finish binding its socket. Empirical, not load-bearing.
    pub grace: Duration,
}

impl Default for StartupTimeouts {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(60),
            extended: Duration::from_secs(120),
            grace: Duration::from_secs(1),
        }
    }
}

/// Configuration for launching the backend subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Python interpreter used to run the backend.
    pub python: PathBuf,
    /// Streamlit entry script.
    pub script: PathBuf,
    /// Working directory for the subprocess.
    pub app_dir: PathBuf,
    /// Extra environment variables appended to the inherited environment.
    pub extra_env: Vec<(String, String)>,
    /// Start of the upward port scan.
    pub base_port: u16,
    /// Ceiling for the port scan.
    pub port_scan_attempts: u16,
    /// Host capability descriptor.
    pub platform: PlatformProfile,
    /// Startup deadlines.
    pub timeouts: StartupTimeouts,
    /// Additional arguments appended to the Streamlit invocation.
    pub extra_args: Vec<String>,
}

impl LaunchConfig {
    /// Create a configuration with required fields and defaults.
    #[must_use]
    pub fn new(
        python: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
        app_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            python: python.into(),
            script: script.into(),
            app_dir: app_dir.into(),
            extra_env: Vec::new(),
            base_port: DEFAULT_BASE_PORT,
            port_scan_attempts: DEFAULT_PORT_SCAN_ATTEMPTS,
            platform: PlatformProfile::default(),
            timeouts: StartupTimeouts::default(),
            extra_args: Vec::new(),
        }
    }

    /// Set the base port for allocation.
    #[must_use]
    pub const fn with_base_port(mut self, port: u16) -> Self {
        self.base_port = port;
        self
    }

    /// Set the port scan ceiling.
    #[must_use]
    pub const fn with_port_scan_attempts(mut self, attempts: u16) -> Self {
        self.port_scan_attempts = attempts;
        self
    }

    /// Set the platform profile.
    #[must_use]
    pub const fn with_platform(mut self, platform: PlatformProfile) -> Self {
        self.platform = platform;
        self
    }

    /// Set the startup deadlines.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: StartupTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Append an environment variable for the subprocess.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((key.into(), value.into()));
        self
    }

    /// Append extra arguments to the Streamlit invocation.
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_streamlit_conventions() {
        let config = LaunchConfig::new("python3", "gui.py", ".");
        assert_eq!(config.base_port, 8501);
        assert_eq!(config.port_scan_attempts, 100);
        assert!(!config.platform.constrained);
        assert_eq!(config.timeouts.initial, Duration::from_secs(60));
        assert_eq!(config.timeouts.extended, Duration::from_secs(120));
    }

    #[test]
    fn builder_overrides() {
        let config = LaunchConfig::new("python3", "gui.py", ".")
            .with_base_port(9000)
            .with_platform(PlatformProfile::constrained())
            .with_env("PYTHONUTF8", "1");
        assert_eq!(config.base_port, 9000);
        assert!(config.platform.constrained);
        assert_eq!(
            config.extra_env,
            vec![("PYTHONUTF8".to_string(), "1".to_string())]
        );
    }
}
