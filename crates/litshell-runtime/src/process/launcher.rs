//! Backend subprocess launch.

use litshell_core::LaunchConfig;
use std::io;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

/// Spawn the Streamlit backend on `port`.
///
/// Fire-and-forget: returns as soon as the spawn syscall completes; the
/// caller does not block waiting for the server to be ready. Paths are
/// expected to have been validated by the resolver beforehand; only the
/// spawn syscall's own failure is caught here.
///
/// The child inherits the parent environment augmented with
/// `PYTHONUNBUFFERED=1` so the readiness sentinel reaches the stdout
/// watcher promptly instead of sitting in Python's output buffer. On
/// Unix the child is placed in its own process group so shutdown can
/// signal the whole descendant tree.
pub fn spawn_backend(config: &LaunchConfig, port: u16) -> io::Result<Child> {
    let mut cmd = Command::new(&config.python);
    cmd.arg("-m")
        .arg("streamlit")
        .arg("run")
        .arg(&config.script)
        .arg("--server.port")
        .arg(port.to_string())
        .arg("--server.headless")
        .arg("true")
        .arg("--browser.serverAddress")
        .arg("localhost")
        .arg("--server.enableCORS")
        .arg("false")
        .arg("--browser.gatherUsageStats")
        .arg("false");
    cmd.args(&config.extra_args);

    cmd.current_dir(&config.app_dir);
    cmd.env("PYTHONUNBUFFERED", "1");
    for (key, value) in &config.extra_env {
        cmd.env(key, value);
    }

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    // New process group: the child becomes the group leader, so a single
    // group-wide signal reaches any workers it forks.
    #[cfg(unix)]
    cmd.process_group(0);

    debug!(
        python = %config.python.display(),
        script = %config.script.display(),
        port = %port,
        "spawning backend"
    );
    cmd.spawn()
}

#[cfg(test)]
mod tests {
    use super::*;
    use litshell_core::LaunchConfig;

    #[tokio::test]
    async fn spawn_failure_is_reported_not_panicked() {
        let config = LaunchConfig::new("/nonexistent/interpreter", "gui.py", ".");
        let result = spawn_backend(&config, 8501);
        assert!(result.is_err());
    }
}
