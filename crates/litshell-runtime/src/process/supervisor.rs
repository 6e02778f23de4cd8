//! Backend launch orchestration and supervision.
//!
//! `BackendSupervisor::launch` allocates a port, runs the first-launch
//! dependency path on constrained platforms, spawns the subprocess, and
//! starts a monitor task that owns the child for the rest of its life.
//! The monitor is one `select!` loop over three concerns: the stdout
//! sentinel watch, the subprocess-exit observer, and the tiered startup
//! deadline. Keeping them in one loop makes sentinel detection and
//! deadline disarm atomic relative to each other: there is no window in
//! which both can fire.

use super::broadcaster::EventBroadcaster;
use super::launcher::spawn_backend;
use super::lifecycle::Lifecycle;
use super::ports::find_free_port;
use super::readiness::{ReadinessGate, read_line_lossy, spawn_stderr_logger};
use super::shutdown::terminate_tree;
use crate::resolver::has_streamlit_module;
use litshell_core::{
    BackendError, BackendEvent, DependencyInstallerPort, LaunchConfig, NoopInstaller,
    ReadinessState, StartupTimeouts, StatusNote, StatusNotifierPort,
};
use std::sync::{Arc, Mutex};
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Launches the backend and supervises it until shutdown.
pub struct BackendSupervisor {
    notifier: Arc<dyn StatusNotifierPort>,
    installer: Arc<dyn DependencyInstallerPort>,
}

impl BackendSupervisor {
    /// Create a supervisor delivering status messages through `notifier`.
    #[must_use]
    pub fn new(notifier: Arc<dyn StatusNotifierPort>) -> Self {
        Self {
            notifier,
            installer: Arc::new(NoopInstaller),
        }
    }

    /// Use `installer` for first-run dependency installation on
    /// constrained platforms.
    #[must_use]
    pub fn with_installer(mut self, installer: Arc<dyn DependencyInstallerPort>) -> Self {
        self.installer = installer;
        self
    }

    /// Launch the backend described by `config`.
    ///
    /// Returns synchronously after the spawn: the returned handle's
    /// `wait_ready` resolves once the backend serves (or fails). Fatal
    /// conditions are also pushed through the notifier with remediation
    /// text before the error is returned.
    pub async fn launch(&self, config: LaunchConfig) -> Result<Backend, BackendError> {
        if !config.script.exists() {
            self.notifier
                .notify(missing_files_note(&config.script.display().to_string()));
            return Err(BackendError::ScriptNotFound(config.script));
        }

        let port = find_free_port(config.base_port, config.port_scan_attempts);

        // Constrained platforms may need first-run setup before the
        // backend module is importable. Failure is non-fatal: launch
        // continues optimistically with whatever is installed.
        if config.platform.constrained && !has_streamlit_module(&config.python).await {
            info!("backend module not importable, running dependency installer");
            self.notifier.notify(installing_note());
            if self.installer.ensure_dependencies(&config.python).await {
                info!("dependency installation succeeded");
            } else {
                warn!("dependency installation failed, continuing anyway");
                self.notifier.notify(slow_first_run_note());
            }
        }

        let mut child = match spawn_backend(&config, port) {
            Ok(child) => child,
            Err(e) => {
                self.notifier.notify(launch_error_note(&e.to_string()));
                return Err(BackendError::Spawn(e.to_string()));
            }
        };
        let Some(pid) = child.id() else {
            // A child without a PID cannot be supervised or torn down
            // later; kill and reap it now instead of leaking it.
            let _ = child.start_kill();
            let _ = child.wait().await;
            self.notifier
                .notify(launch_error_note("backend process has no PID"));
            return Err(BackendError::Spawn("child has no PID".to_string()));
        };

        let url = format!("http://localhost:{port}");
        let lifecycle = Arc::new(Lifecycle::new());
        let events = EventBroadcaster::new();
        // Wire a receiver before the Starting broadcast so the first
        // subscriber sees the full lifecycle.
        let initial_rx = events.subscribe();
        info!(pid = %pid, port = %port, "backend spawned");
        events.broadcast(BackendEvent::starting(port));

        let stdout = child.stdout.take();
        if let Some(stderr) = child.stderr.take() {
            spawn_stderr_logger(stderr, port);
        }

        let monitor = tokio::spawn(monitor_backend(MonitorContext {
            child,
            stdout,
            port,
            url: url.clone(),
            lifecycle: Arc::clone(&lifecycle),
            events: events.clone(),
            notifier: Arc::clone(&self.notifier),
            constrained: config.platform.constrained,
            timeouts: config.timeouts,
        }));

        Ok(Backend {
            port,
            pid,
            url,
            constrained: config.platform.constrained,
            timeouts: config.timeouts,
            lifecycle,
            events,
            initial_rx: Mutex::new(Some(initial_rx)),
            monitor,
        })
    }
}

/// Handle to a launched backend.
///
/// Owns the lifecycle state shared with the monitor task. Dropping the
/// handle does not stop the backend; call [`Backend::shutdown`].
#[derive(Debug)]
pub struct Backend {
    port: u16,
    pid: u32,
    url: String,
    constrained: bool,
    timeouts: StartupTimeouts,
    lifecycle: Arc<Lifecycle>,
    events: EventBroadcaster,
    initial_rx: Mutex<Option<broadcast::Receiver<BackendEvent>>>,
    monitor: JoinHandle<()>,
}

impl Backend {
    /// Port the backend was launched on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// PID of the backend process.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// URL the backend serves once ready.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current readiness state.
    #[must_use]
    pub fn readiness(&self) -> ReadinessState {
        self.lifecycle.readiness()
    }

    /// Subscribe to lifecycle events.
    ///
    /// The first call hands out a receiver wired before launch, so it
    /// observes the `Starting` event; later calls see events from the
    /// point of subscription onward.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.initial_rx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| self.events.subscribe())
    }

    /// Wait until the backend is serving and return its URL.
    ///
    /// Resolves with an error if the startup deadline expires or the
    /// subprocess exits first.
    pub async fn wait_ready(&self) -> Result<String, BackendError> {
        let mut rx = self.lifecycle.watch();
        loop {
            let state = *rx.borrow_and_update();
            match state {
                ReadinessState::Ready => return Ok(self.url.clone()),
                ReadinessState::TimedOut => {
                    let total = if self.constrained {
                        self.timeouts.initial + self.timeouts.extended
                    } else {
                        self.timeouts.initial
                    };
                    return Err(BackendError::StartupTimedOut(total.as_secs()));
                }
                ReadinessState::Failed => {
                    return Err(BackendError::Exited {
                        code: self.lifecycle.exit_code().flatten(),
                    });
                }
                ReadinessState::Starting => {}
            }
            if rx.changed().await.is_err() {
                return Err(BackendError::MonitorGone);
            }
        }
    }

    /// Deliberate shutdown: mark the quitting flag, then terminate the
    /// whole process tree.
    ///
    /// The flag is set *before* signalling so the exit observer treats
    /// the termination as expected and surfaces no error.
    pub async fn shutdown(self) {
        info!(pid = %self.pid, port = %self.port, "shutting down backend");
        self.lifecycle.begin_quit();
        if let Err(e) = terminate_tree(self.pid).await {
            warn!(pid = %self.pid, error = %e, "backend tree termination failed");
        }
        let _ = self.monitor.await;
    }
}

struct MonitorContext {
    child: Child,
    stdout: Option<ChildStdout>,
    port: u16,
    url: String,
    lifecycle: Arc<Lifecycle>,
    events: EventBroadcaster,
    notifier: Arc<dyn StatusNotifierPort>,
    constrained: bool,
    timeouts: StartupTimeouts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineTier {
    Initial,
    Extended,
    Disarmed,
}

/// Read the next stdout line, or park forever once the stream is gone.
async fn next_stdout_line(
    reader: &mut Option<BufReader<ChildStdout>>,
    buf: &mut Vec<u8>,
) -> Option<String> {
    match reader {
        Some(r) => read_line_lossy(r, buf).await,
        None => std::future::pending().await,
    }
}

#[allow(clippy::too_many_lines)]
async fn monitor_backend(mut ctx: MonitorContext) {
    let mut reader = ctx.stdout.take().map(BufReader::new);
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut gate = ReadinessGate::new();
    let mut tier = DeadlineTier::Initial;
    let deadline = tokio::time::sleep(ctx.timeouts.initial);
    tokio::pin!(deadline);

    let status = loop {
        tokio::select! {
            line = next_stdout_line(&mut reader, &mut buf) => {
                match line {
                    Some(line) => {
                        debug!(port = %ctx.port, "backend: {line}");
                        if gate.observe(&line) {
                            // Same loop turn as the deadline arm, so the
                            // timeout can no longer fire after this point.
                            tier = DeadlineTier::Disarmed;
                            info!(port = %ctx.port, "backend readiness sentinel seen");

                            // Publish readiness after the grace delay from a
                            // subtask so the exit observer stays live during
                            // the wait. The lifecycle transition guard makes
                            // the race against a concurrent exit safe.
                            let lifecycle = Arc::clone(&ctx.lifecycle);
                            let events = ctx.events.clone();
                            let url = ctx.url.clone();
                            let port = ctx.port;
                            let grace = ctx.timeouts.grace;
                            tokio::spawn(async move {
                                tokio::time::sleep(grace).await;
                                if lifecycle.transition(ReadinessState::Ready) {
                                    info!(port = %port, %url, "backend ready");
                                    events.broadcast(BackendEvent::ready(port, url));
                                }
                            });
                        }
                    }
                    None => reader = None,
                }
            }

            status = ctx.child.wait() => break status,

            () = &mut deadline, if tier != DeadlineTier::Disarmed => {
                match tier {
                    DeadlineTier::Initial if ctx.constrained => {
                        warn!(port = %ctx.port, "startup deadline expired on constrained platform, extending");
                        ctx.notifier.notify(patience_note(ctx.timeouts.extended.as_secs()));
                        deadline.as_mut().reset(Instant::now() + ctx.timeouts.extended);
                        tier = DeadlineTier::Extended;
                    }
                    DeadlineTier::Initial => {
                        error!(port = %ctx.port, "backend failed to start within deadline");
                        if ctx.lifecycle.transition(ReadinessState::TimedOut) {
                            ctx.events.broadcast(BackendEvent::timed_out(ctx.port));
                            ctx.notifier.notify(startup_timeout_note());
                        }
                        tier = DeadlineTier::Disarmed;
                    }
                    DeadlineTier::Extended => {
                        error!(port = %ctx.port, "backend failed to start within extended deadline");
                        if ctx.lifecycle.transition(ReadinessState::TimedOut) {
                            ctx.events.broadcast(BackendEvent::timed_out(ctx.port));
                            ctx.notifier.notify(incompatible_note());
                        }
                        tier = DeadlineTier::Disarmed;
                    }
                    DeadlineTier::Disarmed => unreachable!("deadline arm is disabled once disarmed"),
                }
            }
        }
    };

    // Exit observer. Breaking the loop also cancels any pending deadline,
    // so a late timeout report cannot follow the exit report.
    let code = status.as_ref().ok().and_then(std::process::ExitStatus::code);
    ctx.lifecycle.set_exit_code(code);

    if ctx.lifecycle.is_quitting() {
        info!(port = %ctx.port, code = ?code, "backend stopped");
        ctx.events.broadcast(BackendEvent::stopped(ctx.port, code));
    } else {
        error!(port = %ctx.port, code = ?code, "backend terminated unexpectedly");
        ctx.lifecycle.transition(ReadinessState::Failed);
        ctx.events.broadcast(BackendEvent::crashed(ctx.port, code));
        ctx.notifier.notify(unexpected_exit_note(code));
    }
}

fn missing_files_note(script: &str) -> StatusNote {
    StatusNote::fatal(
        "Missing Files",
        format!(
            "Cannot find required files. The app may not have been installed correctly.\n\n\
             Missing file: {script}\n\n\
             Please try reinstalling the application or contact support."
        ),
    )
}

fn installing_note() -> StatusNote {
    StatusNote::info(
        "Installing required components",
        "Please wait while required components are installed.\n\
         This device requires special setup on first run; after it completes, \
         future launches will be much faster.",
    )
}

fn slow_first_run_note() -> StatusNote {
    StatusNote::info(
        "Starting application",
        "The application is preparing to start. This might take a bit longer on first run.",
    )
}

fn launch_error_note(error: &str) -> StatusNote {
    StatusNote::fatal(
        "Launch Error",
        format!(
            "Failed to launch the backend process: {error}\n\n\
             Please check if Python is installed correctly on your system."
        ),
    )
}

fn patience_note(extended_secs: u64) -> StatusNote {
    StatusNote::info(
        "Please be patient",
        format!(
            "The application is still trying to start.\n\
             This device might take longer on first launch. This is normal and \
             might take up to {} more minutes.",
            extended_secs.div_ceil(60)
        ),
    )
}

fn startup_timeout_note() -> StatusNote {
    StatusNote::fatal(
        "Startup Error",
        "The application failed to start within the expected time.\n\n\
         This might be due to:\n\
         - Firewall or antivirus blocking the application\n\
         - Another application using the same port\n\
         - Temporary system resource constraints\n\n\
         Please try restarting your computer and running the application again.",
    )
}

fn incompatible_note() -> StatusNote {
    StatusNote::fatal(
        "Application Error",
        "Unable to start the application.\n\n\
         This device may not be compatible.\n\
         Please contact support for assistance.",
    )
}

fn unexpected_exit_note(code: Option<i32>) -> StatusNote {
    let code = code.map_or_else(|| "unknown".to_string(), |c| c.to_string());
    StatusNote::fatal(
        "Backend Error",
        format!(
            "The backend process has unexpectedly terminated (code: {code}).\n\n\
             This might be due to:\n\
             - Missing Python dependencies\n\
             - Incompatible Python version\n\
             - Permission issues\n\n\
             Please restart the application or contact support if the issue persists."
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use litshell_core::Severity;

    #[test]
    fn unexpected_exit_note_carries_code() {
        let note = unexpected_exit_note(Some(1));
        assert_eq!(note.severity, Severity::Fatal);
        assert!(note.body.contains("(code: 1)"));
    }

    #[test]
    fn unexpected_exit_note_without_code() {
        let note = unexpected_exit_note(None);
        assert!(note.body.contains("(code: unknown)"));
    }

    #[test]
    fn patience_note_rounds_minutes_up() {
        let note = patience_note(90);
        assert_eq!(note.severity, Severity::Info);
        assert!(note.body.contains("2 more minutes"));
    }
}
