//! CLI entry point - the composition root.
//!
//! This is the only place where infrastructure is wired together: the
//! console notifier, the environment resolver, the optional pip
//! installer, and the supervisor. The backend runs headless; the served
//! URL is printed to stdout for whatever window or browser embeds it.

use anyhow::Context;
use clap::Parser;
use litshell_core::{
    LaunchConfig, PlatformProfile, Severity, StartupTimeouts, StatusNote, StatusNotifierPort,
};
use litshell_runtime::{BackendSupervisor, PipInstaller, resolver};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "litshell",
    about = "Launch and supervise a Streamlit backend for a desktop shell"
)]
struct Cli {
    /// Streamlit entry script (defaults to <app-dir>/gui.py)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Python interpreter (resolved automatically when omitted)
    #[arg(long)]
    python: Option<PathBuf>,

    /// Application directory, used as the backend working directory
    #[arg(long, default_value = ".")]
    app_dir: PathBuf,

    /// Resources directory holding a bundled interpreter (packaged mode)
    #[arg(long)]
    resources_dir: Option<PathBuf>,

    /// First port probed for the backend
    #[arg(long, default_value_t = 8501)]
    base_port: u16,

    /// Initial startup deadline in seconds
    #[arg(long, default_value_t = 60)]
    startup_timeout: u64,

    /// Extended deadline in seconds for constrained platforms
    #[arg(long, default_value_t = 120)]
    extended_timeout: u64,

    /// Grace delay in milliseconds between the sentinel and readiness
    #[arg(long, default_value_t = 1000)]
    grace_ms: u64,

    /// Treat this host as a constrained (slow first-run) platform
    #[arg(long)]
    constrained: bool,

    /// Requirements file for first-run dependency installation
    #[arg(long)]
    requirements: Option<PathBuf>,
}

/// Notifier rendering status messages to the terminal.
struct ConsoleNotifier;

impl StatusNotifierPort for ConsoleNotifier {
    fn notify(&self, note: StatusNote) {
        match note.severity {
            Severity::Info => info!("{}: {}", note.title, note.body),
            Severity::Fatal => error!("{}: {}", note.title, note.body),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let platform = if cli.constrained {
        PlatformProfile::constrained()
    } else {
        PlatformProfile::detect()
    };

    // A resources dir implies a packaged install with a bundled interpreter.
    let packaged = cli.resources_dir.is_some();
    let resources_dir = cli
        .resources_dir
        .clone()
        .unwrap_or_else(|| cli.app_dir.clone());

    let python = match cli.python {
        Some(python) => python,
        None => resolver::resolve_python(packaged, &resources_dir, platform.constrained)
            .context("could not resolve a Python interpreter")?,
    };
    let script = match cli.script {
        Some(script) => script,
        None => resolver::resolve_script(&cli.app_dir)?,
    };

    let config = LaunchConfig::new(python, script, &cli.app_dir)
        .with_base_port(cli.base_port)
        .with_platform(platform)
        .with_timeouts(StartupTimeouts {
            initial: Duration::from_secs(cli.startup_timeout),
            extended: Duration::from_secs(cli.extended_timeout),
            grace: Duration::from_millis(cli.grace_ms),
        });

    let mut supervisor = BackendSupervisor::new(Arc::new(ConsoleNotifier));
    if let Some(requirements) = cli.requirements {
        supervisor = supervisor.with_installer(Arc::new(PipInstaller::new(requirements)));
    }

    let backend = supervisor.launch(config).await?;
    let url = backend.wait_ready().await?;
    println!("{url}");
    info!(%url, "backend ready, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    backend.shutdown().await;

    Ok(())
}
