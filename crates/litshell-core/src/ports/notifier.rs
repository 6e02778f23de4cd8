//! UI notification channel port.
//!
//! The runtime pushes human-readable status and error messages through
//! this port. Rendering is the presentation layer's concern: a desktop
//! shell shows a modal dialog or swaps the loading screen's content, the
//! CLI logs to the terminal. Fatal messages always carry remediation
//! text, never raw stack traces.

use tracing::debug;

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational notice; the app keeps going.
    Info,
    /// Fatal condition requiring user action (restart, reinstall).
    Fatal,
}

/// A user-facing status message.
#[derive(Debug, Clone)]
pub struct StatusNote {
    pub severity: Severity,
    pub title: String,
    pub body: String,
}

impl StatusNote {
    /// Informational notice.
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Fatal error report.
    pub fn fatal(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Port for delivering status messages to the user.
///
/// Implementations should be thread-safe and non-blocking where possible.
pub trait StatusNotifierPort: Send + Sync {
    /// Deliver a status message.
    fn notify(&self, note: StatusNote);
}

/// Notifier that drops messages (logs at debug level only).
///
/// Useful for embedding contexts that consume lifecycle events instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl StatusNotifierPort for NoopNotifier {
    fn notify(&self, note: StatusNote) {
        debug!(severity = ?note.severity, title = %note.title, "dropping status note");
    }
}
