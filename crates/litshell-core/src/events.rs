//! Backend lifecycle states and events.
//!
//! Events are emitted by the runtime and consumed by the presentation
//! layer (desktop window, CLI) to mirror backend state. The frontend
//! should treat these events as the sole source of truth for backend
//! lifecycle.

use serde::{Deserialize, Serialize};

/// Readiness of the supervised backend.
///
/// Exactly one transition out of `Starting` is permitted. `Ready` is not
/// terminal: the subprocess can still exit afterwards, which the exit
/// observer reports independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    /// Launched, waiting for the readiness sentinel.
    Starting,
    /// Sentinel seen; the backend is serving HTTP.
    Ready,
    /// The (final) startup deadline expired before readiness.
    TimedOut,
    /// The subprocess exited before becoming ready.
    Failed,
}

/// Backend lifecycle status.
///
/// The status values directly map to event types for consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// Subprocess spawned, not yet serving.
    Starting,
    /// Serving and reachable at its URL.
    Ready,
    /// Startup deadline expired without readiness.
    TimedOut,
    /// Exited as part of a deliberate shutdown.
    Stopped,
    /// Exited unexpectedly.
    Crashed,
}

/// A single backend state record carried by events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStateInfo {
    /// Current status.
    pub status: BackendStatus,
    /// Port the backend is/was serving on.
    pub port: u16,
    /// URL to load once ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Exit code, for stopped/crashed states.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Unix timestamp in milliseconds when this state was recorded.
    pub updated_at: u64,
}

impl BackendStateInfo {
    /// Create a new state record with the current timestamp.
    #[must_use]
    pub fn new(status: BackendStatus, port: u16) -> Self {
        Self {
            status,
            port,
            url: None,
            exit_code: None,
            updated_at: Self::now_ms(),
        }
    }

    /// Attach the served URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach the exit code.
    #[must_use]
    pub const fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Get current time as Unix milliseconds.
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Backend lifecycle event payload.
///
/// All backend state changes are communicated through this event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendEvent {
    /// Subprocess spawned and the readiness watch has begun.
    Starting(BackendStateInfo),

    /// Backend is serving; the carried URL can be loaded.
    Ready(BackendStateInfo),

    /// The final startup deadline expired without readiness.
    TimedOut(BackendStateInfo),

    /// Backend exited as part of a deliberate shutdown.
    Stopped(BackendStateInfo),

    /// Backend exited unexpectedly.
    Crashed(BackendStateInfo),
}

impl BackendEvent {
    /// Event for a backend that just spawned.
    #[must_use]
    pub fn starting(port: u16) -> Self {
        Self::Starting(BackendStateInfo::new(BackendStatus::Starting, port))
    }

    /// Event for a backend that became ready at `url`.
    #[must_use]
    pub fn ready(port: u16, url: impl Into<String>) -> Self {
        Self::Ready(BackendStateInfo::new(BackendStatus::Ready, port).with_url(url))
    }

    /// Event for an expired final startup deadline.
    #[must_use]
    pub fn timed_out(port: u16) -> Self {
        Self::TimedOut(BackendStateInfo::new(BackendStatus::TimedOut, port))
    }

    /// Event for a deliberate shutdown.
    #[must_use]
    pub fn stopped(port: u16, code: Option<i32>) -> Self {
        Self::Stopped(BackendStateInfo::new(BackendStatus::Stopped, port).with_exit_code(code))
    }

    /// Event for an unexpected exit.
    #[must_use]
    pub fn crashed(port: u16, code: Option<i32>) -> Self {
        Self::Crashed(BackendStateInfo::new(BackendStatus::Crashed, port).with_exit_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_event_serialization() {
        let event = BackendEvent::ready(8503, "http://localhost:8503");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"ready\""));
        assert!(json.contains("\"port\":8503"));
        assert!(json.contains("\"url\":\"http://localhost:8503\""));
    }

    #[test]
    fn crashed_event_carries_exit_code() {
        let event = BackendEvent::crashed(8501, Some(1));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"crashed\""));
        assert!(json.contains("\"exitCode\":1"));
    }

    #[test]
    fn stopped_event_omits_missing_fields() {
        let event = BackendEvent::stopped(8501, None);
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("url"));
        assert!(!json.contains("exitCode"));
    }

    #[test]
    fn readiness_state_roundtrip() {
        let json = serde_json::to_string(&ReadinessState::TimedOut).unwrap();
        assert_eq!(json, "\"timedout\"");
        let state: ReadinessState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, ReadinessState::TimedOut);
    }
}
