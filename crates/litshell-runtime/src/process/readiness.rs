//! Readiness detection on the backend's output streams.
//!
//! Streamlit prints a fixed phrase to stdout once its HTTP server is
//! accepting connections; the first line containing it flips the gate.
//! Line reading is byte-based with lossy UTF-8 decoding: Python tooling
//! can emit non-UTF8 bytes, and `BufReader::lines()` would terminate the
//! watcher on the first invalid sequence.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};

/// Substring of the stdout line that signals the backend is serving.
pub const READY_SENTINEL: &str = "You can now view your Streamlit app";

/// Once-only sentinel matcher.
///
/// The sentinel can appear more than once in the output stream (e.g. on
/// an internal server restart); only the first occurrence may trigger
/// readiness side effects.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    seen: bool,
}

impl ReadinessGate {
    #[must_use]
    pub const fn new() -> Self {
        Self { seen: false }
    }

    /// Feed one stdout line. Returns true exactly once, on the first
    /// line containing the sentinel.
    pub fn observe(&mut self, line: &str) -> bool {
        if self.seen || !line.contains(READY_SENTINEL) {
            return false;
        }
        self.seen = true;
        true
    }

    /// Whether the sentinel has been seen.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.seen
    }
}

/// Read one line from `reader` with lossy UTF-8 decoding.
///
/// Returns `None` on EOF or read error. Cancel-safe when used inside
/// `select!`: bytes already read stay in `buf` and the next call picks
/// the partial line back up, so a dropped read never loses data.
pub(crate) async fn read_line_lossy<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> Option<String> {
    match reader.read_until(b'\n', buf).await {
        Ok(0) if buf.is_empty() => None,
        Ok(_) => {
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(buf).to_string();
            buf.clear();
            Some(line)
        }
        Err(e) => {
            debug!(error = %e, "line reader exiting due to read error");
            None
        }
    }
}

/// Spawn a task that logs every stderr line.
///
/// Stderr never transitions state: Streamlit routinely writes warnings
/// there, and an error line does not imply failure unless followed by
/// process exit.
pub(crate) fn spawn_stderr_logger(stream: impl AsyncRead + Unpin + Send + 'static, port: u16) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        while let Some(line) = read_line_lossy(&mut reader, &mut buf).await {
            warn!(port = %port, "backend stderr: {line}");
        }
        debug!(port = %port, "stderr reader task exiting");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_matches_once() {
        let mut gate = ReadinessGate::new();
        assert!(!gate.observe("Collecting usage statistics"));
        assert!(gate.observe("  You can now view your Streamlit app in your browser."));
        assert!(gate.is_ready());
        // Repeat sentinel must not re-trigger.
        assert!(!gate.observe("You can now view your Streamlit app in your browser."));
    }

    #[test]
    fn non_sentinel_lines_are_ignored() {
        let mut gate = ReadinessGate::new();
        assert!(!gate.observe("Local URL: http://localhost:8501"));
        assert!(!gate.is_ready());
    }

    #[tokio::test]
    async fn read_line_lossy_handles_invalid_utf8() {
        let data: &[u8] = b"ok line\n\xff\xfe broken\nlast";
        let mut reader = BufReader::new(data);
        let mut buf = Vec::new();

        assert_eq!(read_line_lossy(&mut reader, &mut buf).await.unwrap(), "ok line");
        let broken = read_line_lossy(&mut reader, &mut buf).await.unwrap();
        assert!(broken.contains("broken"));
        assert_eq!(read_line_lossy(&mut reader, &mut buf).await.unwrap(), "last");
        assert!(read_line_lossy(&mut reader, &mut buf).await.is_none());
    }

    #[tokio::test]
    async fn read_line_lossy_strips_crlf() {
        let data: &[u8] = b"windows line\r\n";
        let mut reader = BufReader::new(data);
        let mut buf = Vec::new();
        assert_eq!(
            read_line_lossy(&mut reader, &mut buf).await.unwrap(),
            "windows line"
        );
    }
}
