//! Port allocation for the backend subprocess.

use std::net::TcpListener;
use tracing::{debug, warn};

/// Check if a port is available by attempting to bind to it.
/// This binds and immediately drops the listener, which releases the port.
pub fn is_port_available(port: u16) -> bool {
    match TcpListener::bind(("127.0.0.1", port)) {
        Ok(listener) => listener.local_addr().is_ok(),
        Err(_) => false,
    }
}

/// Find the first free port at or above `start`, scanning upward one at
/// a time for at most `attempts` candidates.
///
/// Probing is read-only and sequential. If the scan is exhausted (or the
/// candidate range runs off the end of the port space) the start port is
/// returned as a fallback: availability over correctness, the subsequent
/// spawn surfaces any real conflict.
pub fn find_free_port(start: u16, attempts: u16) -> u16 {
    for offset in 0..attempts {
        let Some(port) = start.checked_add(offset) else {
            break;
        };

        if is_port_available(port) {
            debug!(port = %port, "allocated free port");
            return port;
        }
        debug!(port = %port, "port occupied, trying next");
    }

    warn!(
        start = %start,
        attempts = %attempts,
        "no free port found in scan range, falling back to start port"
    );
    start
}
