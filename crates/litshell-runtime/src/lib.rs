//! Process runtime and OS-level concerns for litshell.
//!
//! Implements the backend lifecycle controller: free-port allocation,
//! subprocess launch, readiness detection on stdout, tiered startup
//! timeouts, and descendant-tree shutdown. Domain types and the ports
//! this runtime plugs into live in `litshell-core`.

#![deny(unsafe_code)]

pub mod installer;
pub mod process;
pub mod resolver;

// Re-export the main supervisor surface
pub use process::{Backend, BackendSupervisor};

// Re-export lifecycle and event plumbing for embedding contexts
pub use process::{EventBroadcaster, Lifecycle, ReadinessGate, READY_SENTINEL};

// Re-export port allocation utilities for direct use if needed
pub use process::{find_free_port, is_port_available};

// Re-export the pip installer adapter
pub use installer::PipInstaller;

// Silence unused dev-dependency warnings until mock-based unit tests exist
#[cfg(test)]
use tokio_test as _;
