//! Backend process lifecycle management.
//!
//! One backend subprocess per launch: the supervisor allocates a port,
//! spawns Streamlit, watches stdout for the readiness sentinel while a
//! tiered deadline counts down, observes exit, and tears the process
//! tree down on shutdown.

mod broadcaster;
mod launcher;
mod lifecycle;
mod ports;
mod readiness;
mod shutdown;
mod supervisor;

pub use broadcaster::EventBroadcaster;
pub use launcher::spawn_backend;
pub use lifecycle::Lifecycle;
pub use ports::{find_free_port, is_port_available};
pub use readiness::{READY_SENTINEL, ReadinessGate};
pub use shutdown::terminate_tree;
pub use supervisor::{Backend, BackendSupervisor};
