//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the runtime expects from its
//! surroundings. They contain no implementation details and use only
//! domain types.

pub mod installer;
pub mod notifier;

pub use installer::{DependencyInstallerPort, NoopInstaller};
pub use notifier::{NoopNotifier, Severity, StatusNote, StatusNotifierPort};
