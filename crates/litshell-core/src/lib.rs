//! Core domain types and port definitions for litshell.
//!
//! litshell hosts a Streamlit backend as a child process for a desktop
//! shell. This crate holds the launch configuration, lifecycle states,
//! events, errors, and the port traits the runtime needs from its
//! surroundings (UI notification channel, dependency installer). It
//! contains no process or filesystem implementation details.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod ports;

pub use config::{LaunchConfig, PlatformProfile, StartupTimeouts};
pub use error::BackendError;
pub use events::{BackendEvent, BackendStateInfo, BackendStatus, ReadinessState};
pub use ports::{
    DependencyInstallerPort, NoopInstaller, NoopNotifier, Severity, StatusNote,
    StatusNotifierPort,
};
