//! External process execution.

pub mod launcher;

pub use launcher::{LaunchRequest, ProcessLauncher, SystemLauncher};
