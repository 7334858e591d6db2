//! The sub-steps of the Polaris build step.
//!
//! In execution order:
//!
//! - [`CreatePolarisEnvironment`] - Resolves the server configuration into the CLI environment
//! - [`FindPolarisCli`] - Locates the CLI executable of the configured installation
//! - [`ExecutePolarisCli`] - Runs the CLI in the workspace
//! - [`WaitForPolarisIssues`] - Optionally waits for jobs and counts issues

pub mod create_environment;
pub mod execute_cli;
pub mod find_cli;
pub mod wait_for_issues;

#[cfg(test)]
pub(crate) mod fixtures;

pub use create_environment::CreatePolarisEnvironment;
pub use execute_cli::{ExecutePolarisCli, PolarisRun};
pub use find_cli::{executable_name, FindPolarisCli};
pub use wait_for_issues::WaitForPolarisIssues;
