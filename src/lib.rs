//! polaris-step - Run the Synopsys Polaris CLI as a CI build step.
//!
//! A build step is a fail-fast chain of sub-steps: resolve the Polaris
//! server configuration into the CLI environment, locate the CLI, run it
//! and optionally wait for the scan's issues. Host services such as
//! logging, credentials and tool installations are injected as
//! collaborators.
//!
//! # Modules
//!
//! - [`build_step`] - The host-facing build step and its collaborators
//! - [`cli`] - Command-line host and argument parsing
//! - [`config`] - Global, server and build-step configuration
//! - [`environment`] - Environment mapping for the CLI process
//! - [`error`] - Error types and result aliases
//! - [`host`] - Build context, logger and resolver interfaces
//! - [`polaris`] - Scan report and Polaris API access
//! - [`shell`] - Process launching
//! - [`steps`] - The Polaris sub-steps
//! - [`workflow`] - Sub-step responses and the workflow runner
//!
//! # Example
//!
//! ```
//! use polaris_step::workflow::{consuming, executing, StepWorkflow, SubStepResponse};
//!
//! let response = StepWorkflow::first(executing("locate", || SubStepResponse::success("polaris")))
//!     .then_consume(consuming("launch", |cli: &str| SubStepResponse::success(cli.len())))
//!     .run();
//! assert_eq!(response.payload(), Some(&7));
//! ```
//!
//! For end-to-end runs, see the integration tests.

pub mod build_step;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod host;
pub mod polaris;
pub mod shell;
pub mod steps;
pub mod workflow;

pub use build_step::{BuildCollaborators, PolarisBuildStep};
pub use error::{PolarisError, Result};
