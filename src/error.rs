//! Error types for Polaris build-step operations.
//!
//! This module defines [`PolarisError`], the error carried by every failed
//! sub-step response, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Sub-steps translate every underlying problem into a `PolarisError` and
//!   return it inside a failure response; nothing crosses a sub-step boundary
//!   as a panic or an early `?` return.
//! - Validation problems of the server configuration are [`ConfigError`]s and
//!   travel as the `source` of [`PolarisError::ConfigurationInvalid`].
//! - Use `anyhow::Error` (via `PolarisError::Other`) for unexpected errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for the build step.
#[derive(Debug, Error)]
pub enum PolarisError {
    /// No global Polaris configuration is registered with the host.
    #[error("No Polaris system configuration could be found, please check your system configuration.")]
    ConfigurationMissing,

    /// The global configuration is present but fails validation.
    #[error("There is a problem with your Polaris system configuration")]
    ConfigurationInvalid {
        #[source]
        source: ConfigError,
    },

    /// The global configuration file could not be parsed.
    #[error("Failed to parse Polaris configuration at {path}: {message}")]
    GlobalConfigParse { path: PathBuf, message: String },

    /// The build-step configuration itself is unusable.
    #[error("Invalid build step configuration: {message}")]
    InvalidStepConfiguration { message: String },

    /// No CLI installation is registered under the requested name.
    #[error("Polaris CLI installation '{name}' could not be found")]
    CliNotFound { name: String },

    /// The CLI installation exists but the executable is missing.
    #[error("Polaris CLI executable not found at {path}")]
    CliExecutableMissing { path: PathBuf },

    /// The CLI argument string could not be turned into an argument list.
    #[error("Could not parse Polaris CLI arguments: {message}")]
    InvalidArguments { message: String },

    /// The external process could not be started.
    #[error("Failed to launch {program}")]
    EnvironmentLaunchFailure {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CLI ran but exited unsuccessfully.
    #[error("Polaris failed with exit code: {code}")]
    CliFailed { code: i32 },

    /// The host cancelled the build while a sub-step was blocking.
    #[error("The build was interrupted")]
    Interrupted,

    /// A consuming sub-step followed a sub-step that produced no payload.
    #[error("Sub-step '{step}' requires a payload but the previous sub-step produced none")]
    MissingPayload { step: String },

    /// The CLI scan report was not written.
    #[error("Polaris CLI scan report not found at {path}")]
    ScanReportMissing { path: PathBuf },

    /// The CLI scan report could not be parsed.
    #[error("Could not parse Polaris CLI scan report at {path}")]
    ScanReportInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The scan report lacks a piece of data required to count issues.
    #[error("Polaris CLI scan report is incomplete: {message}")]
    ScanReportIncomplete { message: String },

    /// A Polaris job ended in a non-successful state.
    #[error("Polaris job at {url} ended in state {state}")]
    JobFailed { url: String, state: String },

    /// Jobs did not complete within the configured timeout.
    #[error("Polaris jobs did not complete within {minutes} minute(s)")]
    JobTimeout { minutes: u64 },

    /// The Polaris server answered with an unexpected response.
    #[error("Polaris server request to {url} failed: {message}")]
    ServerResponse { url: String, message: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PolarisError {
    /// Whether this error stems from the global Polaris configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PolarisError::ConfigurationMissing | PolarisError::ConfigurationInvalid { .. }
        )
    }
}

impl From<ConfigError> for PolarisError {
    fn from(source: ConfigError) -> Self {
        PolarisError::ConfigurationInvalid { source }
    }
}

/// Result type alias for build-step operations.
pub type Result<T> = std::result::Result<T, PolarisError>;

/// Render an error and all of its sources as one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
