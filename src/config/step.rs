//! Build-step configuration.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{PolarisError, Result};
use crate::host::BuildResult;

use super::arguments::prepare_arguments;

/// Minutes to wait for Polaris jobs when no timeout is configured.
pub const DEFAULT_JOB_TIMEOUT_MINUTES: u64 = 30;

/// Build status applied when the scan found issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IssueBuildStatus {
    Success,
    #[default]
    Unstable,
    Failure,
}

impl IssueBuildStatus {
    /// The host build result this status maps to.
    pub fn result(&self) -> BuildResult {
        match self {
            IssueBuildStatus::Success => BuildResult::Success,
            IssueBuildStatus::Unstable => BuildResult::Unstable,
            IssueBuildStatus::Failure => BuildResult::Failure,
        }
    }
}

/// Settings for waiting on Polaris jobs and reacting to issues.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WaitForIssues {
    /// Result to set on the build when issues were found.
    pub build_status_for_issues: IssueBuildStatus,

    /// How long to wait for jobs to complete.
    pub job_timeout_in_minutes: u64,
}

impl Default for WaitForIssues {
    fn default() -> Self {
        Self {
            build_status_for_issues: IssueBuildStatus::default(),
            job_timeout_in_minutes: DEFAULT_JOB_TIMEOUT_MINUTES,
        }
    }
}

/// Immutable configuration of one Polaris build step.
///
/// # Example
///
/// ```
/// use polaris_step::config::{BuildStepConfig, WaitForIssues};
///
/// let config = BuildStepConfig::new("default", "analyze -w")
///     .with_wait_for_issues(WaitForIssues::default());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildStepConfig {
    /// Name of the CLI installation to run.
    pub polaris_cli_name: String,

    /// Argument string passed to the CLI.
    #[serde(default)]
    pub polaris_arguments: String,

    /// Wait for jobs and set the build status from the issue count.
    #[serde(default)]
    pub wait_for_issues: Option<WaitForIssues>,
}

impl BuildStepConfig {
    /// Create a configuration without waiting for issues.
    pub fn new(polaris_cli_name: impl Into<String>, polaris_arguments: impl Into<String>) -> Self {
        Self {
            polaris_cli_name: polaris_cli_name.into(),
            polaris_arguments: polaris_arguments.into(),
            wait_for_issues: None,
        }
    }

    /// Enable waiting for issues.
    pub fn with_wait_for_issues(mut self, wait_for_issues: WaitForIssues) -> Self {
        self.wait_for_issues = Some(wait_for_issues);
        self
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStepConfiguration` for a blank CLI name, a malformed
    /// argument string or a zero job timeout. An argument string accepted
    /// here is accepted at run time whatever the build environment holds.
    pub fn validate(&self) -> Result<()> {
        if self.polaris_cli_name.trim().is_empty() {
            return Err(invalid("a Polaris CLI installation name is required"));
        }

        prepare_arguments(&self.polaris_arguments, &HashMap::new()).map_err(|e| invalid(&e.to_string()))?;

        if let Some(wait) = &self.wait_for_issues {
            if wait.job_timeout_in_minutes == 0 {
                return Err(invalid("the job timeout must be at least one minute"));
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> PolarisError {
    PolarisError::InvalidStepConfiguration {
        message: message.to_string(),
    }
}
