//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{BuildStepConfig, IssueBuildStatus, WaitForIssues, DEFAULT_JOB_TIMEOUT_MINUTES};

/// Run the Synopsys Polaris CLI as a build step.
#[derive(Debug, Parser)]
#[command(name = "polaris-step")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the global Polaris configuration
    #[arg(short, long, env = "POLARIS_STEP_CONFIG", default_value = "polaris-step.yml")]
    pub config: PathBuf,

    /// Build workspace (defaults to the current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Name of the Polaris CLI installation to run
    #[arg(long, default_value = "default")]
    pub cli_name: String,

    /// Arguments passed to the Polaris CLI
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub arguments: String,

    /// Wait for Polaris jobs and set the build result from the issue count
    #[arg(long)]
    pub wait_for_issues: bool,

    /// Build result when issues were found
    #[arg(long, value_enum, default_value_t = IssueBuildStatus::Unstable)]
    pub build_status_for_issues: IssueBuildStatus,

    /// Minutes to wait for Polaris jobs
    #[arg(long, default_value_t = DEFAULT_JOB_TIMEOUT_MINUTES)]
    pub job_timeout: u64,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// The build-step configuration these arguments describe.
    pub fn step_config(&self) -> BuildStepConfig {
        let config = BuildStepConfig::new(self.cli_name.clone(), self.arguments.clone());
        if self.wait_for_issues {
            config.with_wait_for_issues(WaitForIssues {
                build_status_for_issues: self.build_status_for_issues,
                job_timeout_in_minutes: self.job_timeout,
            })
        } else {
            config
        }
    }
}
