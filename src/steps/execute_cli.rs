//! Runs the Polaris CLI in the build workspace.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::build_step::BuildCollaborators;
use crate::config::prepare_arguments;
use crate::environment::EnvironmentVariables;
use crate::error::{PolarisError, Result};
use crate::host::BuildContext;
use crate::shell::LaunchRequest;
use crate::workflow::{ConsumingSubStep, SubStepResponse};

/// Outcome of one CLI run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolarisRun {
    /// Exit code of the CLI.
    pub exit_code: i32,

    /// Issues found, once counted.
    pub issue_count: Option<u64>,
}

/// Launches the CLI found by the previous sub-step.
pub struct ExecutePolarisCli<'a> {
    collaborators: &'a BuildCollaborators,
    build: &'a dyn BuildContext,
    arguments: &'a str,
    environment: &'a RefCell<EnvironmentVariables>,
}

impl<'a> ExecutePolarisCli<'a> {
    pub fn new(
        collaborators: &'a BuildCollaborators,
        build: &'a dyn BuildContext,
        arguments: &'a str,
        environment: &'a RefCell<EnvironmentVariables>,
    ) -> Self {
        Self {
            collaborators,
            build,
            arguments,
            environment,
        }
    }

    fn execute(&self, cli: &Path) -> Result<PolarisRun> {
        let args = prepare_arguments(self.arguments, self.build.environment())?;
        let env = self.environment.borrow().overlay(self.build.environment());

        let request = LaunchRequest {
            program: cli,
            args: &args,
            env: &env,
            cwd: self.build.workspace(),
        };
        let exit_code = self
            .collaborators
            .launcher
            .launch(&request, self.build.interrupt())?;
        debug!(exit_code, "Polaris CLI finished");

        if exit_code != 0 {
            return Err(PolarisError::CliFailed { code: exit_code });
        }

        Ok(PolarisRun {
            exit_code,
            issue_count: None,
        })
    }
}

impl ConsumingSubStep for ExecutePolarisCli<'_> {
    type Input = PathBuf;
    type Output = PolarisRun;

    fn name(&self) -> &str {
        "execute-polaris-cli"
    }

    fn run(&mut self, cli: PathBuf) -> SubStepResponse<PolarisRun> {
        self.execute(&cli).into()
    }
}
