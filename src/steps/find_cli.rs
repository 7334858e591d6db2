//! Locates the Polaris CLI executable.

use std::path::PathBuf;

use tracing::debug;

use crate::build_step::BuildCollaborators;
use crate::error::{PolarisError, Result};
use crate::workflow::{SubStep, SubStepResponse};

/// File name of the CLI inside `<home>/bin`.
pub fn executable_name() -> &'static str {
    if cfg!(windows) {
        "polaris.exe"
    } else {
        "polaris"
    }
}

/// Resolves a named CLI installation to its executable path.
pub struct FindPolarisCli<'a> {
    collaborators: &'a BuildCollaborators,
    cli_name: &'a str,
}

impl<'a> FindPolarisCli<'a> {
    pub fn new(collaborators: &'a BuildCollaborators, cli_name: &'a str) -> Self {
        Self {
            collaborators,
            cli_name,
        }
    }

    fn find(&self) -> Result<PathBuf> {
        let home = self
            .collaborators
            .tool_locator
            .installation_home(self.cli_name)
            .ok_or_else(|| PolarisError::CliNotFound {
                name: self.cli_name.to_string(),
            })?;

        let executable = home.join("bin").join(executable_name());
        if !executable.is_file() {
            return Err(PolarisError::CliExecutableMissing { path: executable });
        }

        debug!(cli = %executable.display(), "Found Polaris CLI");
        Ok(executable)
    }
}

impl SubStep for FindPolarisCli<'_> {
    type Output = PathBuf;

    fn name(&self) -> &str {
        "find-polaris-cli"
    }

    fn run(&mut self) -> SubStepResponse<PathBuf> {
        self.find().into()
    }
}
