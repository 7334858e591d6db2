//! The host-facing Polaris build step.
//!
//! [`PolarisBuildStep`] turns one build invocation into a sub-step workflow,
//! runs it and maps the terminal response to the host's pass/fail contract.
//! All collaborators arrive through [`BuildCollaborators`].

use std::cell::RefCell;
use std::sync::Arc;

use tracing::debug;

use crate::config::{BuildStepConfig, GlobalConfigSource};
use crate::environment::EnvironmentVariables;
use crate::error::{PolarisError, Result};
use crate::host::{
    BuildContext, BuildLogger, BuildResult, CredentialsResolver, ProxyResolver, ToolLocator,
    VersionHelper,
};
use crate::polaris::PolarisServicesFactory;
use crate::shell::ProcessLauncher;
use crate::steps::{
    CreatePolarisEnvironment, ExecutePolarisCli, FindPolarisCli, PolarisRun, WaitForPolarisIssues,
};
use crate::workflow::{StepWorkflow, SubStepResponse};

/// Name the build step reports itself under.
pub const DISPLAY_NAME: &str = "Synopsys Polaris";

/// Services the build step consumes from its host.
#[derive(Clone)]
pub struct BuildCollaborators {
    pub logger: Arc<dyn BuildLogger>,
    pub version_helper: Arc<dyn VersionHelper>,
    pub config_source: Arc<dyn GlobalConfigSource>,
    pub credentials: Arc<dyn CredentialsResolver>,
    pub proxy: Arc<dyn ProxyResolver>,
    pub tool_locator: Arc<dyn ToolLocator>,
    pub launcher: Arc<dyn ProcessLauncher>,
    pub services: Arc<dyn PolarisServicesFactory>,
}

/// Runs the Polaris CLI as a build step.
///
/// The configuration is validated once here and never changes afterwards.
/// Each call to [`perform`](Self::perform) builds a fresh workflow and
/// environment mapping, so one instance can serve several builds.
pub struct PolarisBuildStep {
    config: BuildStepConfig,
    collaborators: BuildCollaborators,
}

impl PolarisBuildStep {
    /// Create a build step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStepConfiguration` if `config` is unusable.
    pub fn new(config: BuildStepConfig, collaborators: BuildCollaborators) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            collaborators,
        })
    }

    pub fn config(&self) -> &BuildStepConfig {
        &self.config
    }

    /// Run the build step against `build`.
    ///
    /// Returns `true` if the build should continue. On failure, logs one
    /// error with its cause, marks the build as failed (or aborted when
    /// interrupted) and returns `false`.
    pub fn perform(&self, build: &dyn BuildContext) -> bool {
        debug!(
            cli = %self.config.polaris_cli_name,
            wait_for_issues = self.config.wait_for_issues.is_some(),
            "Starting Polaris build step"
        );

        let environment = RefCell::new(EnvironmentVariables::new());
        let response = self.workflow(build, &environment).run();

        match response {
            SubStepResponse::Failure(cause) => {
                let result = match cause {
                    PolarisError::Interrupted => BuildResult::Aborted,
                    _ => BuildResult::Failure,
                };
                build.set_result(result);
                self.collaborators
                    .logger
                    .error(&format!("{DISPLAY_NAME} build step failed"), Some(&cause));
                false
            }
            SubStepResponse::Success(_) | SubStepResponse::SuccessEmpty => true,
        }
    }

    fn workflow<'a>(
        &'a self,
        build: &'a dyn BuildContext,
        environment: &'a RefCell<EnvironmentVariables>,
    ) -> StepWorkflow<'a, PolarisRun> {
        let collaborators = &self.collaborators;
        let wait = self
            .config
            .wait_for_issues
            .as_ref()
            .map(|settings| WaitForPolarisIssues::new(collaborators, build, settings));

        StepWorkflow::first(CreatePolarisEnvironment::new(collaborators, environment))
            .then(FindPolarisCli::new(collaborators, &self.config.polaris_cli_name))
            .then_consume(ExecutePolarisCli::new(
                collaborators,
                build,
                &self.config.polaris_arguments,
                environment,
            ))
            .then_optionally(wait)
    }
}
