//! Populates the Polaris CLI environment from the global configuration.

use std::cell::RefCell;

use tracing::debug;

use crate::build_step::{BuildCollaborators, DISPLAY_NAME};
use crate::environment::EnvironmentVariables;
use crate::error::PolarisError;
use crate::host::PLUGIN_NAME;
use crate::workflow::{SubStep, SubStepResponse};

/// Resolves the server configuration into the shared environment mapping.
///
/// Succeeds without a payload; the populated mapping is the result.
pub struct CreatePolarisEnvironment<'a> {
    collaborators: &'a BuildCollaborators,
    environment: &'a RefCell<EnvironmentVariables>,
}

impl<'a> CreatePolarisEnvironment<'a> {
    pub fn new(
        collaborators: &'a BuildCollaborators,
        environment: &'a RefCell<EnvironmentVariables>,
    ) -> Self {
        Self {
            collaborators,
            environment,
        }
    }

    fn running_message(&self) -> String {
        match self.collaborators.version_helper.plugin_version(PLUGIN_NAME) {
            Some(version) => format!("Running {DISPLAY_NAME} build step version {version}"),
            None => format!("Running {DISPLAY_NAME} build step"),
        }
    }
}

impl SubStep for CreatePolarisEnvironment<'_> {
    type Output = ();

    fn name(&self) -> &str {
        "create-polaris-environment"
    }

    fn run(&mut self) -> SubStepResponse<()> {
        let Some(global) = self.collaborators.config_source.lookup() else {
            return SubStepResponse::failure(PolarisError::ConfigurationMissing);
        };

        let builder = global.server_config_builder(
            self.collaborators.credentials.as_ref(),
            self.collaborators.proxy.as_ref(),
        );

        let mut environment = self.environment.borrow_mut();
        let stored = environment.put_properties(&builder.properties());
        debug!(stored, "Copied server configuration into environment");

        let server = match builder.build() {
            Ok(server) => server,
            Err(e) => return SubStepResponse::failure(e),
        };
        server.populate_environment_variables(&mut environment);
        drop(environment);

        self.collaborators.logger.info(&self.running_message());
        SubStepResponse::success_empty()
    }
}
