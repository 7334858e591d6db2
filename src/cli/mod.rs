//! Command-line host for the Polaris build step.
//!
//! The binary acts as a minimal local host: it loads the global
//! configuration, wires environment-backed collaborators and runs one build
//! in the workspace.
//!
//! - [`args`] - Argument definitions using clap derive macros

pub mod args;

pub use args::Cli;

use std::env;
use std::sync::Arc;

use tracing::debug;

use crate::build_step::{BuildCollaborators, PolarisBuildStep};
use crate::config::FileGlobalConfigSource;
use crate::error::Result;
use crate::host::{
    BuildContext, BuildResult, ConfiguredToolLocator, EnvCredentialsResolver, EnvProxyResolver,
    LocalBuild, PackageVersionHelper, TracingLogger,
};
use crate::polaris::HttpServicesFactory;
use crate::shell::SystemLauncher;

/// Run one build as described by `cli` and return its result.
///
/// # Errors
///
/// Fails if the configuration file cannot be read or the build-step
/// configuration is invalid. Build-step failures are reported through the
/// returned result instead.
pub fn run(cli: &Cli) -> Result<BuildResult> {
    let workspace = match &cli.workspace {
        Some(workspace) => workspace.clone(),
        None => env::current_dir()?,
    };

    let source = Arc::new(FileGlobalConfigSource::load(&cli.config)?);
    if source.config().is_none() {
        debug!(path = %cli.config.display(), "No global configuration file");
    }
    let tools = source
        .config()
        .map(|config| config.tools.clone())
        .unwrap_or_default();

    let credentials = Arc::new(EnvCredentialsResolver::from_process());
    let proxy = Arc::new(EnvProxyResolver::from_process());

    let collaborators = BuildCollaborators {
        logger: Arc::new(TracingLogger),
        version_helper: Arc::new(PackageVersionHelper),
        config_source: source.clone(),
        credentials: credentials.clone(),
        proxy: proxy.clone(),
        tool_locator: Arc::new(ConfiguredToolLocator::new(tools)),
        launcher: Arc::new(SystemLauncher::new()),
        services: Arc::new(HttpServicesFactory::new(source, credentials, proxy)),
    };

    let step = PolarisBuildStep::new(cli.step_config(), collaborators)?;
    let build = LocalBuild::new(workspace, env::vars().collect());
    step.perform(&build);

    debug!(result = %build.result(), "Build finished");
    Ok(build.result())
}
