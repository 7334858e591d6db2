//! Collaborators the build step consumes from its host.
//!
//! - [`BuildContext`] - The running build: workspace, environment, result
//! - [`BuildLogger`] - The build log
//! - [`Interrupt`] - Host-initiated cancellation
//! - [`CredentialsResolver`], [`ProxyResolver`], [`VersionHelper`],
//!   [`ToolLocator`] - Lookups owned by the host

pub mod build;
pub mod interrupt;
pub mod logger;
pub mod resolvers;

pub use build::{BuildContext, BuildResult, LocalBuild};
pub use interrupt::Interrupt;
pub use logger::{BuildLogger, LogEntry, RecordingLogger, TracingLogger};
pub use resolvers::{
    ConfiguredToolLocator, CredentialsResolver, EnvCredentialsResolver, EnvProxyResolver,
    PackageVersionHelper, ProxyResolver, ToolLocator, VersionHelper, PLUGIN_NAME,
};
