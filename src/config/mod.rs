//! Configuration for the Polaris build step.
//!
//! This module handles all configuration concerns:
//! - Server properties and their validation in [`server`]
//! - The host-owned global configuration in [`global`]
//! - The per-step configuration in [`step`]
//! - CLI argument expansion and tokenizing in [`arguments`]
//!
//! # Example
//!
//! ```
//! use polaris_step::config::{ServerConfigBuilder, ServerProperty, ConfigError};
//!
//! let mut builder = ServerConfigBuilder::new();
//! builder.set(ServerProperty::Url, Some("https://polaris.example.com"));
//!
//! assert!(matches!(builder.build(), Err(ConfigError::MissingAccessToken)));
//! ```

pub mod arguments;
pub mod global;
pub mod server;
pub mod step;

pub use arguments::{expand_variables, prepare_arguments, tokenize};
pub use global::{
    load_global_config, FileGlobalConfigSource, GlobalConfigSource, PolarisGlobalConfig,
};
pub use server::{
    ConfigError, ProxyInfo, ProxySettings, ServerConfig, ServerConfigBuilder, ServerProperty,
    DEFAULT_TIMEOUT_SECONDS,
};
pub use step::{BuildStepConfig, IssueBuildStatus, WaitForIssues, DEFAULT_JOB_TIMEOUT_MINUTES};
