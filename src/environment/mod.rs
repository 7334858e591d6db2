//! Environment mapping handed to the Polaris CLI process.
//!
//! - [`EnvironmentVariables`] - Ordered, blank-filtered key/value mapping
//! - [`ConfigurationProperty`] - One resolved configuration key and value

pub mod variables;

pub use variables::{ConfigurationProperty, EnvironmentVariables};
