//! Global Polaris configuration.
//!
//! The host owns the global configuration; the build step only looks it up
//! through [`GlobalConfigSource`] and turns it into a
//! [`ServerConfigBuilder`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PolarisError, Result};
use crate::host::{CredentialsResolver, ProxyResolver};

use super::server::{ServerConfigBuilder, ServerProperty};

/// Server-wide Polaris settings.
///
/// # Example
///
/// ```
/// use polaris_step::config::PolarisGlobalConfig;
///
/// let config: PolarisGlobalConfig = serde_yaml::from_str(
///     "polaris_url: https://polaris.example.com\npolaris_credentials_id: POLARIS_TOKEN\n",
/// )
/// .unwrap();
/// assert_eq!(config.polaris_url.as_deref(), Some("https://polaris.example.com"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PolarisGlobalConfig {
    /// Polaris server URL.
    pub polaris_url: Option<String>,

    /// Identifier handed to the credentials resolver for the access token.
    pub polaris_credentials_id: Option<String>,

    /// HTTP timeout in seconds.
    pub polaris_timeout: Option<u64>,

    /// Accept untrusted server certificates.
    pub trust_cert: Option<bool>,

    /// CLI installations: name to installation home.
    pub tools: BTreeMap<String, PathBuf>,
}

impl PolarisGlobalConfig {
    /// Fill a server configuration builder from these settings.
    ///
    /// The access token comes from `credentials`, and proxy settings for
    /// the server URL from `proxy`. Nothing is validated here.
    pub fn server_config_builder(
        &self,
        credentials: &dyn CredentialsResolver,
        proxy: &dyn ProxyResolver,
    ) -> ServerConfigBuilder {
        let mut builder = ServerConfigBuilder::new();

        builder
            .set(ServerProperty::Url, self.polaris_url.clone())
            .set(
                ServerProperty::AccessToken,
                self.polaris_credentials_id
                    .as_deref()
                    .and_then(|id| credentials.access_token(id)),
            )
            .set(
                ServerProperty::TimeoutInSeconds,
                self.polaris_timeout.map(|seconds| seconds.to_string()),
            )
            .set(
                ServerProperty::TrustCert,
                self.trust_cert.map(|trust| trust.to_string()),
            );

        if let Some(settings) = self.polaris_url.as_deref().and_then(|url| proxy.proxy_for(url)) {
            builder.set_proxy(settings);
        }

        builder
    }
}

/// Where the build step looks up the global configuration.
pub trait GlobalConfigSource: Send + Sync {
    /// The registered configuration, if any.
    fn lookup(&self) -> Option<PolarisGlobalConfig>;
}

impl GlobalConfigSource for Option<PolarisGlobalConfig> {
    fn lookup(&self) -> Option<PolarisGlobalConfig> {
        self.clone()
    }
}

/// Global configuration loaded from a YAML file.
#[derive(Debug, Clone, Default)]
pub struct FileGlobalConfigSource {
    config: Option<PolarisGlobalConfig>,
}

impl FileGlobalConfigSource {
    /// Load the file at `path` once.
    ///
    /// A missing file yields a source that looks up nothing.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            config: load_global_config(path)?,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> Option<&PolarisGlobalConfig> {
        self.config.as_ref()
    }
}

impl GlobalConfigSource for FileGlobalConfigSource {
    fn lookup(&self) -> Option<PolarisGlobalConfig> {
        self.config.clone()
    }
}

/// Load a global configuration file.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// Returns `GlobalConfigParse` if the YAML is invalid.
pub fn load_global_config(path: &Path) -> Result<Option<PolarisGlobalConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PolarisError::Io(e)),
    };

    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| PolarisError::GlobalConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
