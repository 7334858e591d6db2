//! Lookups the build step delegates to the host.
//!
//! Credentials, proxies, CLI installations and version information belong
//! to the host; the build step only consumes these narrow interfaces. The
//! environment- and config-backed implementations here are what the
//! `polaris-step` binary wires in.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::ProxySettings;

/// Resolves a credentials id to a Polaris access token.
pub trait CredentialsResolver: Send + Sync {
    fn access_token(&self, credentials_id: &str) -> Option<String>;
}

/// Resolves the proxy to use for a server URL.
pub trait ProxyResolver: Send + Sync {
    fn proxy_for(&self, url: &str) -> Option<ProxySettings>;
}

/// Reports versions of installed plugins.
pub trait VersionHelper: Send + Sync {
    fn plugin_version(&self, name: &str) -> Option<String>;
}

/// Locates CLI installations by name.
pub trait ToolLocator: Send + Sync {
    /// Home directory of the named installation.
    fn installation_home(&self, name: &str) -> Option<PathBuf>;
}

/// Reads access tokens from environment variables named by the credentials id.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialsResolver {
    vars: HashMap<String, String>,
}

impl EnvCredentialsResolver {
    /// Resolve against the current process environment.
    pub fn from_process() -> Self {
        Self::new(std::env::vars().collect())
    }

    /// Resolve against the given variables.
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl CredentialsResolver for EnvCredentialsResolver {
    fn access_token(&self, credentials_id: &str) -> Option<String> {
        self.vars.get(credentials_id).cloned()
    }
}

/// Derives proxy settings from `HTTPS_PROXY`/`HTTP_PROXY` and `NO_PROXY`.
#[derive(Debug, Clone, Default)]
pub struct EnvProxyResolver {
    vars: HashMap<String, String>,
}

impl EnvProxyResolver {
    /// Resolve against the current process environment.
    pub fn from_process() -> Self {
        Self::new(std::env::vars().collect())
    }

    /// Resolve against the given variables.
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .or_else(|| self.vars.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn bypassed(&self, host: &str) -> bool {
        let Some(no_proxy) = self.var("NO_PROXY") else {
            return false;
        };

        no_proxy
            .split(',')
            .map(|entry| entry.trim().trim_start_matches('.'))
            .filter(|entry| !entry.is_empty())
            .any(|entry| entry == "*" || host == entry || host.ends_with(&format!(".{entry}")))
    }
}

impl ProxyResolver for EnvProxyResolver {
    fn proxy_for(&self, url: &str) -> Option<ProxySettings> {
        let target = Url::parse(url).ok()?;
        let host = target.host_str()?;
        if self.bypassed(host) {
            return None;
        }

        let raw = match target.scheme() {
            "https" => self.var("HTTPS_PROXY").or_else(|| self.var("HTTP_PROXY")),
            _ => self.var("HTTP_PROXY"),
        }?;
        let proxy = Url::parse(raw).ok()?;

        Some(ProxySettings {
            host: proxy.host_str().map(String::from),
            port: proxy.port_or_known_default().map(|port| port.to_string()),
            username: Some(proxy.username())
                .filter(|user| !user.is_empty())
                .map(decode),
            password: proxy.password().map(decode),
            ..Default::default()
        })
    }
}

/// Proxy URLs carry their credentials percent-encoded.
fn decode(component: &str) -> String {
    percent_decode_str(component).decode_utf8_lossy().into_owned()
}

/// Reports this package's version for the Polaris plugin name.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageVersionHelper;

/// Plugin name the build step reports its version under.
pub const PLUGIN_NAME: &str = "synopsys-polaris";

impl VersionHelper for PackageVersionHelper {
    fn plugin_version(&self, name: &str) -> Option<String> {
        (name == PLUGIN_NAME).then(|| env!("CARGO_PKG_VERSION").to_string())
    }
}

/// Looks CLI installations up in a name-to-home map.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredToolLocator {
    tools: BTreeMap<String, PathBuf>,
}

impl ConfiguredToolLocator {
    /// Create a locator over the given installations.
    pub fn new(tools: BTreeMap<String, PathBuf>) -> Self {
        Self { tools }
    }
}

impl ToolLocator for ConfiguredToolLocator {
    fn installation_home(&self, name: &str) -> Option<PathBuf> {
        self.tools.get(name).cloned()
    }
}
