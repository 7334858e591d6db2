//! Polaris server configuration.
//!
//! [`ServerConfigBuilder`] collects raw, possibly absent values for each
//! [`ServerProperty`]. [`ServerConfigBuilder::build`] validates the
//! combination and produces a [`ServerConfig`].

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::environment::{ConfigurationProperty, EnvironmentVariables};

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Validation failures of a server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No server URL was provided.
    #[error("No Polaris server URL was provided")]
    MissingUrl,

    /// The server URL does not parse.
    #[error("The Polaris server URL '{value}' is not a valid URL")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The server URL uses a scheme other than http or https.
    #[error("The Polaris server URL '{value}' must use http or https")]
    UnsupportedScheme { value: String },

    /// No access token was provided.
    #[error("No Polaris access token was provided")]
    MissingAccessToken,

    /// The timeout is not a positive number of seconds.
    #[error("The Polaris timeout '{value}' must be a positive number of seconds")]
    InvalidTimeout { value: String },

    /// Proxy details were given without a proxy host.
    #[error("A proxy {field} was provided without a proxy host")]
    ProxyHostMissing { field: &'static str },

    /// The proxy port is missing or out of range.
    #[error("The proxy port '{value}' is not a valid port")]
    InvalidProxyPort { value: String },

    /// Only one of proxy username and password was provided.
    #[error("Proxy username and password must be provided together")]
    IncompleteProxyCredentials,

    /// The trust-certificate flag is not a boolean.
    #[error("The trust certificate setting '{value}' must be true or false")]
    InvalidTrustCert { value: String },
}

/// Keys understood by [`ServerConfigBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServerProperty {
    Url,
    AccessToken,
    TimeoutInSeconds,
    ProxyHost,
    ProxyPort,
    ProxyUsername,
    ProxyPassword,
    ProxyNtlmDomain,
    ProxyNtlmWorkstation,
    TrustCert,
}

impl ServerProperty {
    /// All properties in declaration order.
    pub const ALL: [ServerProperty; 10] = [
        ServerProperty::Url,
        ServerProperty::AccessToken,
        ServerProperty::TimeoutInSeconds,
        ServerProperty::ProxyHost,
        ServerProperty::ProxyPort,
        ServerProperty::ProxyUsername,
        ServerProperty::ProxyPassword,
        ServerProperty::ProxyNtlmDomain,
        ServerProperty::ProxyNtlmWorkstation,
        ServerProperty::TrustCert,
    ];

    /// Environment variable name for this property.
    pub fn key(&self) -> &'static str {
        match self {
            ServerProperty::Url => "POLARIS_SERVER_URL",
            ServerProperty::AccessToken => "POLARIS_ACCESS_TOKEN",
            ServerProperty::TimeoutInSeconds => "POLARIS_TIMEOUT_IN_SECONDS",
            ServerProperty::ProxyHost => "POLARIS_PROXY_HOST",
            ServerProperty::ProxyPort => "POLARIS_PROXY_PORT",
            ServerProperty::ProxyUsername => "POLARIS_PROXY_USERNAME",
            ServerProperty::ProxyPassword => "POLARIS_PROXY_PASSWORD",
            ServerProperty::ProxyNtlmDomain => "POLARIS_PROXY_NTLM_DOMAIN",
            ServerProperty::ProxyNtlmWorkstation => "POLARIS_PROXY_NTLM_WORKSTATION",
            ServerProperty::TrustCert => "POLARIS_TRUST_CERT",
        }
    }
}

/// Raw proxy settings as resolved by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub host: Option<String>,
    pub port: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ntlm_domain: Option<String>,
    pub ntlm_workstation: Option<String>,
}

/// Validated proxy for HTTP calls to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyInfo {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
    pub ntlm_domain: Option<String>,
    pub ntlm_workstation: Option<String>,
}

/// Validated Polaris server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub url: Url,
    pub access_token: String,
    pub timeout: Duration,
    pub proxy: Option<ProxyInfo>,
    pub trust_cert: bool,
}

impl ServerConfig {
    /// Server URL as configured, without a trailing slash.
    pub fn url_string(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }

    /// Write the variables the Polaris CLI reads into `env`.
    pub fn populate_environment_variables(&self, env: &mut EnvironmentVariables) {
        env.put(ServerProperty::Url.key(), self.url_string());
        env.put(ServerProperty::AccessToken.key(), &self.access_token);
    }
}

/// Accumulates server properties before validation.
///
/// # Example
///
/// ```
/// use polaris_step::config::{ServerConfigBuilder, ServerProperty};
///
/// let mut builder = ServerConfigBuilder::new();
/// builder.set(ServerProperty::Url, Some("https://polaris.example.com"));
/// builder.set(ServerProperty::AccessToken, Some("token"));
///
/// let config = builder.build().unwrap();
/// assert_eq!(config.url_string(), "https://polaris.example.com");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    values: BTreeMap<ServerProperty, String>,
}

impl ServerConfigBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a property.
    pub fn set(&mut self, property: ServerProperty, value: Option<impl Into<String>>) -> &mut Self {
        match value {
            Some(value) => {
                self.values.insert(property, value.into());
            }
            None => {
                self.values.remove(&property);
            }
        }
        self
    }

    /// Apply resolved proxy settings.
    pub fn set_proxy(&mut self, proxy: ProxySettings) -> &mut Self {
        self.set(ServerProperty::ProxyHost, proxy.host)
            .set(ServerProperty::ProxyPort, proxy.port)
            .set(ServerProperty::ProxyUsername, proxy.username)
            .set(ServerProperty::ProxyPassword, proxy.password)
            .set(ServerProperty::ProxyNtlmDomain, proxy.ntlm_domain)
            .set(ServerProperty::ProxyNtlmWorkstation, proxy.ntlm_workstation)
    }

    /// Get a raw property value.
    pub fn get(&self, property: ServerProperty) -> Option<&str> {
        self.values.get(&property).map(String::as_str)
    }

    /// All properties with their raw values, in declaration order.
    pub fn properties(&self) -> Vec<ConfigurationProperty> {
        ServerProperty::ALL
            .iter()
            .map(|property| ConfigurationProperty::new(property.key(), self.get(*property)))
            .collect()
    }

    /// Validate the properties into a [`ServerConfig`].
    pub fn build(&self) -> Result<ServerConfig, ConfigError> {
        let raw_url = self.non_blank(ServerProperty::Url).ok_or(ConfigError::MissingUrl)?;
        let url = Url::parse(raw_url).map_err(|source| ConfigError::InvalidUrl {
            value: raw_url.to_string(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                value: raw_url.to_string(),
            });
        }

        let access_token = self
            .non_blank(ServerProperty::AccessToken)
            .ok_or(ConfigError::MissingAccessToken)?
            .to_string();

        let timeout = match self.non_blank(ServerProperty::TimeoutInSeconds) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        value: raw.to_string(),
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        };

        let trust_cert = match self.non_blank(ServerProperty::TrustCert) {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidTrustCert {
                    value: raw.to_string(),
                })?,
            None => false,
        };

        Ok(ServerConfig {
            url,
            access_token,
            timeout,
            proxy: self.build_proxy()?,
            trust_cert,
        })
    }

    fn build_proxy(&self) -> Result<Option<ProxyInfo>, ConfigError> {
        let port = self.non_blank(ServerProperty::ProxyPort);
        let username = self.non_blank(ServerProperty::ProxyUsername);
        let password = self.non_blank(ServerProperty::ProxyPassword);
        let ntlm_domain = self.non_blank(ServerProperty::ProxyNtlmDomain);
        let ntlm_workstation = self.non_blank(ServerProperty::ProxyNtlmWorkstation);

        let Some(host) = self.non_blank(ServerProperty::ProxyHost) else {
            let stray = [
                ("port", port),
                ("username", username),
                ("password", password),
                ("NTLM domain", ntlm_domain),
                ("NTLM workstation", ntlm_workstation),
            ]
            .into_iter()
            .find_map(|(field, value)| value.map(|_| field));

            return match stray {
                Some(field) => Err(ConfigError::ProxyHostMissing { field }),
                None => Ok(None),
            };
        };

        let port = port
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .filter(|port| *port > 0)
            .ok_or_else(|| ConfigError::InvalidProxyPort {
                value: port.unwrap_or_default().to_string(),
            })?;

        let credentials = match (username, password) {
            (Some(user), Some(pass)) => Some((user.to_string(), pass.to_string())),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteProxyCredentials),
        };

        Ok(Some(ProxyInfo {
            host: host.trim().to_string(),
            port,
            credentials,
            ntlm_domain: ntlm_domain.map(String::from),
            ntlm_workstation: ntlm_workstation.map(String::from),
        }))
    }

    fn non_blank(&self, property: ServerProperty) -> Option<&str> {
        self.get(property).filter(|value| !value.trim().is_empty())
    }
}
