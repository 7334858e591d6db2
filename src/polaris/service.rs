//! Polaris job and issue queries.
//!
//! [`IssueService`] is the narrow view of the Polaris API the build step
//! needs; [`HttpIssueService`] implements it over HTTP and
//! [`HttpServicesFactory`] creates one from the global configuration.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{GlobalConfigSource, ServerConfig};
use crate::error::{PolarisError, Result};
use crate::host::{CredentialsResolver, Interrupt, ProxyResolver};

/// State of a Polaris job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Dispatched,
    Running,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl JobState {
    /// Parse a state name as the server reports it.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => JobState::Queued,
            "DISPATCHED" => JobState::Dispatched,
            "RUNNING" => JobState::Running,
            "COMPLETED" => JobState::Completed,
            "FAILED" => JobState::Failed,
            "CANCELLED" => JobState::Cancelled,
            _ => JobState::Other(raw.to_string()),
        }
    }

    /// Whether the job will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Cancelled)
    }

    fn name(&self) -> &str {
        match self {
            JobState::Queued => "QUEUED",
            JobState::Dispatched => "DISPATCHED",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
            JobState::Other(raw) => raw,
        }
    }
}

/// Queries against the Polaris API.
pub trait IssueService {
    /// Current state of the job behind `job_status_url`.
    fn job_state(&self, job_status_url: &str) -> Result<JobState>;

    /// Total number of issues reported by `issue_api_url`.
    fn total_issue_count(&self, issue_api_url: &str) -> Result<u64>;
}

/// Creates API services on demand.
pub trait PolarisServicesFactory: Send + Sync {
    fn issue_service(&self) -> Result<Box<dyn IssueService>>;
}

/// Polls jobs until they complete, fail or time out.
pub struct JobWaiter<'a> {
    service: &'a dyn IssueService,
    interrupt: &'a Interrupt,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'a> JobWaiter<'a> {
    /// Create a waiter polling every five seconds.
    pub fn new(service: &'a dyn IssueService, interrupt: &'a Interrupt, timeout: Duration) -> Self {
        Self {
            service,
            interrupt,
            timeout,
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Change the polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Wait for every job to reach `COMPLETED`.
    ///
    /// The timeout covers all jobs together. A timeout too large to
    /// represent as a deadline means waiting without one.
    ///
    /// # Errors
    ///
    /// Returns `JobFailed` for a failed or cancelled job, `JobTimeout` when
    /// the deadline passes and `Interrupted` if the host cancels the build.
    pub fn wait_for_jobs(&self, job_status_urls: &[&str]) -> Result<()> {
        let deadline = Instant::now().checked_add(self.timeout);

        for url in job_status_urls {
            loop {
                self.interrupt.check()?;

                let state = self.service.job_state(url)?;
                debug!(url, state = state.name(), "Polled Polaris job");

                if state == JobState::Completed {
                    break;
                }
                if state.is_terminal() {
                    return Err(PolarisError::JobFailed {
                        url: url.to_string(),
                        state: state.name().to_string(),
                    });
                }

                let pause = match deadline {
                    Some(deadline) => {
                        let now = Instant::now();
                        if now >= deadline {
                            return Err(PolarisError::JobTimeout {
                                minutes: self.timeout.as_secs() / 60,
                            });
                        }
                        self.poll_interval.min(deadline - now)
                    }
                    None => self.poll_interval,
                };
                thread::sleep(pause);
            }
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    jwt: String,
}

#[derive(Deserialize)]
struct JobResource {
    data: JobData,
}

#[derive(Deserialize)]
struct JobData {
    attributes: JobAttributes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobAttributes {
    state: String,
    #[serde(default)]
    failure_info: Option<FailureInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureInfo {
    #[serde(default)]
    user_friendly_failure_reason: Option<String>,
}

#[derive(Deserialize)]
struct CountResources {
    #[serde(default)]
    data: Vec<CountResource>,
}

#[derive(Deserialize)]
struct CountResource {
    attributes: CountAttributes,
}

#[derive(Deserialize)]
struct CountAttributes {
    value: u64,
}

/// [`IssueService`] backed by the Polaris REST API.
pub struct HttpIssueService {
    client: Client,
    jwt: String,
}

impl HttpIssueService {
    /// Build a client for `config` and authenticate with its access token.
    pub fn connect(config: &ServerConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("polaris-step/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.trust_cert);

        if let Some(proxy) = &config.proxy {
            let mut http_proxy = reqwest::Proxy::all(format!("http://{}:{}", proxy.host, proxy.port))?;
            if let Some((username, password)) = &proxy.credentials {
                http_proxy = http_proxy.basic_auth(username, password);
            }
            if proxy.ntlm_domain.is_some() || proxy.ntlm_workstation.is_some() {
                warn!("NTLM proxy authentication is not supported, using basic credentials");
            }
            builder = builder.proxy(http_proxy);
        }

        let client = builder.build()?;
        let jwt = authenticate(&client, config)?;

        Ok(Self { client, jwt })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.jwt)
            .header("Accept", "application/vnd.api+json")
            .send()?;

        if !response.status().is_success() {
            return Err(PolarisError::ServerResponse {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        Ok(response.json()?)
    }
}

fn authenticate(client: &Client, config: &ServerConfig) -> Result<String> {
    let url = format!("{}/api/auth/authenticate", config.url_string());
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("accesstoken", &config.access_token)
        .finish();

    let response = client
        .post(&url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()?;

    if !response.status().is_success() {
        return Err(PolarisError::ServerResponse {
            url,
            message: format!("authentication failed with HTTP {}", response.status()),
        });
    }

    let auth: AuthResponse = response.json()?;
    Ok(auth.jwt)
}

impl IssueService for HttpIssueService {
    fn job_state(&self, job_status_url: &str) -> Result<JobState> {
        let job: JobResource = self.get_json(job_status_url)?;
        let attributes = job.data.attributes;

        if let Some(reason) = attributes
            .failure_info
            .and_then(|info| info.user_friendly_failure_reason)
        {
            debug!(url = job_status_url, %reason, "Polaris job reported a failure reason");
        }

        Ok(JobState::parse(&attributes.state))
    }

    fn total_issue_count(&self, issue_api_url: &str) -> Result<u64> {
        let counts: CountResources = self.get_json(issue_api_url)?;
        Ok(counts.data.iter().map(|count| count.attributes.value).sum())
    }
}

/// Creates [`HttpIssueService`]s from the global configuration.
pub struct HttpServicesFactory {
    config_source: Arc<dyn GlobalConfigSource>,
    credentials: Arc<dyn CredentialsResolver>,
    proxy: Arc<dyn ProxyResolver>,
}

impl HttpServicesFactory {
    pub fn new(
        config_source: Arc<dyn GlobalConfigSource>,
        credentials: Arc<dyn CredentialsResolver>,
        proxy: Arc<dyn ProxyResolver>,
    ) -> Self {
        Self {
            config_source,
            credentials,
            proxy,
        }
    }
}

impl PolarisServicesFactory for HttpServicesFactory {
    fn issue_service(&self) -> Result<Box<dyn IssueService>> {
        let global = self
            .config_source
            .lookup()
            .ok_or(PolarisError::ConfigurationMissing)?;
        let config = global
            .server_config_builder(self.credentials.as_ref(), self.proxy.as_ref())
            .build()?;

        Ok(Box::new(HttpIssueService::connect(&config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PolarisGlobalConfig, ServerConfigBuilder, ServerProperty};
    use crate::host::{EnvCredentialsResolver, EnvProxyResolver};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    struct ScriptedService {
        states: Mutex<VecDeque<JobState>>,
        polls: Mutex<usize>,
    }

    impl ScriptedService {
        fn new(states: Vec<JobState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                polls: Mutex::new(0),
            }
        }

        fn polls(&self) -> usize {
            *self.polls.lock().unwrap()
        }
    }

    impl IssueService for ScriptedService {
        fn job_state(&self, _job_status_url: &str) -> Result<JobState> {
            *self.polls.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            Ok(if states.len() > 1 {
                states.pop_front().unwrap()
            } else {
                states.front().cloned().unwrap()
            })
        }

        fn total_issue_count(&self, _issue_api_url: &str) -> Result<u64> {
            Ok(0)
        }
    }

    fn server_config(server: &MockServer) -> ServerConfig {
        let mut builder = ServerConfigBuilder::new();
        builder
            .set(ServerProperty::Url, Some(server.base_url()))
            .set(ServerProperty::AccessToken, Some("secret-token"));
        builder.build().unwrap()
    }

    fn mock_auth(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/authenticate")
                .body("accesstoken=secret-token");
            then.status(200).json_body(json!({ "jwt": "jwt-token" }));
        })
    }

    #[test]
    fn parses_job_states() {
        assert_eq!(JobState::parse("completed"), JobState::Completed);
        assert_eq!(JobState::parse("RUNNING"), JobState::Running);
        assert_eq!(JobState::parse("WEIRD"), JobState::Other("WEIRD".into()));
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Queued.is_terminal());
    }

    #[test]
    fn waits_until_completed() {
        let service = ScriptedService::new(vec![JobState::Queued, JobState::Running, JobState::Completed]);
        let interrupt = Interrupt::new();

        JobWaiter::new(&service, &interrupt, Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(1))
            .wait_for_jobs(&["job-1"])
            .unwrap();

        assert_eq!(service.polls(), 3);
    }

    #[test]
    fn failed_job_is_error() {
        let service = ScriptedService::new(vec![JobState::Running, JobState::Failed]);
        let interrupt = Interrupt::new();

        let err = JobWaiter::new(&service, &interrupt, Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(1))
            .wait_for_jobs(&["job-1"])
            .unwrap_err();

        match err {
            PolarisError::JobFailed { url, state } => {
                assert_eq!(url, "job-1");
                assert_eq!(state, "FAILED");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn times_out_when_job_never_completes() {
        let service = ScriptedService::new(vec![JobState::Running]);
        let interrupt = Interrupt::new();

        let err = JobWaiter::new(&service, &interrupt, Duration::from_millis(30))
            .with_poll_interval(Duration::from_millis(5))
            .wait_for_jobs(&["job-1"])
            .unwrap_err();

        assert!(matches!(err, PolarisError::JobTimeout { .. }));
    }

    #[test]
    fn unrepresentable_timeout_waits_without_deadline() {
        let service = ScriptedService::new(vec![JobState::Running, JobState::Completed]);
        let interrupt = Interrupt::new();

        JobWaiter::new(&service, &interrupt, Duration::MAX)
            .with_poll_interval(Duration::from_millis(1))
            .wait_for_jobs(&["job-1"])
            .unwrap();

        assert_eq!(service.polls(), 2);
    }

    #[test]
    fn interrupt_stops_waiting() {
        let service = ScriptedService::new(vec![JobState::Running]);
        let interrupt = Interrupt::new();
        interrupt.interrupt();

        let err = JobWaiter::new(&service, &interrupt, Duration::from_secs(5))
            .wait_for_jobs(&["job-1"])
            .unwrap_err();

        assert!(matches!(err, PolarisError::Interrupted));
        assert_eq!(service.polls(), 0);
    }

    #[test]
    fn http_service_reads_job_state() {
        let server = MockServer::start();
        let auth = mock_auth(&server);
        let job = server.mock(|when, then| {
            when.method(GET)
                .path("/api/jobs/jobs/j1")
                .header("authorization", "Bearer jwt-token");
            then.status(200)
                .json_body(json!({ "data": { "attributes": { "state": "COMPLETED" } } }));
        });

        let service = HttpIssueService::connect(&server_config(&server)).unwrap();
        let state = service.job_state(&server.url("/api/jobs/jobs/j1")).unwrap();

        assert_eq!(state, JobState::Completed);
        auth.assert();
        job.assert();
    }

    #[test]
    fn http_service_sums_issue_counts() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/api/query/v1/issues");
            then.status(200).json_body(json!({
                "data": [
                    { "attributes": { "value": 4 } },
                    { "attributes": { "value": 3 } }
                ]
            }));
        });

        let service = HttpIssueService::connect(&server_config(&server)).unwrap();
        let count = service
            .total_issue_count(&server.url("/api/query/v1/issues"))
            .unwrap();

        assert_eq!(count, 7);
    }

    #[test]
    fn failed_authentication_is_server_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/authenticate");
            then.status(401);
        });

        let err = HttpIssueService::connect(&server_config(&server))
            .err()
            .unwrap();
        assert!(err.to_string().contains("authentication failed"));
    }

    #[test]
    fn http_error_status_is_reported() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/api/jobs/jobs/missing");
            then.status(404);
        });

        let service = HttpIssueService::connect(&server_config(&server)).unwrap();
        let err = service
            .job_state(&server.url("/api/jobs/jobs/missing"))
            .unwrap_err();
        assert!(err.to_string().contains("404"), "unexpected: {err}");
    }

    #[test]
    fn factory_requires_global_configuration() {
        let factory = HttpServicesFactory::new(
            Arc::new(None::<PolarisGlobalConfig>),
            Arc::new(EnvCredentialsResolver::default()),
            Arc::new(EnvProxyResolver::default()),
        );

        let err = factory.issue_service().err().unwrap();
        assert!(matches!(err, PolarisError::ConfigurationMissing));
    }

    #[test]
    fn factory_connects_with_resolved_token() {
        let server = MockServer::start();
        let auth = mock_auth(&server);
        let global = PolarisGlobalConfig {
            polaris_url: Some(server.base_url()),
            polaris_credentials_id: Some("POLARIS_TOKEN".into()),
            ..Default::default()
        };
        let factory = HttpServicesFactory::new(
            Arc::new(Some(global)),
            Arc::new(EnvCredentialsResolver::new(HashMap::from([(
                "POLARIS_TOKEN".to_string(),
                "secret-token".to_string(),
            )]))),
            Arc::new(EnvProxyResolver::default()),
        );

        assert!(factory.issue_service().is_ok());
        auth.assert();
    }
}
