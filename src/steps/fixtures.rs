//! Test doubles shared by the sub-step and build-step tests.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::build_step::BuildCollaborators;
use crate::config::PolarisGlobalConfig;
use crate::error::Result;
use crate::host::{
    ConfiguredToolLocator, EnvCredentialsResolver, EnvProxyResolver, Interrupt, LocalBuild,
    RecordingLogger, VersionHelper,
};
use crate::polaris::{IssueService, JobState, PolarisServicesFactory, CLI_SCAN_REPORT};
use crate::shell::{LaunchRequest, ProcessLauncher};

use super::find_cli::executable_name;

/// One recorded launch.
#[derive(Debug, Clone)]
pub(crate) struct Launch {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: PathBuf,
}

/// Records launches and returns a fixed exit code.
#[derive(Debug, Default)]
pub(crate) struct FakeLauncher {
    exit_code: i32,
    launches: Mutex<Vec<Launch>>,
}

impl FakeLauncher {
    pub fn with_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn launches(&self) -> Vec<Launch> {
        self.launches.lock().unwrap().clone()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, request: &LaunchRequest<'_>, interrupt: &Interrupt) -> Result<i32> {
        interrupt.check()?;
        self.launches.lock().unwrap().push(Launch {
            program: request.program.to_path_buf(),
            args: request.args.to_vec(),
            env: request.env.clone(),
            cwd: request.cwd.to_path_buf(),
        });
        Ok(self.exit_code)
    }
}

pub(crate) struct FixedVersion(pub Option<String>);

impl VersionHelper for FixedVersion {
    fn plugin_version(&self, _name: &str) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Clone)]
pub(crate) struct FakeIssueService {
    state: JobState,
    count: u64,
}

impl IssueService for FakeIssueService {
    fn job_state(&self, _job_status_url: &str) -> Result<JobState> {
        Ok(self.state.clone())
    }

    fn total_issue_count(&self, _issue_api_url: &str) -> Result<u64> {
        Ok(self.count)
    }
}

impl PolarisServicesFactory for FakeIssueService {
    fn issue_service(&self) -> Result<Box<dyn IssueService>> {
        Ok(Box::new(self.clone()))
    }
}

/// Global configuration that builds a valid server configuration.
pub(crate) fn valid_global() -> PolarisGlobalConfig {
    PolarisGlobalConfig {
        polaris_url: Some("https://polaris.example.com".into()),
        polaris_credentials_id: Some("POLARIS_TOKEN".into()),
        ..Default::default()
    }
}

/// Write a scan report into `workspace`.
pub(crate) fn write_scan_report(workspace: &Path, content: &str) {
    let path = workspace.join(CLI_SCAN_REPORT);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Temporary workspace and tool home with fake collaborators.
pub(crate) struct Fixture {
    pub temp: TempDir,
    pub logger: Arc<RecordingLogger>,
    pub launcher: Arc<FakeLauncher>,
    pub collaborators: BuildCollaborators,
}

impl Fixture {
    pub fn new(global: Option<PolarisGlobalConfig>) -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("workspace")).unwrap();

        let logger = Arc::new(RecordingLogger::new());
        let launcher = Arc::new(FakeLauncher::default());
        let tools = BTreeMap::from([("default".to_string(), temp.path().join("tools/default"))]);

        let collaborators = BuildCollaborators {
            logger: logger.clone(),
            version_helper: Arc::new(FixedVersion(Some("1.0.0".into()))),
            config_source: Arc::new(global),
            credentials: Arc::new(EnvCredentialsResolver::new(HashMap::from([(
                "POLARIS_TOKEN".to_string(),
                "secret-token".to_string(),
            )]))),
            proxy: Arc::new(EnvProxyResolver::default()),
            tool_locator: Arc::new(ConfiguredToolLocator::new(tools)),
            launcher: launcher.clone(),
            services: Arc::new(FakeIssueService {
                state: JobState::Completed,
                count: 0,
            }),
        };

        Self {
            temp,
            logger,
            launcher,
            collaborators,
        }
    }

    pub fn with_version(mut self, version: Option<&str>) -> Self {
        self.collaborators.version_helper = Arc::new(FixedVersion(version.map(String::from)));
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.launcher = Arc::new(FakeLauncher::with_exit_code(exit_code));
        self.collaborators.launcher = self.launcher.clone();
        self
    }

    pub fn with_service(mut self, state: JobState, count: u64) -> Self {
        self.collaborators.services = Arc::new(FakeIssueService { state, count });
        self
    }

    /// Create `bin/polaris` in the `default` installation.
    pub fn install_cli(&self) -> PathBuf {
        let bin = self.temp.path().join("tools/default/bin");
        fs::create_dir_all(&bin).unwrap();
        let executable = bin.join(executable_name());
        fs::write(&executable, "").unwrap();
        executable
    }

    pub fn build(&self) -> LocalBuild {
        self.build_with_env(HashMap::new())
    }

    pub fn build_with_env(&self, env: HashMap<String, String>) -> LocalBuild {
        LocalBuild::new(self.temp.path().join("workspace"), env)
    }
}
