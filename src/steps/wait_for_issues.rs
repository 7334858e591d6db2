//! Counts the issues of a finished scan and marks the build.

use std::time::Duration;

use tracing::debug;

use crate::build_step::BuildCollaborators;
use crate::config::WaitForIssues;
use crate::error::{PolarisError, Result};
use crate::host::BuildContext;
use crate::polaris::{CliScanReport, JobWaiter};
use crate::workflow::{ConsumingSubStep, SubStepResponse};

use super::execute_cli::PolarisRun;

/// Waits for Polaris jobs and applies the configured status when issues exist.
///
/// Passes the run through with its issue count filled in.
pub struct WaitForPolarisIssues<'a> {
    collaborators: &'a BuildCollaborators,
    build: &'a dyn BuildContext,
    settings: &'a WaitForIssues,
    poll_interval: Duration,
}

impl<'a> WaitForPolarisIssues<'a> {
    pub fn new(
        collaborators: &'a BuildCollaborators,
        build: &'a dyn BuildContext,
        settings: &'a WaitForIssues,
    ) -> Self {
        Self {
            collaborators,
            build,
            settings,
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Change how often job states are polled.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn count_issues(&self) -> Result<u64> {
        let report = CliScanReport::load(self.build.workspace())?;

        if let Some(summary) = &report.issue_summary {
            debug!(total = summary.total, "Using issue summary from scan report");
            return Ok(summary.total);
        }

        let service = self.collaborators.services.issue_service()?;
        let timeout = Duration::from_secs(self.settings.job_timeout_in_minutes.saturating_mul(60));

        JobWaiter::new(service.as_ref(), self.build.interrupt(), timeout)
            .with_poll_interval(self.poll_interval)
            .wait_for_jobs(&report.job_status_urls())?;

        let issue_api_url = report
            .issue_api_url()
            .ok_or_else(|| PolarisError::ScanReportIncomplete {
                message: "no issue API URL".to_string(),
            })?;

        service.total_issue_count(issue_api_url)
    }

    fn wait(&self, run: PolarisRun) -> Result<PolarisRun> {
        let count = self.count_issues()?;
        self.collaborators
            .logger
            .info(&format!("[Polaris] Found {count} issue(s)"));

        if count > 0 {
            let result = self.settings.build_status_for_issues.result();
            debug!(%result, "Issues found, setting build result");
            self.build.set_result(result);
        }

        Ok(PolarisRun {
            issue_count: Some(count),
            ..run
        })
    }
}

impl ConsumingSubStep for WaitForPolarisIssues<'_> {
    type Input = PolarisRun;
    type Output = PolarisRun;

    fn name(&self) -> &str {
        "wait-for-issues"
    }

    fn run(&mut self, run: PolarisRun) -> SubStepResponse<PolarisRun> {
        self.wait(run).into()
    }
}
