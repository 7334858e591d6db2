//! The scan report the Polaris CLI writes into the workspace.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PolarisError, Result};

/// Location of the scan report relative to the workspace.
pub const CLI_SCAN_REPORT: &str = ".synopsys/polaris/cli-scan.json";

/// Contents of `cli-scan.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliScanReport {
    pub scan_info: Option<ScanInfo>,
    pub project_info: Option<ProjectInfo>,
    pub issue_summary: Option<IssueSummary>,
    pub tools: Vec<ToolInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanInfo {
    pub cli_version: Option<String>,
    pub scan_time: Option<String>,
    pub issue_api_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectInfo {
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub branch_id: Option<String>,
    pub revision_id: Option<String>,
}

/// Issue totals, present when the CLI waited for its jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueSummary {
    pub issues_by_severity: BTreeMap<String, u64>,
    pub summary_url: Option<String>,
    pub total: u64,
}

/// One analysis tool the CLI dispatched a job for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolInfo {
    pub tool_name: Option<String>,
    pub tool_version: Option<String>,
    pub job_id: Option<String>,
    pub job_status_url: Option<String>,
    pub job_status: Option<String>,
    pub issue_api_url: Option<String>,
}

impl CliScanReport {
    /// Path of the report inside `workspace`.
    pub fn path_in(workspace: &Path) -> PathBuf {
        workspace.join(CLI_SCAN_REPORT)
    }

    /// Read the report the CLI left in `workspace`.
    ///
    /// # Errors
    ///
    /// Returns `ScanReportMissing` if the file does not exist and
    /// `ScanReportInvalid` if it is not a valid report.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = Self::path_in(workspace);
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PolarisError::ScanReportMissing { path: path.clone() }
            } else {
                PolarisError::Io(e)
            }
        })?;

        serde_json::from_str(&content).map_err(|source| PolarisError::ScanReportInvalid { path, source })
    }

    /// Status URLs of every dispatched job.
    pub fn job_status_urls(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter_map(|tool| tool.job_status_url.as_deref())
            .collect()
    }

    /// URL to query issue counts from.
    pub fn issue_api_url(&self) -> Option<&str> {
        self.scan_info
            .as_ref()
            .and_then(|info| info.issue_api_url.as_deref())
            .or_else(|| self.tools.iter().find_map(|tool| tool.issue_api_url.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REPORT: &str = r#"{
        "scanInfo": {
            "cliVersion": "1.9.3",
            "scanTime": "2026-10-01T12:00:00Z",
            "issueApiUrl": "https://polaris.example.com/api/query/v1/issues?project-id=p1"
        },
        "projectInfo": { "projectName": "demo", "projectId": "p1", "branchId": "b1", "revisionId": "r1" },
        "issueSummary": {
            "issuesBySeverity": { "high": 2, "medium": 3 },
            "summaryUrl": "https://polaris.example.com/projects/p1",
            "total": 5
        },
        "tools": [
            {
                "toolName": "Coverity",
                "toolVersion": "2026.6",
                "jobId": "j1",
                "jobStatusUrl": "https://polaris.example.com/api/jobs/jobs/j1",
                "jobStatus": "COMPLETED"
            }
        ]
    }"#;

    fn write_report(content: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let path = CliScanReport::path_in(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        temp
    }

    #[test]
    fn loads_full_report() {
        let temp = write_report(REPORT);
        let report = CliScanReport::load(temp.path()).unwrap();

        assert_eq!(report.issue_summary.as_ref().map(|s| s.total), Some(5));
        assert_eq!(report.project_info.unwrap().project_name.as_deref(), Some("demo"));
        assert_eq!(report.tools.len(), 1);
    }

    #[test]
    fn collects_job_status_urls() {
        let temp = write_report(REPORT);
        let report = CliScanReport::load(temp.path()).unwrap();
        assert_eq!(report.job_status_urls(), vec!["https://polaris.example.com/api/jobs/jobs/j1"]);
    }

    #[test]
    fn issue_api_url_falls_back_to_tools() {
        let report = CliScanReport {
            tools: vec![ToolInfo {
                issue_api_url: Some("https://polaris.example.com/issues".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(report.issue_api_url(), Some("https://polaris.example.com/issues"));
    }

    #[test]
    fn tolerates_missing_sections() {
        let temp = write_report(r#"{ "tools": [] }"#);
        let report = CliScanReport::load(temp.path()).unwrap();
        assert!(report.issue_summary.is_none());
        assert!(report.issue_api_url().is_none());
    }

    #[test]
    fn missing_report_is_reported() {
        let temp = TempDir::new().unwrap();
        let err = CliScanReport::load(temp.path()).unwrap_err();
        assert!(matches!(err, PolarisError::ScanReportMissing { .. }));
    }

    #[test]
    fn invalid_report_is_reported() {
        let temp = write_report("{ not json");
        let err = CliScanReport::load(temp.path()).unwrap_err();
        assert!(matches!(err, PolarisError::ScanReportInvalid { .. }));
    }
}
