//! Polaris-specific data and API access.
//!
//! - [`CliScanReport`] - The `cli-scan.json` report the CLI writes
//! - [`IssueService`] - Job state and issue count queries
//! - [`JobWaiter`] - Polls jobs until they complete

pub mod report;
pub mod service;

pub use report::{CliScanReport, IssueSummary, ProjectInfo, ScanInfo, ToolInfo, CLI_SCAN_REPORT};
pub use service::{
    HttpIssueService, HttpServicesFactory, IssueService, JobState, JobWaiter,
    PolarisServicesFactory,
};
