//! The host build a step runs in.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::interrupt::Interrupt;

/// Overall result of a host build.
///
/// Ordered from best to worst; a build result only ever gets worse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildResult {
    #[default]
    Success,
    Unstable,
    Failure,
    Aborted,
}

impl BuildResult {
    /// The worse of two results.
    pub fn combine(self, other: BuildResult) -> BuildResult {
        self.max(other)
    }

    /// Process exit code for this result.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildResult::Success => 0,
            BuildResult::Failure => 1,
            BuildResult::Unstable => 2,
            BuildResult::Aborted => 130,
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::Aborted => "ABORTED",
        };
        write!(f, "{}", s)
    }
}

/// What a build step sees of the host build.
pub trait BuildContext {
    /// Directory the build runs in.
    fn workspace(&self) -> &Path;

    /// Environment of the build.
    fn environment(&self) -> &HashMap<String, String>;

    /// Cancellation flag the host sets to interrupt the build.
    fn interrupt(&self) -> &Interrupt;

    /// Record a result; never improves on a worse recorded result.
    fn set_result(&self, result: BuildResult);

    /// The current result.
    fn result(&self) -> BuildResult;
}

/// A build running in a local directory.
///
/// # Example
///
/// ```
/// use polaris_step::host::{BuildContext, BuildResult, LocalBuild};
/// use std::collections::HashMap;
///
/// let build = LocalBuild::new("/tmp/workspace", HashMap::new());
/// build.set_result(BuildResult::Unstable);
/// build.set_result(BuildResult::Success);
/// assert_eq!(build.result(), BuildResult::Unstable);
/// ```
#[derive(Debug)]
pub struct LocalBuild {
    workspace: PathBuf,
    environment: HashMap<String, String>,
    interrupt: Interrupt,
    result: Cell<BuildResult>,
}

impl LocalBuild {
    /// Create a build for `workspace` with the given environment.
    pub fn new(workspace: impl Into<PathBuf>, environment: HashMap<String, String>) -> Self {
        Self {
            workspace: workspace.into(),
            environment,
            interrupt: Interrupt::new(),
            result: Cell::new(BuildResult::Success),
        }
    }

    /// Use an externally owned interrupt flag.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }
}

impl BuildContext for LocalBuild {
    fn workspace(&self) -> &Path {
        &self.workspace
    }

    fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn set_result(&self, result: BuildResult) {
        self.result.set(self.result.get().combine(result));
    }

    fn result(&self) -> BuildResult {
        self.result.get()
    }
}
