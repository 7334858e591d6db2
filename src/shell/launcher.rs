//! Launching the Polaris CLI.

use std::collections::HashMap;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::{PolarisError, Result};
use crate::host::Interrupt;

/// Everything needed to start one process.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    /// Executable to run.
    pub program: &'a Path,

    /// Arguments, not including the program.
    pub args: &'a [String],

    /// Variables set for the child on top of the inherited environment.
    pub env: &'a HashMap<String, String>,

    /// Working directory.
    pub cwd: &'a Path,
}

/// Starts external processes and waits for them.
pub trait ProcessLauncher: Send + Sync {
    /// Run the process to completion and return its exit code.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentLaunchFailure` if the process cannot start and
    /// `Interrupted` if `interrupt` is set while it runs or the process is
    /// killed by a signal.
    fn launch(&self, request: &LaunchRequest<'_>, interrupt: &Interrupt) -> Result<i32>;
}

/// Launches real processes with inherited stdio.
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    poll_interval: Duration,
}

impl SystemLauncher {
    /// Create a launcher that checks for interruption every 100ms.
    pub fn new() -> Self {
        Self::with_poll_interval(Duration::from_millis(100))
    }

    /// Create a launcher with a custom interruption check interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, request: &LaunchRequest<'_>, interrupt: &Interrupt) -> Result<i32> {
        interrupt.check()?;

        let mut cmd = Command::new(request.program);
        cmd.args(request.args)
            .current_dir(request.cwd)
            .envs(request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        debug!(program = %request.program.display(), args = ?request.args, "Launching process");

        let mut child = cmd
            .spawn()
            .map_err(|source| PolarisError::EnvironmentLaunchFailure {
                program: request.program.to_path_buf(),
                source,
            })?;

        loop {
            if interrupt.is_interrupted() {
                debug!("Interrupted, killing child process");
                terminate(&mut child);
                return Err(PolarisError::Interrupted);
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(?status, "Process exited");
                    return status.code().ok_or(PolarisError::Interrupted);
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    debug!(error = %e, "Lost track of child process, killing it");
                    terminate(&mut child);
                    return Err(PolarisError::Io(e));
                }
            }
        }
    }
}

/// Kill the child and reap it so no process outlives the launch.
fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "Failed to kill child process");
    }
    if let Err(e) = child.wait() {
        debug!(error = %e, "Failed to reap child process");
    }
}
