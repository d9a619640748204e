//! Process boundary.
//!
//! The [`Runner`] trait is the only place cephkit touches the outside world,
//! which lets tests swap in a scripted or simulated cluster.

use crate::command::CommandPlan;
use crate::error::{Error, Result};
use std::process::{Command, Output, Stdio};

/// Exit code, stdout and stderr of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Exit code (negative signal number when killed by a signal)
    pub rc: i32,
    /// Standard output bytes
    pub stdout: Vec<u8>,
    /// Standard error bytes
    pub stderr: Vec<u8>,
}

impl RawOutput {
    /// Output with the given exit code and text streams.
    pub fn new(rc: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            rc,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    /// Whether the process exited zero.
    pub fn success(&self) -> bool {
        self.rc == 0
    }
}

impl From<Output> for RawOutput {
    fn from(output: Output) -> Self {
        Self {
            rc: exit_code(&output.status),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Executes a command plan and captures its output.
pub trait Runner: Send + Sync {
    /// Run `plan` to completion.
    ///
    /// A non-zero exit is not an error here; only failing to start is.
    fn run(&self, plan: &CommandPlan) -> Result<RawOutput>;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, plan: &CommandPlan) -> Result<RawOutput> {
        let program = plan.program().ok_or_else(|| Error::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;

        log::debug!("exec: {plan}");

        let output = Command::new(program)
            .args(plan.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(output.into())
    }
}
