//! Result reporting.
//!
//! Every reconciliation ends here, successful or not, and produces the same
//! [`InvocationResult`] shape so an orchestrator can consume any resource
//! kind interchangeably.

use crate::command::CommandPlan;
use crate::error::Error;
use crate::runner::RawOutput;
use chrono::{DateTime, Local, TimeDelta};
use serde::{Serialize, Serializer};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Outward-facing result of one reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationResult {
    /// Whether a mutation happened (or would happen, in check-mode)
    pub changed: bool,
    /// Whether the caller must treat the operation as failed
    pub failed: bool,
    /// The command whose output is reported
    pub cmd: CommandPlan,
    /// Exit code; `None` when no process produced this result
    pub rc: Option<i32>,
    /// Standard output, trailing line terminators removed
    pub stdout: String,
    /// Standard error, trailing line terminators removed
    pub stderr: String,
    /// When the reconciliation started
    #[serde(rename = "start", serialize_with = "serialize_timestamp")]
    pub started_at: DateTime<Local>,
    /// When the reconciliation ended
    #[serde(rename = "end", serialize_with = "serialize_timestamp")]
    pub ended_at: DateTime<Local>,
    /// `ended_at - started_at`
    #[serde(rename = "delta", serialize_with = "serialize_delta")]
    pub duration: TimeDelta,
    /// Human-readable failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl InvocationResult {
    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        !self.failed
    }

    /// The failure as an [`Error::ExecutionFailure`], if a process failed.
    pub fn error(&self) -> Option<Error> {
        match self.rc {
            Some(rc) if self.failed && rc != 0 => Some(Error::ExecutionFailure {
                rc,
                stderr: self.stderr.clone(),
            }),
            _ => None,
        }
    }
}

/// How a reconciliation ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A process ran and its output is the result.
    Ran {
        /// Command that ran
        cmd: CommandPlan,
        /// Its output
        output: RawOutput,
        /// Whether it was a mutating step
        changed: bool,
    },
    /// Probes show the desired state already holds.
    ///
    /// A not-found probe exit is reported as is but does not fail.
    Satisfied {
        /// Primary probe command
        cmd: CommandPlan,
        /// Its output
        output: RawOutput,
    },
    /// Nothing ran and nothing needed to.
    Unchanged {
        /// Command that would have been reported
        cmd: CommandPlan,
    },
    /// Check-mode: the mutating command was built but not run.
    Planned {
        /// Command that would run
        cmd: CommandPlan,
    },
    /// Failure that is not a plain non-zero exit of the reported command.
    Failed {
        /// Command involved, possibly empty
        cmd: CommandPlan,
        /// Output, when a process did run
        output: Option<RawOutput>,
        /// Whether a mutation was attempted
        changed: bool,
        /// What went wrong
        msg: String,
    },
}

/// Wall-clock timer for one reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started_at: DateTime<Local>,
}

impl Timer {
    /// Start timing now.
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
        }
    }

    /// Stop timing and materialize the result.
    pub fn finish(self, outcome: Outcome) -> InvocationResult {
        let ended_at = Local::now();
        let mut result = InvocationResult {
            changed: false,
            failed: false,
            cmd: CommandPlan::default(),
            rc: None,
            stdout: String::new(),
            stderr: String::new(),
            started_at: self.started_at,
            ended_at,
            duration: ended_at - self.started_at,
            msg: None,
        };

        match outcome {
            Outcome::Ran {
                cmd,
                output,
                changed,
            } => {
                result.changed = changed;
                result.failed = !output.success();
                if result.failed {
                    result.msg = Some(format!("non-zero return code {}", output.rc));
                }
                result.cmd = cmd;
                fill_output(&mut result, &output);
            }
            Outcome::Satisfied { cmd, output } => {
                result.cmd = cmd;
                fill_output(&mut result, &output);
            }
            Outcome::Unchanged { cmd } => {
                result.cmd = cmd;
            }
            Outcome::Planned { cmd } => {
                result.changed = true;
                result.cmd = cmd;
            }
            Outcome::Failed {
                cmd,
                output,
                changed,
                msg,
            } => {
                result.changed = changed;
                result.failed = true;
                result.cmd = cmd;
                result.msg = Some(msg);
                if let Some(output) = output {
                    fill_output(&mut result, &output);
                }
            }
        }

        result
    }
}

fn fill_output(result: &mut InvocationResult, output: &RawOutput) {
    result.rc = Some(output.rc);
    result.stdout = trim_line_endings(&output.stdout);
    result.stderr = trim_line_endings(&output.stderr);
}

/// Decode bytes and strip trailing `\n` / `\r\n` terminators.
///
/// Decoding is lossy: invalid UTF-8 sequences become `U+FFFD`.
pub fn trim_line_endings(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// Format a duration as `H:MM:SS.ffffff`.
pub fn format_delta(delta: TimeDelta) -> String {
    let micros = delta.num_microseconds().unwrap_or(i64::MAX).max(0);
    let secs = micros / 1_000_000;
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        micros % 1_000_000
    )
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
}

fn serialize_delta<S: Serializer>(delta: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_delta(*delta))
}
