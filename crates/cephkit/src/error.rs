//! Error types for reconciliation.
//!
//! Only context resolution errors abort before a command exists. Everything
//! else is folded into an [`InvocationResult`](crate::InvocationResult) by the
//! reconciler so that callers always receive a structured outcome.

use thiserror::Error;

/// Errors that can occur while resolving, probing or executing.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed environment input, e.g. an empty container image
    #[error("invalid execution context: {0}")]
    ContextResolution(String),

    /// Desired state that cannot be turned into a command
    #[error("invalid {kind} '{id}': {message}")]
    InvalidResource {
        /// Resource type (e.g. "caps", "realm")
        kind: &'static str,
        /// Resource identity
        id: String,
        /// What is wrong with it
        message: String,
    },

    /// Probe output that is not JSON or lacks the expected keys
    #[error("probe failed: {message}")]
    Probe {
        /// Description of the unexpected output
        message: String,
    },

    /// A mutating command exited non-zero
    #[error("command exited with status {rc}: {stderr}")]
    ExecutionFailure {
        /// Exit code of the failed command
        rc: i32,
        /// Standard error of the failed command, trailing newlines trimmed
        stderr: String,
    },

    /// The executable could not be started at all
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Shorthand for a probe error.
    pub fn probe(message: impl Into<String>) -> Self {
        Error::Probe {
            message: message.into(),
        }
    }

    /// Shorthand for an invalid resource error.
    pub fn invalid(kind: &'static str, id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidResource {
            kind,
            id: id.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts before any command is built.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ContextResolution(_))
    }
}

/// Result type for cephkit operations.
pub type Result<T> = std::result::Result<T, Error>;
