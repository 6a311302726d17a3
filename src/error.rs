//! Error types for command-exec.

use std::time::Duration;

use thiserror::Error;

use crate::duration::DurationParseError;

/// Main error type for command execution.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The request was rejected before any process was touched.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The process could not be created or started.
    #[error("failed to start '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited with a non-zero code.
    #[error("command '{command}' failed with exit code {code}: run error: '{run_error}', stderr: '{stderr}'")]
    NonZeroExit {
        command: String,
        code: i32,
        run_error: String,
        stderr: String,
    },

    /// The process terminated without reporting an exit code.
    #[error("command '{command}' did not report an exit code")]
    NoExitCode { command: String },

    /// A `CommandOutput` field was read before it was captured.
    #[error("{0} not set")]
    FieldNotSet(&'static str),

    /// Output could not be parsed as a number.
    #[error("unable to parse {value:?} as float: {source}")]
    ParseFloat {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Invalid duration string.
    #[error("invalid duration: {0}")]
    Duration(#[from] DurationParseError),

    /// An argument could not be shell-quoted.
    #[error("unable to quote command: {0}")]
    Quote(#[from] shlex::QuoteError),

    /// The reachability probe got an answer that is neither success nor timeout.
    #[error("unexpected reachability probe output from {host}: {stdout:?}")]
    UnexpectedProbeOutput { host: String, stdout: String },

    /// A polling helper gave up.
    #[error("{what} not reached after {elapsed:?}")]
    WaitTimeout { what: String, elapsed: Duration },

    /// Refreshing SSH host key material failed.
    #[error("host key refresh for {host} failed: {reason}")]
    HostKey { host: String, reason: String },

    /// A blocking task could not be joined.
    #[error("background task failed: {0}")]
    Join(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for command-exec operations.
pub type Result<T> = std::result::Result<T, ExecError>;
