//! Run request representation.

use std::time::Duration;

use crate::duration::{format_seconds, parse_duration};
use crate::error::ExecError;
use crate::Result;

/// What to run and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCommandOptions {
    /// Argument vector; the first element is the program.
    pub command: Vec<String>,
    /// Maximum execution time, enforced by the `timeout` utility.
    pub timeout: Option<Duration>,
    /// Log the command and tolerated failures.
    pub verbose: bool,
    /// Report non-zero exit codes as normal results instead of errors.
    pub allow_all_exit_codes: bool,
    /// Echo stdout lines to our own stdout while the command runs.
    pub live_output_on_stdout: bool,
    /// Run with elevated privileges.
    pub run_as_root: bool,
    /// Bytes written to the command's stdin.
    pub stdin: Option<Vec<u8>>,
}

impl RunCommandOptions {
    /// Create options for the given argument vector.
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the execution timeout from a string such as `"5 seconds"`.
    pub fn timeout_str(self, timeout: &str) -> Result<Self> {
        Ok(self.timeout(parse_duration(timeout)?))
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn allow_all_exit_codes(mut self, allow: bool) -> Self {
        self.allow_all_exit_codes = allow;
        self
    }

    pub fn live_output_on_stdout(mut self, live: bool) -> Self {
        self.live_output_on_stdout = live;
        self
    }

    pub fn run_as_root(mut self, root: bool) -> Self {
        self.run_as_root = root;
        self
    }

    /// Set the bytes fed to the command's stdin.
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Reject requests that cannot be run.
    pub fn validate(&self) -> Result<()> {
        if self.command.is_empty() {
            return Err(ExecError::InvalidRequest("command is empty".into()));
        }
        if self.command[0].is_empty() {
            return Err(ExecError::InvalidRequest("program name is empty".into()));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ExecError::InvalidRequest("timeout must be positive".into()));
        }
        Ok(())
    }

    /// Seconds argument for the `timeout` utility, if a timeout is set.
    pub fn timeout_seconds(&self) -> Option<String> {
        self.timeout.map(format_seconds)
    }

    /// Human readable command line for logs and error messages.
    ///
    /// Not intended for re-execution; use the shell backends for that.
    pub fn joined_command(&self) -> String {
        self.command.join(" ")
    }
}
