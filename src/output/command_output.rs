//! Captured result of a single command invocation.

use tracing::info;

use super::encoding::{split_lines, TextEncoding};
use crate::error::ExecError;
use crate::Result;

/// Exit code reported by the `timeout` utility when it had to stop the command.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Result of running one command.
///
/// Fields start out unset and are filled in once by the backend that ran the
/// command. Reading a field that was never captured is an error, so an empty
/// stdout can always be told apart from a stdout that was never read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    return_code: Option<i32>,
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
    run_error: Option<String>,
}

impl CommandOutput {
    /// Create an empty output with nothing captured yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stdout(&mut self, stdout: Vec<u8>) {
        self.stdout = Some(stdout);
    }

    pub fn set_stderr(&mut self, stderr: Vec<u8>) {
        self.stderr = Some(stderr);
    }

    pub fn set_return_code(&mut self, code: i32) {
        self.return_code = Some(code);
    }

    pub fn set_run_error(&mut self, err: impl Into<String>) {
        self.run_error = Some(err.into());
    }

    /// Exit code of the process.
    pub fn return_code(&self) -> Result<i32> {
        self.return_code.ok_or(ExecError::FieldNotSet("return code"))
    }

    /// Run-level error recorded while the process ran, if any.
    pub fn run_error(&self) -> Option<&str> {
        self.run_error.as_deref()
    }

    /// Check if the command succeeded (exit code 0).
    pub fn is_exit_success(&self) -> bool {
        self.return_code == Some(0)
    }

    /// Check if the command was stopped by its timeout.
    pub fn is_timed_out(&self) -> bool {
        self.return_code == Some(TIMEOUT_EXIT_CODE)
    }

    /// Fail unless the command exited with code 0.
    pub fn check_exit_success(&self) -> Result<()> {
        let code = self.return_code()?;
        if code == 0 {
            return Ok(());
        }
        Err(ExecError::NonZeroExit {
            command: String::new(),
            code,
            run_error: self.run_error.clone().unwrap_or_default(),
            stderr: self.stderr_as_string().unwrap_or_default(),
        })
    }

    pub fn stdout_as_bytes(&self) -> Result<&[u8]> {
        self.stdout
            .as_deref()
            .ok_or(ExecError::FieldNotSet("stdout"))
    }

    pub fn stderr_as_bytes(&self) -> Result<&[u8]> {
        self.stderr
            .as_deref()
            .ok_or(ExecError::FieldNotSet("stderr"))
    }

    /// Stdout decoded with the platform's native subprocess encoding.
    pub fn stdout_as_string(&self) -> Result<String> {
        self.stdout_as_string_with(TextEncoding::native())
    }

    pub fn stdout_as_string_with(&self, encoding: TextEncoding) -> Result<String> {
        Ok(encoding.decode(self.stdout_as_bytes()?))
    }

    /// Stderr decoded with the platform's native subprocess encoding.
    pub fn stderr_as_string(&self) -> Result<String> {
        Ok(TextEncoding::native().decode(self.stderr_as_bytes()?))
    }

    /// Stdout split into lines, without a trailing empty line.
    pub fn stdout_as_lines(&self) -> Result<Vec<String>> {
        Ok(split_lines(&self.stdout_as_string()?))
    }

    /// Stdout trimmed and parsed as a float.
    pub fn stdout_as_f64(&self) -> Result<f64> {
        let text = self.stdout_as_string()?;
        let value = text.trim();
        value.parse().map_err(|source| ExecError::ParseFloat {
            value: value.to_string(),
            source,
        })
    }

    /// Emit every stdout line as an info event.
    pub fn log_stdout_as_info(&self) -> Result<()> {
        for line in self.stdout_as_lines()? {
            info!("{}", line);
        }
        Ok(())
    }
}
