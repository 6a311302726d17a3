//! The execution contract shared by every backend.

use tracing::error;

use super::options::RunCommandOptions;
use crate::error::ExecError;
use crate::output::CommandOutput;
use crate::Result;

/// Something that can run a command and report its result.
///
/// Backends implement the three primitives; the stdout accessors come for free.
pub trait CommandExecutor: Send + Sync {
    /// Run one command and wait for it to finish.
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput>;

    /// Describe where commands run, e.g. `localhost` or a remote hostname.
    fn host_description(&self) -> Result<String>;

    /// Independent copy of this executor for use from another thread.
    fn deep_copy(&self) -> Box<dyn CommandExecutor>;

    fn run_command_and_get_stdout_as_bytes(&self, options: &RunCommandOptions) -> Result<Vec<u8>> {
        Ok(self.run_command(options)?.stdout_as_bytes()?.to_vec())
    }

    fn run_command_and_get_stdout_as_string(&self, options: &RunCommandOptions) -> Result<String> {
        self.run_command(options)?.stdout_as_string()
    }

    fn run_command_and_get_stdout_as_lines(
        &self,
        options: &RunCommandOptions,
    ) -> Result<Vec<String>> {
        self.run_command(options)?.stdout_as_lines()
    }

    fn run_command_and_get_stdout_as_f64(&self, options: &RunCommandOptions) -> Result<f64> {
        self.run_command(options)?.stdout_as_f64()
    }
}

impl CommandExecutor for Box<dyn CommandExecutor> {
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput> {
        self.as_ref().run_command(options)
    }

    fn host_description(&self) -> Result<String> {
        self.as_ref().host_description()
    }

    fn deep_copy(&self) -> Box<dyn CommandExecutor> {
        self.as_ref().deep_copy()
    }
}

/// Unwrap a result or terminate the process.
///
/// The error is logged before exiting with status 1.
pub fn or_exit<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!(error = %err, "fatal command execution error");
            std::process::exit(1);
        }
    }
}

/// Fail-fast variants of the [`CommandExecutor`] operations.
///
/// Each method runs the fallible operation and passes the result through
/// [`or_exit`].
pub trait MustExecutor: CommandExecutor {
    fn must_run_command(&self, options: &RunCommandOptions) -> CommandOutput {
        or_exit(self.run_command(options))
    }

    fn must_host_description(&self) -> String {
        or_exit(self.host_description())
    }

    fn must_run_command_and_get_stdout_as_bytes(&self, options: &RunCommandOptions) -> Vec<u8> {
        or_exit(self.run_command_and_get_stdout_as_bytes(options))
    }

    fn must_run_command_and_get_stdout_as_string(&self, options: &RunCommandOptions) -> String {
        or_exit(self.run_command_and_get_stdout_as_string(options))
    }

    fn must_run_command_and_get_stdout_as_lines(&self, options: &RunCommandOptions) -> Vec<String> {
        or_exit(self.run_command_and_get_stdout_as_lines(options))
    }

    fn must_run_command_and_get_stdout_as_f64(&self, options: &RunCommandOptions) -> f64 {
        or_exit(self.run_command_and_get_stdout_as_f64(options))
    }
}

impl<T: CommandExecutor + ?Sized> MustExecutor for T {}

/// Run a command on tokio's blocking pool.
///
/// The executor is deep-copied and the options cloned, so the caller keeps
/// ownership of both while the command runs.
pub async fn run_command_async(
    executor: &dyn CommandExecutor,
    options: &RunCommandOptions,
) -> Result<CommandOutput> {
    let executor = executor.deep_copy();
    let options = options.clone();

    tokio::task::spawn_blocking(move || executor.run_command(&options))
        .await
        .map_err(|e| ExecError::Join(e.to_string()))?
}
