//! Shell-wrapped execution.
//!
//! Both backends join the argument vector into a single quoted command line,
//! hand it to a shell, and delegate the rest to an inner executor.

use super::exec::Exec;
use super::executor::CommandExecutor;
use super::options::RunCommandOptions;
use super::quote::{join_posix, join_powershell, quote_powershell};
use crate::output::CommandOutput;
use crate::Result;

/// Default bash binary.
pub const BASH_PROGRAM: &str = "bash";

/// Default PowerShell binary for the current platform.
pub fn default_powershell() -> &'static str {
    if cfg!(windows) {
        "powershell"
    } else {
        "pwsh"
    }
}

/// Runs commands through `bash -c`.
///
/// A root request stays on the rewritten options so the inner executor
/// elevates the whole shell.
#[derive(Debug, Clone, Default)]
pub struct Bash<E = Exec> {
    inner: E,
}

impl Bash {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E> Bash<E> {
    /// Run the shell through another executor.
    pub fn with_executor(inner: E) -> Self {
        Self { inner }
    }

    /// The `bash -c` invocation for `options`.
    pub fn rewrite(&self, options: &RunCommandOptions) -> Result<RunCommandOptions> {
        options.validate()?;
        let line = join_posix(&options.command)?;

        let mut rewritten = options.clone();
        rewritten.command = vec![BASH_PROGRAM.to_string(), "-c".to_string(), line];
        Ok(rewritten)
    }
}

impl<E> CommandExecutor for Bash<E>
where
    E: CommandExecutor + Clone + 'static,
{
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput> {
        self.inner.run_command(&self.rewrite(options)?)
    }

    fn host_description(&self) -> Result<String> {
        self.inner.host_description()
    }

    fn deep_copy(&self) -> Box<dyn CommandExecutor> {
        Box::new(self.clone())
    }
}

/// Runs commands through PowerShell.
///
/// Root requests are elevated with `Start-Process -Verb runAs`.
#[derive(Debug, Clone)]
pub struct PowerShell<E = Exec> {
    binary: String,
    inner: E,
}

impl Default for PowerShell {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerShell {
    pub fn new() -> Self {
        Self::with_executor(Exec)
    }
}

impl<E> PowerShell<E> {
    pub fn with_executor(inner: E) -> Self {
        Self {
            binary: default_powershell().to_string(),
            inner,
        }
    }

    /// Use a different PowerShell binary, e.g. `pwsh.exe`.
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// The PowerShell invocation for `options`.
    pub fn rewrite(&self, options: &RunCommandOptions) -> Result<RunCommandOptions> {
        options.validate()?;
        let mut line = join_powershell(&options.command);

        let mut rewritten = options.clone();
        if options.run_as_root {
            line = format!(
                "Start-Process -FilePath {} -Verb runAs -Wait -ArgumentList '-c', {}",
                quote_powershell(&self.binary),
                quote_powershell(&line),
            );
            rewritten.run_as_root = false;
        }
        rewritten.command = vec![self.binary.clone(), "-c".to_string(), line];
        Ok(rewritten)
    }
}

impl<E> CommandExecutor for PowerShell<E>
where
    E: CommandExecutor + Clone + 'static,
{
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput> {
        self.inner.run_command(&self.rewrite(options)?)
    }

    fn host_description(&self) -> Result<String> {
        self.inner.host_description()
    }

    fn deep_copy(&self) -> Box<dyn CommandExecutor> {
        Box::new(self.clone())
    }
}
