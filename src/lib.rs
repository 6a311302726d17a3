//! # command-exec
//!
//! Run a command and observe its result, the same way everywhere.
//!
//! Every backend implements [`CommandExecutor`] and returns the same
//! [`CommandOutput`], whether the command ran as a local process, through a
//! shell, or on a remote machine over SSH.
//!
//! ## Features
//!
//! - **Direct execution**: [`Exec`] spawns programs without a shell
//! - **Shells**: [`Bash`] and [`PowerShell`] run correctly quoted command lines
//! - **Remote**: [`SshClient`] and [`remote::Host`] run commands over `ssh`
//! - **Timeouts**: enforced by the `timeout` utility, reported as exit code 124
//! - **Reachability waits**: poll until a host answers pings or ssh
//!
//! ## Quick Start
//!
//! ```no_run
//! use command_exec::{CommandExecutor, Exec, RunCommandOptions};
//!
//! fn main() -> command_exec::Result<()> {
//!     command_exec::logging::try_init().ok();
//!
//!     let options = RunCommandOptions::new(["git", "status", "--short"])
//!         .timeout_str("30 seconds")?;
//!     for line in Exec.run_command_and_get_stdout_as_lines(&options)? {
//!         println!("{}", line);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod execution;
pub mod logging;
pub mod output;
pub mod remote;

// Re-export commonly used types
pub use error::{ExecError, Result};
pub use execution::{
    run_command_async, Bash, CommandExecutor, Exec, MustExecutor, PowerShell, RunCommandOptions,
};
pub use output::{CommandOutput, TextEncoding, TIMEOUT_EXIT_CODE};
pub use remote::{Host, SshClient, WaitOptions};
