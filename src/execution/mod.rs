//! Command execution engine.
//!
//! This module provides the execution contract and its local backends:
//! - [`Exec`] runs a program directly
//! - [`Bash`] and [`PowerShell`] run a quoted command line through a shell
//! - Timeouts via the `timeout` utility (exit code 124)
//! - Live stdout streaming
//!
//! # Example
//!
//! ```no_run
//! use command_exec::execution::{Bash, CommandExecutor, Exec, RunCommandOptions};
//!
//! // Direct execution
//! let output = Exec.run_command(&RunCommandOptions::new(["echo", "hello"]))?;
//! assert_eq!(output.stdout_as_string()?, "hello\n");
//!
//! // Through bash, with a timeout and tolerated failures
//! let opts = RunCommandOptions::new(["sleep", "30"])
//!     .timeout_str("5 seconds")?
//!     .allow_all_exit_codes(true);
//! let output = Bash::new().run_command(&opts)?;
//! assert!(output.is_timed_out());
//! # Ok::<(), command_exec::ExecError>(())
//! ```

mod exec;
mod executor;
mod options;
mod quote;
mod shell;
#[cfg(test)]
pub(crate) mod testing;

pub use exec::{Exec, SUDO_PROGRAM, TIMEOUT_PROGRAM};
pub use executor::{or_exit, run_command_async, CommandExecutor, MustExecutor};
pub use options::RunCommandOptions;
pub use quote::{join_posix, join_powershell, quote_posix, quote_powershell};
pub use shell::{default_powershell, Bash, PowerShell, BASH_PROGRAM};
