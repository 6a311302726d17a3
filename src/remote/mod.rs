//! Remote execution over SSH and reachability waits.
//!
//! # Example
//!
//! ```no_run
//! use command_exec::remote::{Host, WaitOptions};
//! use command_exec::{CommandExecutor, Exec, RunCommandOptions};
//!
//! let host = Host::new("build-01");
//! host.wait_until_pingable(&Exec, &WaitOptions::default())?;
//! host.wait_until_ssh_reachable(&WaitOptions::default())?;
//!
//! let kernel = host.run_command_and_get_stdout_as_string(&RunCommandOptions::new(["uname", "-r"]))?;
//! println!("{}", kernel.trim());
//! # Ok::<(), command_exec::ExecError>(())
//! ```

mod host;
mod known_hosts;
mod ssh;
mod wait;

pub use host::Host;
pub use known_hosts::KnownHosts;
pub use ssh::{SshClient, DEFAULT_PROBE_TIMEOUT, SSH_PROGRAM};
pub use wait::{
    is_pingable, ping_command, poll_until, WaitOptions, DEFAULT_WAIT_DELAY, DEFAULT_WAIT_TIMEOUT,
};
