//! A remote machine reached over SSH.

use std::time::Duration;

use tracing::warn;

use super::ssh::SshClient;
use super::wait::{is_pingable, poll_until, WaitOptions};
use crate::execution::{CommandExecutor, Exec, RunCommandOptions};
use crate::output::CommandOutput;
use crate::Result;

/// A remote host.
///
/// Runs commands through its [`SshClient`] and adds the reachability waits
/// used when bringing machines up.
#[derive(Debug, Clone)]
pub struct Host<E = Exec> {
    ssh: SshClient<E>,
}

impl Host {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            ssh: SshClient::new(hostname),
        }
    }
}

impl<E> Host<E> {
    pub fn from_ssh_client(ssh: SshClient<E>) -> Self {
        Self { ssh }
    }

    pub fn hostname(&self) -> &str {
        self.ssh.hostname()
    }

    pub fn ssh_client(&self) -> &SshClient<E> {
        &self.ssh
    }
}

impl<E> Host<E>
where
    E: CommandExecutor + Clone + 'static,
{
    /// Check whether the host answers a ping sent from the local machine.
    pub fn is_pingable(&self, local: &dyn CommandExecutor) -> Result<bool> {
        is_pingable(local, self.hostname())
    }

    /// Block until the host answers pings.
    pub fn wait_until_pingable(
        &self,
        local: &dyn CommandExecutor,
        options: &WaitOptions,
    ) -> Result<Duration> {
        let what = format!("ping response from {}", self.hostname());
        poll_until(&what, options, || self.is_pingable(local))
    }

    /// Block until the host accepts ssh connections.
    ///
    /// When `options.refresh_host_keys` is set the cached host key is replaced
    /// before every probe. A failed refresh only logs a warning.
    pub fn wait_until_ssh_reachable(&self, options: &WaitOptions) -> Result<Duration> {
        let what = format!("ssh on {}", self.hostname());
        poll_until(&what, options, || {
            if let Some(known_hosts) = &options.refresh_host_keys {
                if let Err(err) = self.ssh.refresh_host_key(known_hosts) {
                    warn!(host = %self.hostname(), error = %err, "host key refresh failed");
                }
            }
            self.ssh.is_reachable()
        })
    }
}

impl<E> CommandExecutor for Host<E>
where
    E: CommandExecutor + Clone + 'static,
{
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput> {
        self.ssh.run_command(options)
    }

    fn host_description(&self) -> Result<String> {
        self.ssh.host_description()
    }

    fn deep_copy(&self) -> Box<dyn CommandExecutor> {
        Box::new(self.clone())
    }
}
