//! Command execution over the `ssh` client.

use std::time::Duration;

use tracing::debug;

use super::known_hosts::KnownHosts;
use crate::error::ExecError;
use crate::execution::{join_posix, CommandExecutor, Exec, RunCommandOptions, SUDO_PROGRAM};
use crate::output::CommandOutput;
use crate::Result;

/// Default ssh client binary.
pub const SSH_PROGRAM: &str = "ssh";

/// Default time the reachability probe may take.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const PROBE_WORD: &str = "hello";

/// Runs commands on a remote host by invoking the local `ssh` client.
///
/// From the inner executor's point of view every remote command is just a
/// local `ssh` process, so timeouts, streaming and exit-code handling behave
/// exactly as they do locally.
#[derive(Debug, Clone)]
pub struct SshClient<E = Exec> {
    hostname: String,
    username: Option<String>,
    ssh_binary: String,
    probe_timeout: Duration,
    inner: E,
}

impl SshClient {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::with_executor(hostname, Exec)
    }
}

impl<E> SshClient<E> {
    /// Launch the local `ssh` client through another executor.
    pub fn with_executor(hostname: impl Into<String>, inner: E) -> Self {
        Self {
            hostname: hostname.into(),
            username: None,
            ssh_binary: SSH_PROGRAM.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            inner,
        }
    }

    /// Log in as a specific remote user.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Use a different ssh client binary.
    pub fn ssh_binary(mut self, binary: impl Into<String>) -> Self {
        self.ssh_binary = binary.into();
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// `user@host`, or just the hostname when no user is configured.
    pub fn destination(&self) -> String {
        match &self.username {
            Some(user) => format!("{}@{}", user, self.hostname),
            None => self.hostname.clone(),
        }
    }

    /// The local `ssh` invocation for `options`.
    ///
    /// A root request is turned into a remote `sudo`.
    pub fn rewrite(&self, options: &RunCommandOptions) -> Result<RunCommandOptions> {
        options.validate()?;

        let mut remote = Vec::with_capacity(options.command.len() + 1);
        if options.run_as_root {
            remote.push(SUDO_PROGRAM.to_string());
        }
        remote.extend(options.command.iter().cloned());
        let line = join_posix(&remote)?;

        let mut rewritten = options.clone();
        rewritten.run_as_root = false;
        rewritten.command = vec![self.ssh_binary.clone(), self.destination(), line];
        Ok(rewritten)
    }
}

impl<E> SshClient<E>
where
    E: CommandExecutor + Clone + 'static,
{
    /// Check whether the host accepts ssh connections and runs commands.
    ///
    /// Returns `Ok(false)` when the probe times out or fails, and an error when
    /// the host answers with something other than the probe word.
    pub fn is_reachable(&self) -> Result<bool> {
        let probe = RunCommandOptions::new(["echo", PROBE_WORD])
            .timeout(self.probe_timeout)
            .allow_all_exit_codes(true);

        let output = self.run_command(&probe)?;
        if output.is_timed_out() {
            debug!(host = %self.hostname, "reachability probe timed out");
            return Ok(false);
        }
        if !output.is_exit_success() {
            debug!(host = %self.hostname, code = ?output.return_code().ok(), "reachability probe failed");
            return Ok(false);
        }

        let stdout = output.stdout_as_string()?;
        if stdout.trim() == PROBE_WORD {
            return Ok(true);
        }
        Err(ExecError::UnexpectedProbeOutput {
            host: self.hostname.clone(),
            stdout,
        })
    }

    /// Replace the cached host key of this host in `known_hosts`.
    ///
    /// Runs `ssh-keygen -R` and `ssh-keyscan` locally through the inner
    /// executor.
    pub fn refresh_host_key(&self, known_hosts: &KnownHosts) -> Result<()> {
        known_hosts.refresh(&self.inner, &self.hostname)
    }
}

impl<E> CommandExecutor for SshClient<E>
where
    E: CommandExecutor + Clone + 'static,
{
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput> {
        self.inner.run_command(&self.rewrite(options)?)
    }

    fn host_description(&self) -> Result<String> {
        Ok(self.hostname.clone())
    }

    fn deep_copy(&self) -> Box<dyn CommandExecutor> {
        Box::new(self.clone())
    }
}
