//! Cached SSH host keys.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::ExecError;
use crate::execution::{CommandExecutor, RunCommandOptions};
use crate::Result;

const KEYSCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// A `known_hosts` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownHosts {
    path: PathBuf,
}

impl KnownHosts {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.ssh/known_hosts` of the current user, if a home directory exists.
    pub fn user_default() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".ssh").join("known_hosts")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop any cached key for `hostname` and store freshly scanned ones.
    pub fn refresh(&self, executor: &dyn CommandExecutor, hostname: &str) -> Result<()> {
        let path = self.path.to_string_lossy().into_owned();

        // Fails harmlessly when the file or entry does not exist yet.
        executor.run_command(
            &RunCommandOptions::new(["ssh-keygen", "-f", path.as_str(), "-R", hostname])
                .allow_all_exit_codes(true),
        )?;

        let scan = executor.run_command(
            &RunCommandOptions::new(["ssh-keyscan", hostname])
                .timeout(KEYSCAN_TIMEOUT)
                .allow_all_exit_codes(true),
        )?;
        let keys = scan.stdout_as_bytes()?;
        if keys.iter().all(u8::is_ascii_whitespace) {
            return Err(ExecError::HostKey {
                host: hostname.to_string(),
                reason: format!(
                    "ssh-keyscan returned no keys (exit code {})",
                    scan.return_code()?
                ),
            });
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(keys)?;
        if !keys.ends_with(b"\n") {
            file.write_all(b"\n")?;
        }

        debug!(host = hostname, file = %self.path.display(), "refreshed host key");
        Ok(())
    }
}
