//! Configuration management for command-exec.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::duration::{parse_duration, DurationParseError};
use crate::execution::RunCommandOptions;
use crate::remote::{KnownHosts, SshClient, WaitOptions};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for every command run.
    pub execution: ExecutionSection,
    /// SSH backend settings.
    pub ssh: SshSection,
    /// Reachability wait settings.
    pub wait: WaitSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Execution defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Timeout such as "30 seconds"; unset means no timeout.
    pub timeout: Option<String>,
    /// Log commands and tolerated failures.
    pub verbose: bool,
    /// Echo stdout while commands run.
    pub live_output: bool,
}

/// SSH configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSection {
    /// ssh client binary.
    pub binary: String,
    /// Remote user name.
    pub user: Option<String>,
    /// Reachability probe timeout in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for SshSection {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
            user: None,
            probe_timeout_secs: 5,
        }
    }
}

/// Reachability wait configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSection {
    /// Overall wait timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between probes in seconds.
    pub delay_secs: u64,
    /// Refresh `~/.ssh/known_hosts` before every SSH probe.
    pub refresh_host_keys: bool,
}

impl Default for WaitSection {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            delay_secs: 2,
            refresh_host_keys: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(binary) = std::env::var("COMMAND_EXEC_SSH_BINARY") {
            if !binary.is_empty() {
                self.ssh.binary = binary;
            }
        }

        if let Ok(user) = std::env::var("COMMAND_EXEC_SSH_USER") {
            if !user.is_empty() {
                self.ssh.user = Some(user);
            }
        }

        if let Ok(timeout) = std::env::var("COMMAND_EXEC_TIMEOUT") {
            if !timeout.is_empty() {
                self.execution.timeout = Some(timeout);
            }
        }

        if let Ok(level) = std::env::var("COMMAND_EXEC_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref user) = args.user {
            self.ssh.user = Some(user.clone());
        }

        if let Some(ref timeout) = args.timeout {
            self.execution.timeout = Some(timeout.clone());
        }

        if args.verbose {
            self.execution.verbose = true;
        }

        if args.live {
            self.execution.live_output = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Configured default timeout.
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.execution
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(ConfigError::InvalidTimeout)
    }

    /// Options for running `command` with the configured defaults.
    pub fn run_options(&self, command: Vec<String>) -> Result<RunCommandOptions, ConfigError> {
        let mut options = RunCommandOptions::new(command)
            .verbose(self.execution.verbose)
            .live_output_on_stdout(self.execution.live_output);
        options.timeout = self.timeout()?;
        Ok(options)
    }

    /// SSH client for `hostname` with the configured user, binary and probe timeout.
    pub fn ssh_client(&self, hostname: &str) -> SshClient {
        let mut client = SshClient::new(hostname)
            .ssh_binary(self.ssh.binary.clone())
            .probe_timeout(Duration::from_secs(self.ssh.probe_timeout_secs));
        if let Some(ref user) = self.ssh.user {
            client = client.username(user.clone());
        }
        client
    }

    /// Wait settings.
    pub fn wait_options(&self) -> WaitOptions {
        let mut options = WaitOptions::default()
            .timeout(Duration::from_secs(self.wait.timeout_secs))
            .delay(Duration::from_secs(self.wait.delay_secs))
            .verbose(self.execution.verbose);
        if self.wait.refresh_host_keys {
            if let Some(known_hosts) = KnownHosts::user_default() {
                options = options.refresh_host_keys(known_hosts);
            }
        }
        options
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Unparseable timeout string.
    InvalidTimeout(DurationParseError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidTimeout(e) => write!(f, "invalid timeout: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::CommandExecutor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.execution.timeout.is_none());
        assert_eq!(config.ssh.binary, "ssh");
        assert_eq!(config.ssh.probe_timeout_secs, 5);
        assert_eq!(config.wait.timeout_secs, 60);
        assert_eq!(config.wait.delay_secs, 2);
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "execution": {
                "timeout": "30 seconds",
                "verbose": true
            },
            "ssh": {
                "user": "deploy",
                "probe_timeout_secs": 3
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.execution.timeout.as_deref(), Some("30 seconds"));
        assert!(config.execution.verbose);
        assert_eq!(config.ssh.user.as_deref(), Some("deploy"));
        assert_eq!(config.ssh.binary, "ssh"); // Default
        assert_eq!(config.ssh.probe_timeout_secs, 3);
    }

    #[test]
    fn test_config_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            user: Some("ops".to_string()),
            timeout: Some("2 minutes".to_string()),
            verbose: true,
            live: true,
            log_level: Some("debug".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.ssh.user.as_deref(), Some("ops"));
        assert_eq!(config.execution.timeout.as_deref(), Some("2 minutes"));
        assert!(config.execution.verbose);
        assert!(config.execution.live_output);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_run_options() {
        let mut config = Config::default();
        config.execution.timeout = Some("5 seconds".to_string());
        config.execution.live_output = true;

        let options = config
            .run_options(vec!["make".to_string(), "test".to_string()])
            .unwrap();
        assert_eq!(options.command, vec!["make", "test"]);
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert!(options.live_output_on_stdout);
        assert!(!options.allow_all_exit_codes);
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = Config::default();
        config.execution.timeout = Some("whenever".to_string());
        assert!(matches!(
            config.run_options(vec!["true".to_string()]),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_ssh_client() {
        let mut config = Config::default();
        config.ssh.user = Some("deploy".to_string());
        config.ssh.binary = "/opt/ssh".to_string();

        let client = config.ssh_client("web-1");
        assert_eq!(client.destination(), "deploy@web-1");
        let rewritten = client.rewrite(&RunCommandOptions::new(["true"])).unwrap();
        assert_eq!(rewritten.command[0], "/opt/ssh");
        assert_eq!(client.host_description().unwrap(), "web-1");
    }

    #[test]
    fn test_wait_options() {
        let mut config = Config::default();
        config.wait.timeout_secs = 10;
        config.wait.delay_secs = 1;

        let options = config.wait_options();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.delay, Duration::from_secs(1));
        assert!(options.refresh_host_keys.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"ssh\""));
        assert!(json.contains("\"probe_timeout_secs\""));
    }
}
