//! Command-line interface for command-exec.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

/// Which backend runs the command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Direct process execution.
    #[default]
    Exec,
    /// `bash -c`.
    Bash,
    /// PowerShell.
    PowerShell,
    /// Remote host over ssh.
    Ssh,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exec" => Ok(Self::Exec),
            "bash" => Ok(Self::Bash),
            "powershell" | "pwsh" => Ok(Self::PowerShell),
            "ssh" => Ok(Self::Ssh),
            _ => Err(s.to_string()),
        }
    }
}

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Backend to run the command with.
    pub backend: Backend,
    /// Remote host (ssh backend and waits).
    pub host: Option<String>,
    /// Remote user (overrides config file).
    pub user: Option<String>,
    /// Timeout such as "5 seconds" (overrides config file).
    pub timeout: Option<String>,
    /// Log commands and tolerated failures.
    pub verbose: bool,
    /// Treat every exit code as success.
    pub allow_all_exit_codes: bool,
    /// Echo stdout while the command runs.
    pub live: bool,
    /// Run with elevated privileges.
    pub root: bool,
    /// Wait for the host to answer pings first.
    pub wait_ping: bool,
    /// Wait for the host to accept ssh first.
    pub wait_ssh: bool,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// The command to run.
    pub command: Vec<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
///
/// Everything from the first positional argument on is the command, so the
/// command's own flags need no `--`.
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('b') | Long("backend") => {
                let value: String = parser.value()?.parse()?;
                result.backend = value
                    .parse()
                    .map_err(|v| ArgsError::InvalidValue("backend", v))?;
            }
            Short('H') | Long("host") => {
                result.host = Some(parser.value()?.parse()?);
            }
            Short('u') | Long("user") => {
                result.user = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                crate::duration::parse_duration(&value)
                    .map_err(|_| ArgsError::InvalidValue("timeout", value.clone()))?;
                result.timeout = Some(value);
            }
            Short('v') | Long("verbose") => {
                result.verbose = true;
            }
            Short('a') | Long("allow-all-exit-codes") => {
                result.allow_all_exit_codes = true;
            }
            Short('L') | Long("live") => {
                result.live = true;
            }
            Short('r') | Long("root") => {
                result.root = true;
            }
            Long("wait-ping") => {
                result.wait_ping = true;
            }
            Long("wait-ssh") => {
                result.wait_ssh = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                result.command.push(val.string()?);
                for rest in parser.raw_args()? {
                    result.command.push(rest.string()?);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

impl Args {
    /// Check combinations the parser cannot see on its own.
    pub fn validate(&self) -> Result<(), ArgsError> {
        if self.help || self.version {
            return Ok(());
        }
        if self.command.is_empty() && !(self.wait_ping || self.wait_ssh) {
            return Err(ArgsError::MissingCommand);
        }
        if (self.backend == Backend::Ssh || self.wait_ping || self.wait_ssh) && self.host.is_none()
        {
            return Err(ArgsError::MissingHost);
        }
        Ok(())
    }
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"command-exec {version}
Run a command locally, through a shell, or over ssh with uniform results

USAGE:
    command-exec [OPTIONS] [--] <COMMAND>...

OPTIONS:
    -b, --backend <NAME>        exec, bash, powershell or ssh [default: exec]
    -H, --host <HOST>           Remote host (ssh backend, waits)
    -u, --user <USER>           Remote user name
    -t, --timeout <DURATION>    Timeout, e.g. "5 seconds" or 1m30s
    -v, --verbose               Log commands and tolerated failures
    -a, --allow-all-exit-codes  Do not fail on non-zero exit codes
    -L, --live                  Stream stdout while the command runs
    -r, --root                  Run with elevated privileges
        --wait-ping             Wait until the host answers pings
        --wait-ssh              Wait until the host accepts ssh
    -c, --config <FILE>         Path to configuration file (JSON)
    -l, --log-level <LVL>       Log level (error, warn, info, debug, trace)
    -h, --help                  Print help
    -V, --version               Print version

ENVIRONMENT VARIABLES:
    COMMAND_EXEC_SSH_BINARY     ssh client binary (overrides config)
    COMMAND_EXEC_SSH_USER       Remote user name (overrides config)
    COMMAND_EXEC_TIMEOUT        Default timeout (overrides config)
    COMMAND_EXEC_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                    Alternative log level setting

EXAMPLES:
    # Run a command and exit with its exit code
    command-exec ls -la /tmp

    # Through bash, giving up after five seconds
    command-exec -b bash -t "5 seconds" -a sleep 30

    # On a remote host once it is up
    command-exec -b ssh -H build-01 -u deploy --wait-ssh uname -r
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("command-exec {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// No command given.
    MissingCommand,
    /// A host is required but missing.
    MissingHost,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::MissingCommand => write!(f, "no command given"),
            Self::MissingHost => write!(f, "--host is required for ssh and waits"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
