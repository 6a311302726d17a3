//! Bounded polling for host reachability.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::known_hosts::KnownHosts;
use crate::error::ExecError;
use crate::execution::{CommandExecutor, RunCommandOptions};
use crate::Result;

/// Default overall time a wait may take.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default pause between two probes.
pub const DEFAULT_WAIT_DELAY: Duration = Duration::from_secs(2);

/// How long to keep probing and how.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Give up once this much time has passed.
    pub timeout: Duration,
    /// Pause between failed probes.
    pub delay: Duration,
    /// Log every probe at info level.
    pub verbose: bool,
    /// Refresh the cached host key in this file before every SSH probe.
    pub refresh_host_keys: Option<KnownHosts>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            delay: DEFAULT_WAIT_DELAY,
            verbose: false,
            refresh_host_keys: None,
        }
    }
}

impl WaitOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn refresh_host_keys(mut self, known_hosts: KnownHosts) -> Self {
        self.refresh_host_keys = Some(known_hosts);
        self
    }
}

/// Probe until `probe` reports success and return the elapsed time.
///
/// A probe returning `Ok(false)` is retried after `options.delay` until
/// `options.timeout` has passed. Probe errors end the wait immediately.
pub fn poll_until<F>(what: &str, options: &WaitOptions, mut probe: F) -> Result<Duration>
where
    F: FnMut() -> Result<bool>,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        if probe()? {
            let elapsed = start.elapsed();
            if options.verbose {
                info!(what, ?elapsed, attempt, "reached");
            }
            return Ok(elapsed);
        }

        let elapsed = start.elapsed();
        if elapsed > options.timeout {
            return Err(ExecError::WaitTimeout {
                what: what.to_string(),
                elapsed,
            });
        }

        if options.verbose {
            info!(what, ?elapsed, attempt, "not reached yet, retrying");
        } else {
            debug!(what, ?elapsed, attempt, "not reached yet, retrying");
        }
        std::thread::sleep(options.delay);
    }
}

/// The single-echo `ping` invocation for this platform.
pub fn ping_command(hostname: &str) -> Vec<String> {
    let args: &[&str] = if cfg!(windows) {
        &["ping", "-n", "1", "-w", "1000"]
    } else {
        &["ping", "-c", "1", "-W", "1"]
    };
    args.iter()
        .copied()
        .chain(std::iter::once(hostname))
        .map(str::to_string)
        .collect()
}

/// Check whether `hostname` answers one ICMP echo request.
pub fn is_pingable(executor: &dyn CommandExecutor, hostname: &str) -> Result<bool> {
    let output = executor.run_command(
        &RunCommandOptions::new(ping_command(hostname)).allow_all_exit_codes(true),
    )?;
    Ok(output.is_exit_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::testing::ScriptedExecutor;

    fn fast() -> WaitOptions {
        WaitOptions::default()
            .timeout(Duration::from_millis(50))
            .delay(Duration::from_millis(5))
    }

    #[test]
    fn test_defaults() {
        let options = WaitOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.delay, Duration::from_secs(2));
        assert!(options.refresh_host_keys.is_none());
    }

    #[test]
    fn test_poll_until_succeeds_after_retries() {
        let mut calls = 0;
        let elapsed = poll_until("flaky", &fast().timeout(Duration::from_secs(5)), || {
            calls += 1;
            Ok(calls >= 3)
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert!(elapsed >= Duration::from_millis(10));
    }

    #[test]
    fn test_poll_until_times_out() {
        let err = poll_until("never", &fast(), || Ok(false)).unwrap_err();
        match err {
            ExecError::WaitTimeout { what, elapsed } => {
                assert_eq!(what, "never");
                assert!(elapsed > Duration::from_millis(50));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_poll_until_stops_on_probe_error() {
        let mut calls = 0;
        let err = poll_until("broken", &fast(), || {
            calls += 1;
            Err(ExecError::InvalidRequest("bad probe".into()))
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, ExecError::InvalidRequest(_)));
    }

    #[test]
    fn test_ping_command() {
        let argv = ping_command("10.0.0.7");
        assert_eq!(argv[0], "ping");
        assert_eq!(argv.last().map(String::as_str), Some("10.0.0.7"));
    }

    #[test]
    fn test_is_pingable() {
        let up = ScriptedExecutor::new().with_stdout(0, "1 packets transmitted, 1 received\n");
        assert!(is_pingable(&up, "10.0.0.7").unwrap());
        assert!(up.recorded()[0].allow_all_exit_codes);

        let down = ScriptedExecutor::new().with_stdout(1, "");
        assert!(!is_pingable(&down, "10.0.0.7").unwrap());
    }
}
