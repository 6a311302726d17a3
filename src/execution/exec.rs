//! Direct process execution.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use super::executor::CommandExecutor;
use super::options::RunCommandOptions;
use crate::error::ExecError;
use crate::output::{CommandOutput, TextEncoding};
use crate::Result;

/// Program used to enforce [`RunCommandOptions::timeout`].
pub const TIMEOUT_PROGRAM: &str = "timeout";

/// Program used to elevate [`RunCommandOptions::run_as_root`] requests.
pub const SUDO_PROGRAM: &str = "sudo";

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// Runs commands as local child processes, without a shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exec;

impl Exec {
    pub fn new() -> Self {
        Self
    }

    /// The argument vector actually spawned for `options`.
    ///
    /// A timeout prefixes `timeout <seconds>`; a root request from a non-root
    /// user prefixes `sudo`.
    pub fn effective_command(options: &RunCommandOptions) -> Vec<String> {
        let mut argv = Vec::with_capacity(options.command.len() + 3);
        if let Some(seconds) = options.timeout_seconds() {
            argv.push(TIMEOUT_PROGRAM.to_string());
            argv.push(seconds);
        }
        if options.run_as_root && !is_root() {
            argv.push(SUDO_PROGRAM.to_string());
        }
        argv.extend(options.command.iter().cloned());
        argv
    }
}

/// Read stdout line by line until EOF, optionally echoing each line.
///
/// UTF-16-LE output is split on whole `\n` code units only, so an echoed line
/// never starts halfway through a unit.
fn drain_stdout<R: Read>(
    pipe: R,
    encoding: TextEncoding,
    mut echo: Option<&mut dyn Write>,
) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(pipe);
    let mut captured = Vec::new();
    let mut line = Vec::new();

    loop {
        // The final unterminated remainder comes back as a last short line.
        let n = reader.read_until(b'\n', &mut line)?;
        let eof = n == 0;

        if !eof && encoding == TextEncoding::Utf16Le {
            if line.len() % 2 == 1 {
                // 0x0A was a low byte: pull in the high byte of its unit.
                reader.by_ref().take(1).read_to_end(&mut line)?;
            }
            if !line.ends_with(&[b'\n', 0]) || line.len() % 2 == 1 {
                continue;
            }
        }

        if line.is_empty() {
            break;
        }
        captured.extend_from_slice(&line);

        if let Some(out) = echo.as_deref_mut() {
            match encoding {
                TextEncoding::Utf8 => out.write_all(&line)?,
                TextEncoding::Utf16Le => out.write_all(encoding.decode(&line).as_bytes())?,
            }
            out.flush()?;
        }
        line.clear();

        if eof {
            break;
        }
    }

    Ok(captured)
}

fn join_io<T>(handle: JoinHandle<io::Result<T>>, what: &str) -> io::Result<T> {
    handle
        .join()
        .map_err(|_| io::Error::other(format!("{} thread panicked", what)))?
}

/// Join the stderr and stdin helpers, then report stdout and stderr.
///
/// Both helpers are joined even when reading stdout failed.
fn finish_io(
    stdout: io::Result<Vec<u8>>,
    stderr_reader: Option<JoinHandle<io::Result<Vec<u8>>>>,
    stdin_writer: Option<JoinHandle<io::Result<()>>>,
) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let stderr = stderr_reader.map(|handle| join_io(handle, "stderr reader"));
    let written = stdin_writer.map(|handle| join_io(handle, "stdin writer"));

    let stdout = stdout?;
    let stderr = stderr.transpose()?.unwrap_or_default();
    written.transpose()?;
    Ok((stdout, stderr))
}

/// Exit code of a finished process, plus the run error describing a failure.
fn exit_code(status: ExitStatus) -> Option<(i32, Option<String>)> {
    if let Some(code) = status.code() {
        let run_error = (code != 0).then(|| format!("exit status {}", code));
        return Some((code, run_error));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some((128 + signal, Some(format!("terminated by signal {}", signal))));
        }
    }

    None
}

impl CommandExecutor for Exec {
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput> {
        options.validate()?;

        let argv = Self::effective_command(options);
        let command_line = argv.join(" ");
        if options.verbose {
            info!(command = %command_line, "running command");
        } else {
            debug!(command = %command_line, "running command");
        }

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(if options.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Launch {
                command: command_line.clone(),
                source,
            })?;

        let stdin_writer = match (child.stdin.take(), options.stdin.clone()) {
            (Some(mut pipe), Some(data)) => Some(thread::spawn(move || -> io::Result<()> {
                match pipe.write_all(&data) {
                    // The child may exit without reading all of its input.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })),
            _ => None,
        };

        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || -> io::Result<Vec<u8>> {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });

        let stdout = match child.stdout.take() {
            Some(pipe) => {
                let mut live = io::stdout();
                let echo: Option<&mut dyn Write> = if options.live_output_on_stdout {
                    Some(&mut live)
                } else {
                    None
                };
                drain_stdout(pipe, TextEncoding::native(), echo)
            }
            None => Ok(Vec::new()),
        };

        // Always reap the child, even when reading failed.
        let status = child.wait();
        let (stdout, stderr) = finish_io(stdout, stderr_reader, stdin_writer)?;
        let status = status?;

        let (code, run_error) =
            exit_code(status).ok_or_else(|| ExecError::NoExitCode {
                command: command_line.clone(),
            })?;

        let mut output = CommandOutput::new();
        output.set_stdout(stdout);
        output.set_stderr(stderr);
        output.set_return_code(code);
        if let Some(ref err) = run_error {
            output.set_run_error(err.clone());
        }

        if code != 0 {
            if !options.allow_all_exit_codes {
                return Err(ExecError::NonZeroExit {
                    command: command_line,
                    code,
                    run_error: run_error.unwrap_or_default(),
                    stderr: output.stderr_as_string()?,
                });
            }
            if options.verbose {
                info!(command = %command_line, code, "command exited with non-zero code (allowed)");
            }
        }

        Ok(output)
    }

    fn host_description(&self) -> Result<String> {
        Ok("localhost".to_string())
    }

    fn deep_copy(&self) -> Box<dyn CommandExecutor> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_effective_command_plain() {
        let opts = RunCommandOptions::new(["echo", "hello"]);
        assert_eq!(Exec::effective_command(&opts), vec!["echo", "hello"]);
    }

    #[test]
    fn test_effective_command_with_timeout() {
        let opts = RunCommandOptions::new(["sleep", "10"]).timeout(Duration::from_secs(5));
        assert_eq!(
            Exec::effective_command(&opts),
            vec!["timeout", "5", "sleep", "10"]
        );
    }

    #[test]
    fn test_effective_command_as_root() {
        let opts = RunCommandOptions::new(["id", "-u"]).run_as_root(true);
        let argv = Exec::effective_command(&opts);
        if is_root() {
            assert_eq!(argv, vec!["id", "-u"]);
        } else {
            assert_eq!(argv, vec!["sudo", "id", "-u"]);
        }
    }

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_drain_stdout_utf8_echo() {
        let mut echoed = Vec::new();
        let captured = drain_stdout(
            &b"one\ntwo\nrest"[..],
            TextEncoding::Utf8,
            Some(&mut echoed),
        )
        .unwrap();
        assert_eq!(captured, b"one\ntwo\nrest");
        assert_eq!(echoed, b"one\ntwo\nrest");
    }

    #[test]
    fn test_drain_stdout_without_echo() {
        let captured = drain_stdout(&b"quiet\n"[..], TextEncoding::Utf8, None).unwrap();
        assert_eq!(captured, b"quiet\n");
    }

    #[test]
    fn test_drain_stdout_utf16_echo_splits_on_whole_units() {
        // U+0A41 carries 0x0A as its high byte, U+010A as its low byte.
        let raw = utf16le("ab\r\ncd\r\nh\u{e9}llo \u{0a41}\u{010a}\r\nend");
        let mut echoed = Vec::new();
        let captured = drain_stdout(&raw[..], TextEncoding::Utf16Le, Some(&mut echoed)).unwrap();

        assert_eq!(captured, raw);
        assert_eq!(
            String::from_utf8(echoed).unwrap(),
            "ab\ncd\nh\u{e9}llo \u{0a41}\u{010a}\nend"
        );
    }

    #[test]
    fn test_drain_stdout_utf16_trailing_odd_byte() {
        let mut raw = utf16le("x\r\n");
        raw.push(b'\n');
        let mut echoed = Vec::new();
        let captured = drain_stdout(&raw[..], TextEncoding::Utf16Le, Some(&mut echoed)).unwrap();

        assert_eq!(captured, raw);
        assert_eq!(String::from_utf8(echoed).unwrap(), "x\n");
    }

    #[test]
    fn test_finish_io_joins_helpers_on_stdout_error() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let stderr_done = Arc::new(AtomicBool::new(false));
        let stdin_done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&stderr_done);
        let stderr_reader = thread::spawn(move || -> io::Result<Vec<u8>> {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
            Ok(b"late".to_vec())
        });
        let flag = Arc::clone(&stdin_done);
        let stdin_writer = thread::spawn(move || -> io::Result<()> {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let err = finish_io(
            Err(io::Error::other("stdout broke")),
            Some(stderr_reader),
            Some(stdin_writer),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "stdout broke");
        assert!(stderr_done.load(Ordering::SeqCst));
        assert!(stdin_done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_finish_io_success() {
        let stderr_reader = thread::spawn(|| -> io::Result<Vec<u8>> { Ok(b"err".to_vec()) });
        let (stdout, stderr) =
            finish_io(Ok(b"out".to_vec()), Some(stderr_reader), None).unwrap();
        assert_eq!(stdout, b"out");
        assert_eq!(stderr, b"err");
    }

    #[test]
    fn test_host_description() {
        assert_eq!(Exec::new().host_description().unwrap(), "localhost");
    }

    #[test]
    fn test_invalid_request_rejected_before_spawn() {
        let err = Exec::new()
            .run_command(&RunCommandOptions::new(Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidRequest(_)));
    }

    #[test]
    fn test_missing_program_is_launch_failure() {
        let opts = RunCommandOptions::new(["definitely-not-a-real-program-7f3a"])
            .allow_all_exit_codes(true);
        let err = Exec::new().run_command(&opts).unwrap_err();
        assert!(matches!(err, ExecError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_echo_hello() {
        let output = Exec::new()
            .run_command(&RunCommandOptions::new(["echo", "hello"]))
            .unwrap();
        assert_eq!(output.stdout_as_bytes().unwrap(), b"hello\n");
        assert_eq!(output.stderr_as_bytes().unwrap(), b"");
        assert_eq!(output.return_code().unwrap(), 0);
        assert!(output.run_error().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unterminated_remainder_is_kept() {
        let output = Exec::new()
            .run_command(&RunCommandOptions::new(["printf", "a\\nb\\nrest"]))
            .unwrap();
        assert_eq!(output.stdout_as_bytes().unwrap(), b"a\nb\nrest");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_error() {
        let opts = RunCommandOptions::new(["sh", "-c", "echo oops >&2; exit 3"]);
        let err = Exec::new().run_command(&opts).unwrap_err();
        match err {
            ExecError::NonZeroExit {
                command,
                code,
                run_error,
                stderr,
            } => {
                assert_eq!(code, 3);
                assert!(command.contains("exit 3"));
                assert_eq!(run_error, "exit status 3");
                assert_eq!(stderr, "oops\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_allowed() {
        let opts = RunCommandOptions::new(["sh", "-c", "exit 7"])
            .allow_all_exit_codes(true)
            .verbose(true);
        let output = Exec::new().run_command(&opts).unwrap();
        assert_eq!(output.return_code().unwrap(), 7);
        assert_eq!(output.run_error(), Some("exit status 7"));
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_death_maps_to_shell_convention() {
        let opts = RunCommandOptions::new(["sh", "-c", "kill -9 $$"]).allow_all_exit_codes(true);
        let output = Exec::new().run_command(&opts).unwrap();
        assert_eq!(output.return_code().unwrap(), 128 + 9);
        assert_eq!(output.run_error(), Some("terminated by signal 9"));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stderr_does_not_deadlock() {
        let opts = RunCommandOptions::new([
            "sh",
            "-c",
            "i=0; while [ $i -lt 5000 ]; do echo 'some stderr noise line' >&2; echo out; i=$((i+1)); done",
        ]);
        let output = Exec::new().run_command(&opts).unwrap();
        assert_eq!(output.stdout_as_lines().unwrap().len(), 5000);
        assert_eq!(output.stderr_as_string().unwrap().lines().count(), 5000);
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_ignored_by_child() {
        let opts = RunCommandOptions::new(["true"]).stdin(vec![b'x'; 1 << 20]);
        let output = Exec::new().run_command(&opts).unwrap();
        assert!(output.is_exit_success());
    }

    #[test]
    fn test_deep_copy() {
        let copy = Exec::new().deep_copy();
        assert_eq!(copy.host_description().unwrap(), "localhost");
    }
}
