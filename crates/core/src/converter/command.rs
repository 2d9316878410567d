//! Running the external converter binaries.

use std::ffi::OsString;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured output channels of one tool run. Empty channels are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: non_empty(stdout.into()),
            stderr: non_empty(stderr.into()),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Executes a program and captures both output channels.
///
/// The converter clients only talk to this trait, so tests can script tool
/// responses without poppler installed.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs tools as child processes of the current one.
#[derive(Clone, Debug, Default)]
pub struct SystemRunner {
    /// Kill the tool when it runs longer than this.
    pub timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput> {
        debug!(program, ?args, "running converter");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes on their own threads so a chatty tool cannot block
        // on a full pipe while we wait for it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => wait_with_timeout(&mut child, program, timeout)?,
            None => child.wait()?,
        };

        let stdout = join(stdout)?;
        let stderr = join(stderr)?;

        if !status.success() {
            return Err(Error::ToolFailed {
                tool: program.to_string(),
                status: status.to_string(),
                stderr: stderr.trim_end().to_string(),
            });
        }
        Ok(CommandOutput::new(stdout, stderr))
    }
}

fn drain<P: Read + Send + 'static>(pipe: Option<P>) -> Option<JoinHandle<std::io::Result<String>>> {
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            p.read_to_end(&mut buf)?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        })
    })
}

fn join(handle: Option<JoinHandle<std::io::Result<String>>>) -> Result<String> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| Error::Io(std::io::Error::other("output reader panicked")))?
            .map_err(Error::from),
        None => Ok(String::new()),
    }
}

fn wait_with_timeout(
    child: &mut Child,
    program: &str,
    timeout: Duration,
) -> Result<std::process::ExitStatus> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() > timeout {
            debug!(program, ?timeout, "converter timed out, killing");
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout {
                tool: program.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn captures_both_channels() {
        let out = SystemRunner::default()
            .run("sh", &args(&["-c", "printf out; printf err >&2"]))
            .unwrap();
        assert_eq!(out, CommandOutput::new("out", "err"));
    }

    #[test]
    fn empty_channels_are_none() {
        let out = SystemRunner::default().run("true", &[]).unwrap();
        assert_eq!(out, CommandOutput::default());
    }

    #[test]
    fn non_zero_exit_is_tool_failure() {
        let err = SystemRunner::default()
            .run("sh", &args(&["-c", "echo broken >&2; exit 3"]))
            .unwrap_err();
        match err {
            Error::ToolFailed { tool, stderr, .. } => {
                assert_eq!(tool, "sh");
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn slow_tool_is_killed() {
        let runner = SystemRunner::with_timeout(Duration::from_millis(100));
        let err = runner.run("sleep", &args(&["5"])).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn missing_binary_is_io_error() {
        let err = SystemRunner::default()
            .run("pdfgrid-no-such-tool", &[])
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
