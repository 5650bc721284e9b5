//! External tool invocation
//!
//! Every call to `pngquant` or `cjpeg` goes through a [`ToolRunner`]. A
//! non-zero exit is data, not an error: callers get a [`ToolOutput`] back and
//! decode it into a [`ToolStatus`] with their own retry codes.

use crate::constants::TOOL_POLL_INTERVAL_MS;
use crate::error::{CompressionError, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// A fully specified command line for one tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The value following `flag`, e.g. the path after `--output`
    pub fn value_after(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|a| a.as_os_str())
    }

    /// The last argument, which is the input file for both supported tools
    pub fn last_arg(&self) -> Option<&OsStr> {
        self.args.last().map(|a| a.as_os_str())
    }

    /// Short tool name for logs and errors
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn with_code(exit_code: i32) -> Self {
        Self {
            exit_code: Some(exit_code),
            ..Self::default()
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable diagnostic text: stderr, or stdout when stderr is empty
    pub fn diagnostic(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr).trim().to_string();
        if !stderr.is_empty() {
            return stderr;
        }
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }
}

/// Exit status decoded at the adapter boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    /// Exit code the caller listed as worth retrying with other settings
    Retryable(i32),
    Fatal {
        code: Option<i32>,
        diagnostic: String,
    },
}

impl ToolStatus {
    pub fn decode(output: &ToolOutput, retry_codes: &[i32]) -> Self {
        match output.exit_code {
            Some(0) => ToolStatus::Success,
            Some(code) if retry_codes.contains(&code) => ToolStatus::Retryable(code),
            code => ToolStatus::Fatal {
                code,
                diagnostic: output.diagnostic(),
            },
        }
    }

    /// Convert a fatal status into the error reported for `tool`
    pub fn into_error(self, tool: &str) -> Option<CompressionError> {
        match self {
            ToolStatus::Fatal { code, diagnostic } => Some(CompressionError::ToolInvocationFailed {
                tool: tool.to_string(),
                code,
                diagnostic,
            }),
            _ => None,
        }
    }
}

/// Runs external tools.
///
/// Implementations must return `Ok` for any process that ran to completion,
/// whatever its exit code.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

impl<F> ToolRunner for F
where
    F: Fn(&ToolInvocation) -> Result<ToolOutput> + Send + Sync,
{
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self(invocation)
    }
}

/// Spawns real subprocesses
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut Child, invocation: &ToolInvocation) -> Result<ExitStatus> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CompressionError::ToolTimedOut {
                    tool: invocation.tool_name(),
                    timeout: limit,
                });
            }
            thread::sleep(Duration::from_millis(TOOL_POLL_INTERVAL_MS));
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!(command = %invocation, "Running external tool");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CompressionError::ToolUnavailable {
                tool: invocation.tool_name(),
                reason: e.to_string(),
            })?;

        // Drain both pipes concurrently so a chatty tool cannot block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // On timeout the readers are left detached: a grandchild that inherited
        // the pipes can keep them open long after the direct child is killed.
        let status = self.wait(&mut child, invocation)?;
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        debug!(
            tool = %invocation.tool_name(),
            exit_code = ?status.code(),
            "External tool finished"
        );

        Ok(ToolOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Probe a tool by running it with a version flag.
///
/// The tool counts as available only when the probe exits with code 0.
pub fn probe(runner: &dyn ToolRunner, program: &Path, version_flag: &str) -> bool {
    let invocation = ToolInvocation::new(program).arg(version_flag);
    match runner.run(&invocation) {
        Ok(output) => output.success(),
        Err(e) => {
            debug!(tool = %invocation.tool_name(), error = %e, "Version probe failed");
            false
        }
    }
}
