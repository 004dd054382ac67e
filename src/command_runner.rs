//! External process execution for `mc` invocations.
//!
//! All administrative calls go through a [`CommandRunner`]. The production
//! [`ProcessRunner`] spawns the process with a C locale, because the output is
//! parsed, and captures stdout/stderr. Tests substitute a runner that records
//! invocations and replays canned output.
//!
//! A runner only reports what happened. Turning a non-zero exit into an error
//! is the caller's job, via [`CommandOutput::ensure_success`], since only the
//! caller knows what the command was trying to achieve.

use crate::error::{ReconcileError, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Locale variables forced on every invocation so output stays parseable.
pub const LOCALE_ENV: [(&str, &str); 4] = [
    ("LANG", "C"),
    ("LC_ALL", "C"),
    ("LC_MESSAGES", "C"),
    ("LC_CTYPE", "C"),
];

/// A fully resolved external command.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Binary to execute.
    pub program: PathBuf,
    /// Arguments exactly as passed to the process.
    pub args: Vec<String>,
    /// Extra environment. May carry credentials, so it is never logged.
    pub env: Vec<(String, String)>,
    /// Human-readable command line with secrets masked.
    pub display: String,
}

/// Output from a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
}

impl CommandOutput {
    /// Successful output carrying `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
        }
    }

    /// Failed output with the given exit code and streams.
    pub fn failed(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(code),
            success: false,
        }
    }

    /// Check if the command succeeded and return a command error if not.
    ///
    /// `msg` describes the intent ("Failed to add alias"), `cmd` is the masked
    /// command line reported back to the caller.
    pub fn ensure_success(self, msg: &str, cmd: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(ReconcileError::command(
                msg,
                cmd,
                self.stdout,
                self.stderr,
                self.exit_code,
            ))
        }
    }
}

/// Executes invocations. Implementations must not retry.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Production runner that spawns the process and blocks until it exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        info!("run: {}", invocation.display);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in LOCALE_ENV {
            cmd.env(key, value);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|e| {
            ReconcileError::command(
                format!("Failed to execute {}", invocation.program.display()),
                invocation.display.clone(),
                String::new(),
                e.to_string(),
                None,
            )
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code();

        debug!(
            "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
            invocation.display,
            exit_code,
            stdout.len(),
            stderr.len()
        );

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            success: output.status.success(),
        })
    }
}
