//! Error handling for the reconcilers and the `mc` client.
//!
//! Every failure falls in one of three buckets: bad desired state (caught
//! before the server is contacted), a failed `mc` invocation, or output from
//! `mc` that could not be understood. None of them is retried.

use thiserror::Error;

/// Main error type for reconciliation runs
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// IO errors (temporary files, config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or mutually exclusive inputs, detected before any remote call
    #[error("Configuration error: {0}")]
    Config(String),

    /// An `mc` invocation exited non-zero or could not be started
    #[error("{msg}")]
    Command {
        msg: String,
        /// The command line attempted, with secrets masked
        cmd: String,
        stdout: String,
        stderr: String,
        /// None when the process was killed by a signal or never started
        exit_code: Option<i32>,
    },

    /// Listing output from `mc` that is not the JSON we expect
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

impl ReconcileError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a command error from the captured output of a failed invocation
    pub fn command(
        msg: impl Into<String>,
        cmd: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Command {
            msg: msg.into(),
            cmd: cmd.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Replace the message of a command error, keeping its captured output.
    /// Other errors are returned unchanged.
    pub fn with_message(self, new_msg: impl Into<String>) -> Self {
        match self {
            Self::Command {
                cmd,
                stdout,
                stderr,
                exit_code,
                ..
            } => Self::Command {
                msg: new_msg.into(),
                cmd,
                stdout,
                stderr,
                exit_code,
            },
            other => other,
        }
    }

    /// True for errors raised before any remote call was attempted.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReconcileError::config("parameters are mutually exclusive: data, statements");
        assert_eq!(
            err.to_string(),
            "Configuration error: parameters are mutually exclusive: data, statements"
        );

        let err = ReconcileError::parse("line 1 is not JSON");
        assert_eq!(err.to_string(), "Parse error: line 1 is not JSON");
    }

    #[test]
    fn test_command_error_displays_message_only() {
        let err = ReconcileError::command(
            "Failed to add alias",
            "mc --json alias set local http://localhost:9000 u ********",
            "",
            "boom",
            Some(1),
        );
        assert_eq!(err.to_string(), "Failed to add alias");
        match err {
            ReconcileError::Command { cmd, exit_code, .. } => {
                assert!(cmd.contains("********"));
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("expected command error, got {other:?}"),
        }
    }

    #[test]
    fn test_with_message_only_touches_command_errors() {
        let err = ReconcileError::command("Failed to set alias", "mc", "out", "err", Some(1))
            .with_message("Failed to update alias");
        match err {
            ReconcileError::Command { msg, stderr, .. } => {
                assert_eq!(msg, "Failed to update alias");
                assert_eq!(stderr, "err");
            }
            other => panic!("expected command error, got {other:?}"),
        }

        let err = ReconcileError::config("bad").with_message("ignored");
        assert_eq!(err.to_string(), "Configuration error: bad");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReconcileError = io_err.into();
        assert!(matches!(err, ReconcileError::Io(_)));
        assert!(!err.is_config());
    }
}
