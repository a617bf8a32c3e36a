//! Error types for the shell transport.

use thiserror::Error;

/// Errors that can occur in the shell session transport.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A command was issued before the session was started.
    #[error("shell session not started")]
    NotStarted,

    /// The session was cleaned up and can no longer accept commands.
    #[error("shell session closed")]
    SessionClosed,

    /// The process exited before the readiness marker appeared.
    #[error("shell boot failed: {0}")]
    BootFailed(String),

    /// The process exited without producing any output for the command.
    #[error("process exited with code {}", code_label(*.code))]
    ProcessExited {
        /// Exit code, if the process reported one.
        code: Option<i32>,
    },

    /// The process could not be spawned.
    #[error("failed to spawn shell process: {0}")]
    Spawn(String),

    /// I/O error on the process's pipes.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for shell transport operations.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Human-readable exit code, "unknown" when the OS reported none.
pub(crate) fn code_label(code: Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exited_display() {
        let err = ShellError::ProcessExited { code: Some(7) };
        assert_eq!(err.to_string(), "process exited with code 7");

        let err = ShellError::ProcessExited { code: None };
        assert_eq!(err.to_string(), "process exited with code unknown");
    }

    #[test]
    fn test_boot_failed_display() {
        let err = ShellError::BootFailed("exit code 1".to_string());
        assert!(err.to_string().contains("shell boot failed"));
    }
}
