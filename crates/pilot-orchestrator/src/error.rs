//! Error types for the orchestration loop.

use thiserror::Error;

/// Errors that can abort a pilot run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Shell transport failure (boot failure aborts the run; ordinary
    /// command failures do not reach this level).
    #[error("shell error: {0}")]
    Shell(#[from] pilot_shell::ShellError),

    /// Oracle failure during run start (in-loop failures become warn
    /// turns instead).
    #[error("oracle error: {0}")]
    Oracle(#[from] pilot_oracle::OracleError),

    /// The oracle's launch response contained no tokens to spawn.
    #[error("oracle produced an empty launch command: {0:?}")]
    EmptyLaunchCommand(String),

    /// A command was injected while no session exists.
    #[error("no active shell session")]
    NoSession,
}

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
