//! Conversation turn records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The human operator (direct commands, injected input).
    User,
    /// The text-generation oracle proposing commands.
    Oracle,
    /// The shell process reporting output.
    Shell,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Oracle => write!(f, "oracle"),
            Self::Shell => write!(f, "shell"),
        }
    }
}

/// Whether a turn is still streaming or final.
///
/// A partial turn is transient: it is superseded by the next partial or
/// done turn for the same step. Only done turns belong in a durable log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Streaming update, superseded by later turns for the same step.
    Partial,
    /// Final record for this step.
    Done,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The step succeeded.
    Ok,
    /// The step failed (e.g. a command wrote to stderr or the process died).
    Err,
    /// The run was cancelled while this step was in flight.
    Terminated,
    /// A recoverable problem worth surfacing (e.g. a rate-limited call).
    Warn,
}

/// One conversational/operational event in a pilot run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The turn text (command, output, error message, ...).
    pub message: String,
    /// Who produced it.
    pub speaker: Speaker,
    /// Streaming or final.
    pub phase: Phase,
    /// How it ended.
    pub outcome: Outcome,
    /// When it was emitted.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn with an explicit phase and outcome.
    pub fn new(
        speaker: Speaker,
        message: impl Into<String>,
        phase: Phase,
        outcome: Outcome,
    ) -> Self {
        Self {
            message: message.into(),
            speaker,
            phase,
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// A streaming update (always outcome ok; failures are final).
    pub fn partial(speaker: Speaker, message: impl Into<String>) -> Self {
        Self::new(speaker, message, Phase::Partial, Outcome::Ok)
    }

    /// A successful final turn.
    pub fn done(speaker: Speaker, message: impl Into<String>) -> Self {
        Self::new(speaker, message, Phase::Done, Outcome::Ok)
    }

    /// A failed final turn.
    pub fn err(speaker: Speaker, message: impl Into<String>) -> Self {
        Self::new(speaker, message, Phase::Done, Outcome::Err)
    }

    /// A warning turn (recoverable problem, run continues or halts visibly).
    pub fn warn(speaker: Speaker, message: impl Into<String>) -> Self {
        Self::new(speaker, message, Phase::Done, Outcome::Warn)
    }

    /// A cancellation marker for whatever was in flight.
    pub fn terminated(speaker: Speaker, message: impl Into<String>) -> Self {
        Self::new(speaker, message, Phase::Done, Outcome::Terminated)
    }

    /// Returns true for final turns.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}
