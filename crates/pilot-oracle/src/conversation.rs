//! Conversation state carried between oracle calls.

use serde::{Deserialize, Serialize};

/// A message in the oracle conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: String,

    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Opaque continuation token referencing the prior oracle turn.
///
/// Callers never inspect one; they pass back the token returned by the
/// last call, and replace it wholesale with the new one — tokens are
/// never merged. Internally it is the conversation transcript, which is
/// what a stateless chat API needs to continue a thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Continuation {
    pub(crate) messages: Vec<ChatMessage>,
}

impl Continuation {
    /// Number of messages the token carries.
    pub fn turn_count(&self) -> usize {
        self.messages.len()
    }

    /// Produce the successor token: this conversation plus the latest
    /// user/assistant exchange.
    pub(crate) fn extend(mut self, user: ChatMessage, assistant: ChatMessage) -> Self {
        self.messages.push(user);
        self.messages.push(assistant);
        self
    }
}
