//! The trait seam between the orchestration loop and the oracle service.

use async_trait::async_trait;

use crate::conversation::Continuation;
use crate::error::Result;

/// One outbound oracle call.
#[derive(Debug, Clone, Default)]
pub struct OracleRequest {
    /// System-level behavioral prompt. Applied when a conversation begins
    /// (no continuation); ignored afterwards, since the continuation
    /// already carries it.
    pub system_prompt: Option<String>,

    /// The conversational message for this turn.
    pub message: String,

    /// Continuation token from the previous call, if any.
    pub continuation: Option<Continuation>,

    /// Per-request cap on generated tokens.
    pub max_tokens: Option<u32>,
}

impl OracleRequest {
    /// Create a request with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Sets the system prompt for a fresh conversation.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Continues an existing conversation.
    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.continuation = Some(continuation);
        self
    }

    /// Caps the generated tokens for this request only.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A finished oracle call.
#[derive(Debug, Clone)]
pub struct OracleReply {
    /// The full completion text.
    pub text: String,

    /// Token to supply on the next call to keep the conversation going.
    pub continuation: Continuation,
}

/// A text-generation service that proposes shell commands and reacts to
/// their results.
///
/// Implementations stream: `on_partial` receives the accumulated text so
/// far on each increment (latest call supersedes the previous one), and
/// the returned reply carries the final text.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send one message and wait for the full completion.
    async fn complete(
        &self,
        request: OracleRequest,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<OracleReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = OracleRequest::new("OK: done")
            .with_system_prompt("you are a shell")
            .with_continuation(Continuation::default())
            .with_max_tokens(100);

        assert_eq!(request.message, "OK: done");
        assert_eq!(request.system_prompt.as_deref(), Some("you are a shell"));
        assert!(request.continuation.is_some());
        assert_eq!(request.max_tokens, Some(100));
    }
}
