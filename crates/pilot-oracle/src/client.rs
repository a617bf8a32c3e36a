//! Streaming chat-completions client for an OpenAI-compatible API.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::ModelConfig;
use crate::conversation::{ChatMessage, Continuation};
use crate::error::{OracleError, Result};
use crate::oracle::{Oracle, OracleReply, OracleRequest};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat completions endpoint.
const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Streaming oracle client.
///
/// Completions are requested with `stream: true` and consumed as
/// server-sent events, so partial text reaches the caller before the
/// full completion is known. HTTP 429 is reported as
/// [`OracleError::RateLimited`], distinct from every other failure.
#[derive(Clone)]
pub struct ChatOracle {
    client: reqwest::Client,
    api_key: String,
    config: ModelConfig,
}

impl ChatOracle {
    /// Create a client with the given API key and default model config.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(api_key, ModelConfig::default())
    }

    /// Create a client with an explicit model configuration.
    pub fn with_config(api_key: impl Into<String>, config: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Create a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| OracleError::MissingApiKey(API_KEY_ENV.to_string()))?;
        Ok(Self::new(api_key))
    }

    /// The active model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Build the message list for a request: either the continuation's
    /// transcript or a fresh conversation opened by the system prompt,
    /// followed by the new user message.
    fn build_messages(request: &OracleRequest) -> Vec<ChatMessage> {
        let mut messages = match &request.continuation {
            Some(continuation) => continuation.messages.clone(),
            None => match &request.system_prompt {
                Some(system) => vec![ChatMessage::system(system)],
                None => Vec::new(),
            },
        };
        messages.push(ChatMessage::user(&request.message));
        messages
    }
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn complete(
        &self,
        request: OracleRequest,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<OracleReply> {
        let messages = Self::build_messages(&request);

        let body = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            stream: true,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: request.max_tokens.or(self.config.max_tokens),
        };

        trace!(
            model = %self.config.model,
            messages = messages.len(),
            "sending oracle request"
        );

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let message = response.text().await.unwrap_or_default();
            return Err(OracleError::RateLimited { message });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream();
        let mut pending = String::new();
        let mut text = String::new();

        'receive: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| OracleError::Stream(e.to_string()))?;
            pending.push_str(&String::from_utf8_lossy(&chunk));

            // SSE frames are newline-delimited; a chunk may carry a
            // fraction of a line or several whole ones.
            while let Some(newline) = pending.find('\n') {
                let line = pending[..newline].trim_end_matches('\r').to_string();
                pending.drain(..=newline);

                let Some(data) = sse_data(&line) else {
                    continue;
                };
                if data == "[DONE]" {
                    break 'receive;
                }
                let parsed: StreamChunk = serde_json::from_str(data)
                    .map_err(|e| OracleError::Stream(format!("bad stream payload: {e}")))?;
                if let Some(delta) = parsed.delta_text() {
                    text.push_str(delta);
                    on_partial(&text);
                }
            }
        }

        if text.trim().is_empty() {
            return Err(OracleError::EmptyCompletion);
        }

        debug!(len = text.len(), "oracle completion received");

        let base = request.continuation.unwrap_or_else(|| {
            let mut fresh = Continuation::default();
            if let Some(system) = &request.system_prompt {
                fresh.messages.push(ChatMessage::system(system));
            }
            fresh
        });
        let continuation = base.extend(
            ChatMessage::user(&request.message),
            ChatMessage::assistant(&text),
        );

        Ok(OracleReply { text, continuation })
    }
}

/// Extract the payload of an SSE `data:` line.
fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// One streamed completion increment.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

impl StreamChunk {
    fn delta_text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let messages = vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("list files"),
        ];
        let body = ChatRequest {
            model: "gpt-4",
            messages: &messages,
            stream: true,
            temperature: 0.5,
            top_p: 0.8,
            max_tokens: Some(100),
        };

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"model\":\"gpt-4\""));
        assert!(json.contains("\"stream\":true"));
        assert!(json.contains("\"max_tokens\":100"));
        assert!(json.contains("list files"));
    }

    #[test]
    fn test_max_tokens_omitted_when_unset() {
        let messages = vec![ChatMessage::user("hi")];
        let body = ChatRequest {
            model: "gpt-4",
            messages: &messages,
            stream: true,
            temperature: 0.5,
            top_p: 0.8,
            max_tokens: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_sse_data() {
        assert_eq!(sse_data("data: {\"x\":1}"), Some("{\"x\":1}"));
        assert_eq!(sse_data("data:[DONE]"), Some("[DONE]"));
        assert_eq!(sse_data(": keep-alive"), None);
        assert_eq!(sse_data(""), None);
    }

    #[test]
    fn test_stream_chunk_deserialization() {
        let json = r#"{"id":"cmpl-1","choices":[{"index":0,"delta":{"content":"ls"},"finish_reason":null}]}"#;
        let chunk: StreamChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.delta_text(), Some("ls"));

        let json = r#"{"id":"cmpl-1","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        let chunk: StreamChunk = serde_json::from_str(json).unwrap();
        assert!(chunk.delta_text().is_none());
    }

    #[test]
    fn test_build_messages_fresh_conversation() {
        let request = OracleRequest::new("first").with_system_prompt("rules");
        let messages = ChatOracle::build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "first");
    }

    #[test]
    fn test_build_messages_with_continuation() {
        let continuation = Continuation::default().extend(
            ChatMessage::user("earlier"),
            ChatMessage::assistant("reply"),
        );
        let request = OracleRequest::new("next")
            .with_system_prompt("ignored once continuing")
            .with_continuation(continuation);

        let messages = ChatOracle::build_messages(&request);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "earlier");
        assert_eq!(messages[2].content, "next");
    }
}
