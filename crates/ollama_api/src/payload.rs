use serde::{Deserialize, Serialize};

/// One role-tagged transcript entry in Ollama wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Sampling options forwarded verbatim to the model server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f64,
}

/// Canonical request payload for the Ollama `/api/chat` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Always false: the caller wants one complete response body.
    pub stream: bool,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, temperature: f64) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            options: ChatOptions { temperature },
        }
    }
}

/// Response envelope for a non-streaming `/api/chat` call.
///
/// Only `message.content` is consumed; all other response fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatMessage>,
}

impl ChatResponse {
    /// Returns the assistant content when present and non-empty.
    pub fn content(&self) -> Option<&str> {
        self.message
            .as_ref()
            .map(|message| message.content.as_str())
            .filter(|content| !content.is_empty())
    }
}
