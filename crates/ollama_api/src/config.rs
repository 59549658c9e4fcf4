use std::time::Duration;

use crate::url::DEFAULT_OLLAMA_BASE_URL;

/// Transport configuration for Ollama chat requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaApiConfig {
    /// Base URL for the Ollama server; normalized to `/api/chat` per request.
    pub base_url: String,
    /// Optional request timeout. Local inference can be very slow, so
    /// callers typically pass a timeout measured in minutes.
    pub timeout: Option<Duration>,
}

impl Default for OllamaApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl OllamaApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
