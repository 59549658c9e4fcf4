use std::fmt;

use reqwest::StatusCode;

/// Maximum bytes of an HTTP error body carried in [`OllamaApiError::Status`].
pub const ERROR_BODY_SNIPPET_MAX_BYTES: usize = 500;

#[derive(Debug)]
pub enum OllamaApiError {
    /// Non-2xx response; carries the status and a truncated error body.
    Status(StatusCode, String),
    /// Network-level failure: connection refused, DNS, or request timeout.
    Request(reqwest::Error),
    /// Response body did not contain the expected `message.content` field.
    MalformedResponse(String),
}

impl OllamaApiError {
    /// True when the failure happened before any HTTP status was received.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

impl fmt::Display for OllamaApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status, snippet) => write!(f, "HTTP {status} {snippet}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::MalformedResponse(message) => write!(f, "malformed response: {message}"),
        }
    }
}

impl std::error::Error for OllamaApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OllamaApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

/// Flatten and truncate an HTTP error body for log/display use.
pub fn error_body_snippet(body: &str) -> String {
    let flattened = body.replace('\n', " ");
    let flattened = flattened.trim();
    truncate_to_byte_limit(flattened, ERROR_BODY_SNIPPET_MAX_BYTES)
}

fn truncate_to_byte_limit(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }

    let mut cutoff = max_bytes.min(content.len());
    while cutoff > 0 && !content.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    format!("{}...", &content[..cutoff])
}
