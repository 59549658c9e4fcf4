/// Default base URL for a locally hosted Ollama server.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Normalize a base URL to an Ollama chat endpoint.
///
/// Normalization rules:
/// 1) drop any `/api/...` suffix already present
/// 2) drop trailing slashes
/// 3) append `/api/chat`
pub fn normalize_chat_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_OLLAMA_BASE_URL
    } else {
        input.trim()
    };

    let base = match base.find("/api/") {
        Some(index) => &base[..index],
        None => base,
    };

    format!("{}/api/chat", base.trim_end_matches('/'))
}
