//! Transport-only Ollama chat API client primitives.
//!
//! This crate owns request building and response parsing for the Ollama
//! `/api/chat` endpoint only. It intentionally contains no provider
//! resolution, no session state, and no runtime UI coupling.
//!
//! Requests are non-streaming (`stream: false`); the caller receives the
//! complete assistant message content or a typed [`OllamaApiError`].

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod url;

pub use client::OllamaApiClient;
pub use config::OllamaApiConfig;
pub use error::OllamaApiError;
pub use payload::{ChatMessage, ChatOptions, ChatRequest, ChatResponse};
pub use url::normalize_chat_url;
