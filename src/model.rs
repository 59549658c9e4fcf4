//! Model backend seam and the Ollama-backed implementation.
//!
//! The session and agent loop are synchronous; the HTTP transport is async.
//! [`OllamaBackend`] bridges the two by spinning up a current-thread runtime
//! per call, the same shape as a blocking client wrapping an async one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_config::{AgentConfig, ProviderKind};
use ollama_api::{ChatMessage, ChatRequest, OllamaApiClient, OllamaApiConfig, OllamaApiError};
use thiserror::Error;

use crate::logging::ErrorLog;

/// Default wall-clock budget for a single model request. Local models on
/// modest hardware can legitimately take a very long time per reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5920);

/// Conversation role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
        }
    }
}

/// Interaction mode; selects sampling temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chat,
    Agent,
}

impl Mode {
    /// Chat favors focused answers, agent mode a little more exploration.
    #[must_use]
    pub fn temperature(self) -> f64 {
        match self {
            Self::Chat => 0.3,
            Self::Agent => 0.7,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Agent => "agent",
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelCallError {
    /// No enabled provider serves the model, or the provider type has no
    /// supported transport.
    #[error("{0}")]
    Configuration(String),

    #[error("model endpoint returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("could not reach model endpoint: {0}")]
    Connection(String),

    #[error("model endpoint returned an unusable response: {0}")]
    MalformedResponse(String),
}

/// Seam between the session logic and the model transport.
pub trait ModelBackend {
    fn call(
        &self,
        model_name: &str,
        transcript: &[Message],
        mode: Mode,
    ) -> Result<String, ModelCallError>;
}

/// Backend that resolves models through the provider catalog and speaks the
/// Ollama chat API.
pub struct OllamaBackend {
    config: AgentConfig,
    error_log: Arc<dyn ErrorLog>,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(config: AgentConfig, error_log: Arc<dyn ErrorLog>) -> Self {
        Self {
            config,
            error_log,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn call_inner(
        &self,
        model_name: &str,
        transcript: &[Message],
        mode: Mode,
    ) -> Result<String, ModelCallError> {
        let provider = self.config.get_provider(model_name).ok_or_else(|| {
            ModelCallError::Configuration(format!(
                "No enabled provider serves model '{model_name}'. Check config.json."
            ))
        })?;

        if provider.kind != ProviderKind::Ollama {
            return Err(ModelCallError::Configuration(format!(
                "Provider '{}' has no supported transport for model '{model_name}'.",
                provider.name
            )));
        }

        let api_config =
            OllamaApiConfig::new(provider.base_url.clone()).with_timeout(self.timeout);
        let client = OllamaApiClient::new(api_config).map_err(|error| {
            ModelCallError::Configuration(format!("Could not build HTTP client: {error}"))
        })?;

        let wire_messages: Vec<ChatMessage> = transcript
            .iter()
            .map(|message| ChatMessage {
                role: message.role.as_str().to_string(),
                content: message.content.clone(),
            })
            .collect();
        let request = ChatRequest::new(model_name, wire_messages, mode.temperature());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                ModelCallError::Configuration(format!("Could not start async runtime: {error}"))
            })?;

        runtime
            .block_on(client.chat(&request))
            .map_err(map_transport_error)
    }
}

impl ModelBackend for OllamaBackend {
    fn call(
        &self,
        model_name: &str,
        transcript: &[Message],
        mode: Mode,
    ) -> Result<String, ModelCallError> {
        let result = self.call_inner(model_name, transcript, mode);
        if let Err(error) = &result {
            self.error_log.log_error(
                &format!("Model call failed for '{model_name}' in {} mode", mode.label()),
                Some(error),
            );
        }
        result
    }
}

fn map_transport_error(error: OllamaApiError) -> ModelCallError {
    if error.is_connection_level() {
        return ModelCallError::Connection(error.to_string());
    }
    match error {
        OllamaApiError::Status(status, body) => ModelCallError::Http {
            status: status.as_u16(),
            detail: body,
        },
        OllamaApiError::Request(source) => ModelCallError::MalformedResponse(source.to_string()),
        OllamaApiError::MalformedResponse(detail) => ModelCallError::MalformedResponse(detail),
    }
}

/// Deterministic backend for tests: replies (or failures) are played back in
/// order and every request transcript is recorded.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, ModelCallError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub model_name: String,
    pub transcript: Vec<Message>,
    pub mode: Mode,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = &'static str>) -> Self {
        let backend = Self::default();
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(reply.into()));
        }
    }

    pub fn push_failure(&self, failure: ModelCallError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(failure));
        }
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl ModelBackend for ScriptedBackend {
    fn call(
        &self,
        model_name: &str,
        transcript: &[Message],
        mode: Mode,
    ) -> Result<String, ModelCallError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                model_name: model_name.to_string(),
                transcript: transcript.to_vec(),
                mode,
            });
        }

        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| {
                Err(ModelCallError::Configuration(
                    "scripted backend has no reply queued".to_string(),
                ))
            })
    }
}
