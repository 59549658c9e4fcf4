use reqwest::Client;

use crate::config::OllamaApiConfig;
use crate::error::{error_body_snippet, OllamaApiError};
use crate::payload::{ChatRequest, ChatResponse};
use crate::url::normalize_chat_url;

#[derive(Debug)]
pub struct OllamaApiClient {
    http: Client,
    config: OllamaApiConfig,
}

impl OllamaApiClient {
    pub fn new(config: OllamaApiConfig) -> Result<Self, OllamaApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OllamaApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OllamaApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    /// Sends one non-streaming chat request and returns the assistant content.
    ///
    /// Failures are classified as [`OllamaApiError::Status`] (non-2xx, with a
    /// truncated body snippet), [`OllamaApiError::Request`] (connection or
    /// timeout), or [`OllamaApiError::MalformedResponse`] (body decoded but
    /// lacked `message.content`).
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, OllamaApiError> {
        let response = self
            .http
            .post(self.normalized_endpoint())
            .json(request)
            .send()
            .await
            .map_err(OllamaApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(OllamaApiError::Status(status, error_body_snippet(&body)));
        }

        let payload = response
            .json::<ChatResponse>()
            .await
            .map_err(|error| OllamaApiError::MalformedResponse(error.to_string()))?;

        match payload.content() {
            Some(content) => Ok(content.to_string()),
            None => Err(OllamaApiError::MalformedResponse(
                "response is missing message.content".to_string(),
            )),
        }
    }
}
