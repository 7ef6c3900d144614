//! Chat-completion client for OpenAI-compatible endpoints
//!
//! Each call is a single stateless request: one system message, one user
//! message, JSON-object response mode. No conversation history, no retries.
//! Every failure comes back as an [`LlmFailure`] so callers decide whether to
//! log, skip, or abort.

use crate::config::LlmConfig;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, FailureKind, LlmFailure, LlmResult, ResponseFormat,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Trait for issuing chat completions (allows mocking in tests)
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a system/user prompt pair requesting a JSON object and return
    /// the raw content of the first choice
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String>;

    /// Model the requests are sent to
    fn model_name(&self) -> &str;
}

/// Real chat client talking to `{base_url}/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client; the HTTP timeout comes from the config
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LlmFailure::new(
                    FailureKind::Unexpected,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self { config, http })
    }
}

/// Classify a transport-level reqwest error
pub(crate) fn classify_transport_error(e: &reqwest::Error) -> LlmFailure {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        LlmFailure::new(
            FailureKind::Connection,
            format!("Could not reach the server: {}", e),
        )
    } else {
        LlmFailure::new(FailureKind::Unexpected, format!("Request failed: {}", e))
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String> {
        if self.config.api_key.trim().is_empty() {
            return Err(LlmFailure::missing_credential());
        }

        let request = ChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            response_format: ResponseFormat::json_object(),
        };

        let url = self.config.endpoint("chat/completions");
        tracing::info!("Calling chat completion (model: {})", self.config.model_name);
        tracing::debug!("POST {} ({} prompt chars)", url, system_prompt.len() + user_prompt.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(LlmFailure::from_status(status.as_u16(), error_text));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            LlmFailure::new(
                FailureKind::Unexpected,
                format!("Failed to decode response body: {}", e),
            )
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmFailure::new(FailureKind::Unexpected, "No content in response"))?;

        if let Some(usage) = chat_response.usage {
            tracing::info!(
                "Chat completion succeeded ({} chars, {} prompt tokens, {} completion tokens)",
                content.len(),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        } else {
            tracing::info!("Chat completion succeeded ({} chars)", content.len());
        }

        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Mock chat client for testing
///
/// Returns queued responses in order and records every prompt pair it saw.
#[derive(Debug, Default)]
pub struct MockChatClient {
    responses: Mutex<VecDeque<LlmResult<String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful raw response
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Queue a failure
    pub fn with_failure(self, failure: LlmFailure) -> Self {
        self.push(Err(failure));
        self
    }

    fn push(&self, response: LlmResult<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// Prompt pairs received so far, oldest first
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((system_prompt.to_string(), user_prompt.to_string()));
        }

        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(LlmFailure::new(
                    FailureKind::Unexpected,
                    "No more mock responses",
                ))
            })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
