//! Type definitions for chat-completion and embeddings interactions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single LLM call produced no usable result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum FailureKind {
    /// No API key configured
    MissingCredential,
    /// Could not reach the endpoint (connect error or timeout)
    Connection,
    /// HTTP 429
    RateLimited,
    /// HTTP 401 / 403
    Authentication,
    /// Any other non-success HTTP status
    Status(u16),
    /// Response content is not valid JSON
    MalformedJson,
    /// Response JSON does not have the requested structure
    UnexpectedShape,
    /// Anything else (undecodable body, empty choices, ...)
    Unexpected,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "missing credential"),
            Self::Connection => write!(f, "connection failure"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Authentication => write!(f, "authentication failure"),
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::MalformedJson => write!(f, "malformed JSON"),
            Self::UnexpectedShape => write!(f, "unexpected response shape"),
            Self::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Tagged failure of one LLM call
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct LlmFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl LlmFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_credential() -> Self {
        Self::new(
            FailureKind::MissingCredential,
            "OPENAI_API_KEY is not set (environment or .env file)",
        )
    }

    /// Map an HTTP error status to its failure kind
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => FailureKind::Authentication,
            429 => FailureKind::RateLimited,
            other => FailureKind::Status(other),
        };
        Self::new(kind, body)
    }
}

/// Result alias for a single LLM call
pub type LlmResult<T> = std::result::Result<T, LlmFailure>;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
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
}

/// Requested response format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

/// One choice in a chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

/// Message content of a choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

/// Embeddings request
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
    pub encoding_format: &'static str,
}

/// Embeddings response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

/// One embedding vector, tagged with the input position it belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub index: usize,
    pub embedding: Vec<f32>,
}
