//! LLM endpoint configuration
//!
//! Read once at startup from the process environment (after loading a `.env`
//! file from the working directory, if present):
//!
//! - `OPENAI_API_KEY` (required)
//! - `OPENAI_BASE_URL` (optional, OpenAI-compatible endpoint root)
//! - `OPENAI_MODEL_NAME` (default `qwen-plus`)
//! - `OPENAI_EMBEDDING_MODEL` (default `text-embedding-v3`)
//! - `OPENAI_TIMEOUT_SECS` (default 120)

use crate::types::{LlmFailure, LlmResult};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_NAME: &str = "qwen-plus";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings shared by the chat and embeddings clients
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    pub embedding_model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("embedding_model", &self.embedding_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmConfig {
    /// Config with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_embedding_model(mut self, embedding_model: impl Into<String>) -> Self {
        self.embedding_model = embedding_model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> LlmResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> LlmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or_else(LlmFailure::missing_credential)?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = get("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = get("OPENAI_MODEL_NAME") {
            config.model_name = model;
        }
        if let Some(model) = get("OPENAI_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(secs) = get("OPENAI_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "Ignoring invalid OPENAI_TIMEOUT_SECS={:?}, using {}s",
                    secs,
                    DEFAULT_TIMEOUT_SECS
                ),
            }
        }

        tracing::info!(
            "Using model {} at {}",
            config.model_name,
            config.base_url
        );
        Ok(config)
    }

    /// Full URL for an endpoint path such as `chat/completions`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}
