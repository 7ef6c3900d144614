//! # reqsplit-agent
//!
//! OpenAI-compatible LLM clients for the reqsplit pipeline.
//!
//! - Stateless chat completions in JSON-object mode
//! - Batched embeddings for similarity scoring
//! - A typed failure taxonomy instead of printed errors
//!
//! Calls are never retried. A failed call yields an [`LlmFailure`] whose
//! [`FailureKind`] tells the caller what went wrong.

mod client;
mod config;
mod embeddings;
mod types;

pub use client::{ChatClient, MockChatClient, OpenAiClient};
pub use config::{
    LlmConfig, DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL_NAME, DEFAULT_TIMEOUT_SECS,
};
pub use embeddings::{Embedder, OpenAiEmbedder, DEFAULT_EMBEDDING_BATCH};
pub use types::*;
