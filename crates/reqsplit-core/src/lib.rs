//! # reqsplit-core
//!
//! Core types for the reqsplit requirement-decomposition pipeline.
//!
//! The pipeline is a chain of file-to-file stages, each reading the JSON
//! produced by the previous one:
//!
//! - requirements (`data.json`) are decomposed by an LLM
//! - decompositions are scored by a second LLM call
//! - decompositions are compared to reference text with similarity metrics
//!
//! Row numbers are the only key that links records across those files.

mod error;
mod types;

pub mod config;
pub mod store;

pub use config::PipelineConfig;
pub use error::{ReqError, Result};
pub use types::*;
