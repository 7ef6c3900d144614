//! reqsplit planning - LLM-driven requirement decomposition and evaluation
//!
//! Builds the prompts, drives one chat-completion call per requirement and
//! parses the replies into typed results. Batch drivers run a whole input
//! list and report rows they had to drop.

pub mod batch;
pub mod decomposer;
pub mod evaluator;
pub mod prompt;
pub mod templates;

pub use batch::{decompose_all, evaluate_all, BatchOutcome, FailureReason, RowFailure, Stage};
pub use decomposer::{parse_decomposition, Decomposer};
pub use evaluator::{parse_evaluation, Evaluator};
pub use prompt::PromptSet;
pub use templates::REQ_FORMAT_TEMPLATE;
