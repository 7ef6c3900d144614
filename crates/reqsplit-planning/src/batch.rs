//! Batch drivers for the decomposition and evaluation stages
//!
//! A driver walks its input list in order and calls the model once per usable
//! row. Rows that are skipped or whose call fails are left out of the results
//! and reported as [`RowFailure`]s; nothing here is fatal to the run.
//!
//! With `concurrency == 1` exactly one request is in flight at a time. Larger
//! values overlap up to that many requests; results keep input order either way.

use crate::decomposer::Decomposer;
use crate::evaluator::Evaluator;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqsplit_agent::{FailureKind, LlmFailure};
use reqsplit_core::{DecompositionResult, EvaluationResult, Requirement, RowNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Pipeline stage a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decompose,
    Evaluate,
}

/// Why a row has no result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The input row was unusable; no call was made
    Skipped { message: String },
    /// The call was made and failed
    Llm { failure: LlmFailure },
}

/// A row dropped from a stage's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: RowNumber,
    pub stage: Stage,
    pub reason: FailureReason,
}

impl RowFailure {
    fn skipped(row: RowNumber, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            row,
            stage,
            reason: FailureReason::Skipped {
                message: message.into(),
            },
        }
    }

    fn llm(row: RowNumber, stage: Stage, failure: LlmFailure) -> Self {
        Self {
            row,
            stage,
            reason: FailureReason::Llm { failure },
        }
    }

    /// Failure kind when the call itself failed
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.reason {
            FailureReason::Llm { failure } => Some(failure.kind),
            FailureReason::Skipped { .. } => None,
        }
    }
}

/// Everything a batch run produced
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub results: Vec<T>,
    pub failures: Vec<RowFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<T> BatchOutcome<T> {
    /// Rows that reached the model
    pub fn attempted(&self) -> usize {
        self.results.len()
            + self
                .failures
                .iter()
                .filter(|f| f.failure_kind().is_some())
                .count()
    }

    pub fn skipped(&self) -> usize {
        self.failures.len() + self.results.len() - self.attempted()
    }
}

impl<T> std::fmt::Display for BatchOutcome<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Succeeded: {}", self.results.len())?;
        writeln!(f, "Failed:    {}", self.attempted() - self.results.len())?;
        writeln!(f, "Skipped:   {}", self.skipped())?;
        write!(
            f,
            "Elapsed:   {}s",
            (self.finished_at - self.started_at).num_seconds()
        )
    }
}

enum RowOutcome<T> {
    Done(T),
    Failed(RowFailure),
}

fn collect<T>(outcomes: Vec<RowOutcome<T>>, started_at: DateTime<Utc>) -> BatchOutcome<T> {
    let mut results = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            RowOutcome::Done(result) => results.push(result),
            RowOutcome::Failed(failure) => failures.push(failure),
        }
    }

    BatchOutcome {
        results,
        failures,
        started_at,
        finished_at: Utc::now(),
    }
}

/// Log a failed call with a message specific to its kind
pub fn log_failure(row: RowNumber, failure: &LlmFailure) {
    match failure.kind {
        FailureKind::MissingCredential => {
            error!("Row {}: no API key configured (set OPENAI_API_KEY)", row)
        }
        FailureKind::Connection => {
            error!("Row {}: could not connect to the API: {}", row, failure.message)
        }
        FailureKind::RateLimited => error!("Row {}: request rejected by rate limiting", row),
        FailureKind::Authentication => {
            error!("Row {}: authentication failed, check the API key", row)
        }
        FailureKind::Status(code) => error!(
            "Row {}: API returned status {}: {}",
            row, code, failure.message
        ),
        FailureKind::MalformedJson => {
            error!("Row {}: response is not valid JSON: {}", row, failure.message)
        }
        FailureKind::UnexpectedShape => error!(
            "Row {}: response has an unexpected structure: {}",
            row, failure.message
        ),
        FailureKind::Unexpected => {
            error!("Row {}: unexpected error: {}", row, failure.message)
        }
    }
}

/// Decompose every usable requirement
///
/// Rows with no row number or blank text are skipped with a warning.
pub async fn decompose_all(
    decomposer: &Decomposer,
    requirements: &[Requirement],
    concurrency: usize,
) -> BatchOutcome<DecompositionResult> {
    let started_at = Utc::now();
    let total = requirements.len();

    let outcomes: Vec<RowOutcome<DecompositionResult>> = stream::iter(requirements.iter().enumerate())
        .map(|(i, requirement)| async move {
            if requirement.is_blank() {
                warn!(
                    "Skipping invalid requirement (row: {}, req: {:?})",
                    requirement.row, requirement.req
                );
                return RowOutcome::Failed(RowFailure::skipped(
                    requirement.row,
                    Stage::Decompose,
                    "missing row number or requirement text",
                ));
            }

            info!("Decomposing row {} ({}/{})", requirement.row, i + 1, total);
            match decomposer.decompose(&requirement.req).await {
                Ok(decomposed_list) => {
                    info!(
                        "Row {} decomposed into {} sub-requirements",
                        requirement.row,
                        decomposed_list.len()
                    );
                    RowOutcome::Done(DecompositionResult::new(requirement.row, decomposed_list))
                }
                Err(failure) => {
                    log_failure(requirement.row, &failure);
                    RowOutcome::Failed(RowFailure::llm(requirement.row, Stage::Decompose, failure))
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    collect(outcomes, started_at)
}

/// Evaluate every usable decomposition against its original requirement
///
/// Entries with no row number or an empty list, and rows with no original
/// requirement, are skipped with a warning.
pub async fn evaluate_all(
    evaluator: &Evaluator,
    originals: &BTreeMap<RowNumber, String>,
    decompositions: &[DecompositionResult],
    concurrency: usize,
) -> BatchOutcome<EvaluationResult> {
    let started_at = Utc::now();
    let total = decompositions.len();

    let outcomes: Vec<RowOutcome<EvaluationResult>> = stream::iter(decompositions.iter().enumerate())
        .map(|(i, item)| async move {
            if item.is_blank() {
                warn!(
                    "Skipping invalid decomposition entry (row: {}, {} items)",
                    item.row_number,
                    item.decomposed_list.len()
                );
                return RowOutcome::Failed(RowFailure::skipped(
                    item.row_number,
                    Stage::Evaluate,
                    "missing row number or empty decomposition",
                ));
            }

            let original = match originals.get(&item.row_number) {
                Some(original) if !original.trim().is_empty() => original,
                _ => {
                    warn!(
                        "No original requirement for row {}, skipping evaluation",
                        item.row_number
                    );
                    return RowOutcome::Failed(RowFailure::skipped(
                        item.row_number,
                        Stage::Evaluate,
                        "no original requirement for row",
                    ));
                }
            };

            info!("Evaluating row {} ({}/{})", item.row_number, i + 1, total);
            match evaluator.evaluate(original, &item.decomposed_list).await {
                Ok(evaluation) => {
                    info!("Row {} scored {}", item.row_number, evaluation.score);
                    RowOutcome::Done(EvaluationResult {
                        row_number: item.row_number,
                        evaluation,
                    })
                }
                Err(failure) => {
                    log_failure(item.row_number, &failure);
                    RowOutcome::Failed(RowFailure::llm(item.row_number, Stage::Evaluate, failure))
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    collect(outcomes, started_at)
}
