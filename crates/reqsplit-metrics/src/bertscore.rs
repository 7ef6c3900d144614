//! BERTScore from token embeddings
//!
//! Every candidate token is matched to its most similar reference token by
//! cosine similarity (and vice versa). Precision averages the candidate side,
//! recall the reference side, F1 is their harmonic mean.

use crate::tokenize::Segmenter;
use async_trait::async_trait;
use reqsplit_agent::Embedder;
use reqsplit_core::{ReqError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Precision, recall and F1 of one candidate/reference pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BertScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl BertScore {
    fn from_parts(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
        }
    }
}

/// Scores many (candidate, reference) pairs at once
#[async_trait]
pub trait BertScorer: Send + Sync {
    async fn score_batch(&self, pairs: &[(String, String)]) -> Result<Vec<BertScore>>;
}

/// [`BertScorer`] backed by an embeddings endpoint
pub struct EmbeddingBertScorer<E: Embedder> {
    embedder: E,
    segmenter: Arc<Segmenter>,
}

impl<E: Embedder> EmbeddingBertScorer<E> {
    pub fn new(embedder: E, segmenter: Arc<Segmenter>) -> Self {
        Self {
            embedder,
            segmenter,
        }
    }
}

#[async_trait]
impl<E: Embedder> BertScorer for EmbeddingBertScorer<E> {
    async fn score_batch(&self, pairs: &[(String, String)]) -> Result<Vec<BertScore>> {
        let tokenized: Vec<(Vec<String>, Vec<String>)> = pairs
            .iter()
            .map(|(candidate, reference)| {
                (
                    self.segmenter.tokens(candidate),
                    self.segmenter.tokens(reference),
                )
            })
            .collect();

        // Each distinct token is embedded once for the whole batch
        let mut vocabulary: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for token in tokenized.iter().flat_map(|(c, r)| c.iter().chain(r.iter())) {
            if !index.contains_key(token) {
                index.insert(token.clone(), vocabulary.len());
                vocabulary.push(token.clone());
            }
        }

        info!(
            "Embedding {} distinct tokens with {}",
            vocabulary.len(),
            self.embedder.model_id()
        );

        let vectors = if vocabulary.is_empty() {
            Vec::new()
        } else {
            self.embedder
                .embed_batch(&vocabulary)
                .await
                .map_err(|e| ReqError::Metrics(format!("embedding failed: {}", e)))?
        };

        if vectors.len() != vocabulary.len() {
            return Err(ReqError::Metrics(format!(
                "expected {} embeddings, got {}",
                vocabulary.len(),
                vectors.len()
            )));
        }

        let scores = tokenized
            .iter()
            .map(|(candidate, reference)| {
                greedy_match(
                    &embedded(candidate, &index, &vectors),
                    &embedded(reference, &index, &vectors),
                )
            })
            .collect::<Vec<_>>();

        debug!("Scored {} pairs", scores.len());
        Ok(scores)
    }
}

fn embedded<'v>(
    tokens: &[String],
    index: &HashMap<String, usize>,
    vectors: &'v [Vec<f32>],
) -> Vec<&'v [f32]> {
    tokens
        .iter()
        .filter_map(|t| index.get(t).map(|&i| vectors[i].as_slice()))
        .collect()
}

/// Greedy-matching BERTScore of two embedded token sequences
pub fn greedy_match(candidate: &[&[f32]], reference: &[&[f32]]) -> BertScore {
    if candidate.is_empty() || reference.is_empty() {
        return BertScore::default();
    }

    let best_mean = |from: &[&[f32]], to: &[&[f32]]| -> f64 {
        let total: f64 = from
            .iter()
            .map(|a| {
                to.iter()
                    .map(|b| cosine_similarity(a, b))
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .sum();
        total / from.len() as f64
    };

    BertScore::from_parts(best_mean(candidate, reference), best_mean(reference, candidate))
}

/// Cosine similarity in [-1, 1]; zero vectors give 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqsplit_agent::{FailureKind, LlmFailure, LlmResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Looks tokens up in a fixed table; unknown tokens embed to zero
    struct TableEmbedder {
        table: HashMap<&'static str, Vec<f32>>,
        calls: AtomicUsize,
    }

    impl TableEmbedder {
        fn new(entries: &[(&'static str, [f32; 2])]) -> Self {
            Self {
                table: entries.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed_batch(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|t| self.table.get(t.as_str()).cloned().unwrap_or(vec![0.0, 0.0]))
                .collect())
        }

        fn model_id(&self) -> String {
            "table".to_string()
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_batch(&self, _inputs: &[String]) -> LlmResult<Vec<Vec<f32>>> {
            Err(LlmFailure::new(FailureKind::Connection, "refused"))
        }

        fn model_id(&self) -> String {
            "failing".to_string()
        }
    }

    fn pair(c: &str, r: &str) -> (String, String) {
        (c.to_string(), r.to_string())
    }

    #[test]
    fn test_cosine() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_greedy_match_partial() {
        let a: &[f32] = &[1.0, 0.0];
        let b: &[f32] = &[0.0, 1.0];

        // Candidate {a, b}, reference {a}: P = 0.5, R = 1
        let score = greedy_match(&[a, b], &[a]);
        assert!((score.precision - 0.5).abs() < 1e-9);
        assert!((score.recall - 1.0).abs() < 1e-9);
        assert!((score.f1 - 2.0 / 3.0).abs() < 1e-9);

        assert_eq!(greedy_match(&[], &[a]), BertScore::default());
    }

    #[tokio::test]
    async fn test_score_batch_embeds_once() {
        let embedder = TableEmbedder::new(&[("a", [1.0, 0.0]), ("b", [0.0, 1.0])]);
        let scorer = EmbeddingBertScorer::new(embedder, Arc::new(Segmenter::new()));

        let scores = scorer
            .score_batch(&[pair("a b", "a b"), pair("a b", "a")])
            .await
            .unwrap();

        assert_eq!(scores.len(), 2);
        assert!((scores[0].f1 - 1.0).abs() < 1e-9);
        assert!((scores[1].precision - 0.5).abs() < 1e-9);
        assert!((scores[1].recall - 1.0).abs() < 1e-9);
        assert_eq!(scorer.embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_score_batch_propagates_failure() {
        let scorer = EmbeddingBertScorer::new(FailingEmbedder, Arc::new(Segmenter::new()));
        let result = scorer.score_batch(&[pair("a", "a")]).await;
        assert!(matches!(result, Err(ReqError::Metrics(_))));
    }
}
