//! # reqsplit-metrics
//!
//! Text-similarity scoring of model decompositions against reference text.
//!
//! - Chinese word segmentation (jieba)
//! - ROUGE-1, BLEU and METEOR on segmented tokens
//! - BERTScore from token embeddings
//! - Row alignment and the combined per-row/average report

mod aggregate;
mod bertscore;
mod bleu;
mod meteor;
mod rouge;
mod sanity;
mod tokenize;

pub use aggregate::{align, score_pairs, AlignedPair, AverageScores, MetricsReport, RowKey, RowScores};
pub use bertscore::{cosine_similarity, greedy_match, BertScore, BertScorer, EmbeddingBertScorer};
pub use bleu::{bleu, MAX_ORDER};
pub use meteor::meteor;
pub use rouge::rouge1_f;
pub use sanity::{sanity_pairs, SanityCase, SANITY_CASES};
pub use tokenize::Segmenter;
