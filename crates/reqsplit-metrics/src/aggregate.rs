//! Row alignment, per-row scoring and the combined report

use crate::bertscore::BertScorer;
use crate::bleu::bleu;
use crate::meteor::meteor;
use crate::rouge::rouge1_f;
use crate::tokenize::Segmenter;
use reqsplit_core::{ReqError, Result, RowNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Label of a scored row: a row number, or a case name for canned cases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    Row(RowNumber),
    Case(String),
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowKey::Row(row) => write!(f, "{}", row),
            RowKey::Case(name) => write!(f, "{}", name),
        }
    }
}

/// A prediction and its reference text under one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub key: RowKey,
    pub prediction: String,
    pub reference: String,
}

/// Inner-join predictions and references on row number, ascending
pub fn align(
    predictions: &BTreeMap<RowNumber, String>,
    references: &BTreeMap<RowNumber, String>,
) -> Vec<AlignedPair> {
    for row in references.keys().filter(|row| !predictions.contains_key(row)) {
        info!("Row {} has a reference but no prediction, skipping", row);
    }

    predictions
        .iter()
        .filter_map(|(row, prediction)| match references.get(row) {
            Some(reference) => Some(AlignedPair {
                key: RowKey::Row(*row),
                prediction: prediction.clone(),
                reference: reference.clone(),
            }),
            None => {
                info!("Row {} has no reference, skipping", row);
                None
            }
        })
        .collect()
}

/// All scores for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowScores {
    pub row: RowKey,
    pub bert_precision: f64,
    pub bert_recall: f64,
    pub bert_f1: f64,
    #[serde(rename = "rouge-1")]
    pub rouge_1: f64,
    pub bleu: f64,
    pub meteor: f64,
}

/// Arithmetic means over all scored rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageScores {
    pub bert_precision: f64,
    pub bert_recall: f64,
    pub bert_f1: f64,
    #[serde(rename = "rouge-1")]
    pub rouge_1: f64,
    pub bleu: f64,
    pub meteor: f64,
}

impl AverageScores {
    fn of(rows: &[RowScores]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }

        let n = rows.len() as f64;
        let mean = |f: fn(&RowScores) -> f64| rows.iter().map(f).sum::<f64>() / n;

        Self {
            bert_precision: mean(|r| r.bert_precision),
            bert_recall: mean(|r| r.bert_recall),
            bert_f1: mean(|r| r.bert_f1),
            rouge_1: mean(|r| r.rouge_1),
            bleu: mean(|r| r.bleu),
            meteor: mean(|r| r.meteor),
        }
    }
}

impl std::fmt::Display for AverageScores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Average BERT Precision: {:.4}", self.bert_precision)?;
        writeln!(f, "Average BERT Recall:    {:.4}", self.bert_recall)?;
        writeln!(f, "Average BERT F1:        {:.4}", self.bert_f1)?;
        writeln!(f, "Average ROUGE-1:        {:.4}", self.rouge_1)?;
        writeln!(f, "Average BLEU:           {:.4}", self.bleu)?;
        write!(f, "Average METEOR:         {:.4}", self.meteor)
    }
}

/// The combined metrics file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub per_row_scores: Vec<RowScores>,
    pub average_scores: AverageScores,
}

/// Score every aligned pair
///
/// BERTScore runs once over the whole batch; ROUGE-1, BLEU and METEOR run
/// per pair on segmented text.
pub async fn score_pairs(
    pairs: &[AlignedPair],
    segmenter: &Segmenter,
    bert: &dyn BertScorer,
) -> Result<MetricsReport> {
    if pairs.is_empty() {
        return Err(ReqError::NoAlignedRows);
    }

    info!("Computing BERTScore for {} rows", pairs.len());
    let texts: Vec<(String, String)> = pairs
        .iter()
        .map(|p| (p.prediction.clone(), p.reference.clone()))
        .collect();
    let bert_scores = bert.score_batch(&texts).await?;

    if bert_scores.len() != pairs.len() {
        return Err(ReqError::Metrics(format!(
            "BERTScore returned {} results for {} rows",
            bert_scores.len(),
            pairs.len()
        )));
    }

    let per_row_scores: Vec<RowScores> = pairs
        .iter()
        .zip(bert_scores)
        .map(|(pair, bert)| {
            let prediction = segmenter.tokens(&pair.prediction);
            let reference = segmenter.tokens(&pair.reference);

            let scores = RowScores {
                row: pair.key.clone(),
                bert_precision: bert.precision,
                bert_recall: bert.recall,
                bert_f1: bert.f1,
                rouge_1: rouge1_f(&prediction, &reference),
                bleu: bleu(&prediction, &reference),
                meteor: meteor(&prediction, &reference),
            };
            info!("Scored row {}", pair.key);
            scores
        })
        .collect();

    let average_scores = AverageScores::of(&per_row_scores);
    Ok(MetricsReport {
        per_row_scores,
        average_scores,
    })
}
