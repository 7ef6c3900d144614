//! Sentence BLEU against a single reference

use std::collections::HashMap;

/// Highest n-gram order
pub const MAX_ORDER: usize = 4;

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// BLEU of `candidate` against `reference`
///
/// Uniform weights up to [`MAX_ORDER`], brevity penalty, no smoothing.
/// Candidates shorter than [`MAX_ORDER`] use their own length as the
/// highest order, so a sentence always scores 1.0 against itself.
pub fn bleu(candidate: &[String], reference: &[String]) -> f64 {
    if candidate.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let max_order = MAX_ORDER.min(candidate.len());
    let mut log_precision_sum = 0.0;

    for n in 1..=max_order {
        let reference_counts = ngram_counts(reference, n);
        let matches: usize = ngram_counts(candidate, n)
            .into_iter()
            .map(|(gram, count)| count.min(reference_counts.get(gram).copied().unwrap_or(0)))
            .sum();

        if matches == 0 {
            return 0.0;
        }

        let possible = candidate.len() + 1 - n;
        log_precision_sum += (matches as f64 / possible as f64).ln();
    }

    let geo_mean = (log_precision_sum / max_order as f64).exp();

    let (c, r) = (candidate.len() as f64, reference.len() as f64);
    let brevity_penalty = if c > r { 1.0 } else { (1.0 - r / c).exp() };

    geo_mean * brevity_penalty
}
