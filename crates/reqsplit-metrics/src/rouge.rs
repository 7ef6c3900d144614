//! ROUGE-1: unigram overlap F-measure

use crate::tokenize::is_word;
use std::collections::HashMap;

fn unigram_counts(tokens: &[String], words_only: bool) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokens.iter().filter(|t| !words_only || is_word(t)) {
        *counts.entry(token.to_lowercase()).or_insert(0) += 1;
    }
    counts
}

/// ROUGE-1 F-measure of `candidate` against `reference`
///
/// Overlap counts are clipped per token; tokens are lowercased and
/// punctuation-only tokens are ignored unless neither side has any other
/// token, in which case every token counts.
pub fn rouge1_f(candidate: &[String], reference: &[String]) -> f64 {
    let mut counts = (
        unigram_counts(candidate, true),
        unigram_counts(reference, true),
    );
    if counts.0.is_empty() && counts.1.is_empty() {
        counts = (
            unigram_counts(candidate, false),
            unigram_counts(reference, false),
        );
    }
    let (candidate, reference) = counts;

    let candidate_total: usize = candidate.values().sum();
    let reference_total: usize = reference.values().sum();
    if candidate_total == 0 || reference_total == 0 {
        return 0.0;
    }

    let overlap: usize = candidate
        .iter()
        .map(|(token, &count)| count.min(reference.get(token).copied().unwrap_or(0)))
        .sum();
    if overlap == 0 {
        return 0.0;
    }

    let precision = overlap as f64 / candidate_total as f64;
    let recall = overlap as f64 / reference_total as f64;
    2.0 * precision * recall / (precision + recall)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_identical() {
        let t = toks("用户 登录 查看 余额");
        assert!((rouge1_f(&t, &t) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_order_does_not_matter() {
        let score = rouge1_f(&toks("修改 密码 用户 登录"), &toks("用户 登录 修改 密码"));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_overlap() {
        // P = 2/2, R = 2/4
        let score = rouge1_f(&toks("用户 登录"), &toks("用户 登录 查看 余额"));
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_clipped_counts() {
        // Overlap of "登录" is clipped to the single reference occurrence
        let score = rouge1_f(&toks("登录 登录 登录"), &toks("登录 用户"));
        let (p, r) = (1.0 / 3.0, 1.0 / 2.0);
        assert!((score - 2.0 * p * r / (p + r)).abs() < 1e-12);
    }

    #[test]
    fn test_case_and_punctuation() {
        let score = rouge1_f(&toks("Login ， APP"), &toks("login app 。"));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_and_empty() {
        assert_eq!(rouge1_f(&toks("用户"), &toks("余额")), 0.0);
        assert_eq!(rouge1_f(&[], &toks("余额")), 0.0);
        assert_eq!(rouge1_f(&toks("，"), &toks("。")), 0.0);
        assert_eq!(rouge1_f(&toks("，"), &toks("余额")), 0.0);
    }

    #[test]
    fn test_punctuation_only_self_comparison() {
        for text in ["/", "— —", "，"] {
            let t = toks(text);
            assert!((rouge1_f(&t, &t) - 1.0).abs() < 1e-12, "{:?}", text);
        }
    }
}
