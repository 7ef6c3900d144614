//! METEOR with exact-match alignment

pub const ALPHA: f64 = 0.9;
pub const BETA: f64 = 3.0;
pub const GAMMA: f64 = 0.5;

/// Pairs of (candidate index, reference index), each token used once
fn align(candidate: &[String], reference: &[String]) -> Vec<(usize, usize)> {
    let mut used = vec![false; reference.len()];
    let mut pairs = Vec::new();

    for (i, token) in candidate.iter().enumerate() {
        if let Some(j) = (0..reference.len()).find(|&j| !used[j] && &reference[j] == token) {
            used[j] = true;
            pairs.push((i, j));
        }
    }

    pairs
}

fn count_chunks(pairs: &[(usize, usize)]) -> usize {
    if pairs.is_empty() {
        return 0;
    }
    1 + pairs
        .windows(2)
        .filter(|w| !(w[1].0 == w[0].0 + 1 && w[1].1 == w[0].1 + 1))
        .count()
}

fn normalize(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| t.to_lowercase()).collect()
}

/// METEOR score of `candidate` against `reference`
///
/// Fmean weights recall by [`ALPHA`]; the fragmentation penalty is
/// `GAMMA * (chunks / matches) ^ BETA`.
pub fn meteor(candidate: &[String], reference: &[String]) -> f64 {
    let candidate = normalize(candidate);
    let reference = normalize(reference);

    let pairs = align(&candidate, &reference);
    let matches = pairs.len();
    if matches == 0 {
        return 0.0;
    }

    let precision = matches as f64 / candidate.len() as f64;
    let recall = matches as f64 / reference.len() as f64;
    let fmean = precision * recall / (ALPHA * precision + (1.0 - ALPHA) * recall);

    let fragmentation = count_chunks(&pairs) as f64 / matches as f64;
    let penalty = GAMMA * fragmentation.powf(BETA);

    fmean * (1.0 - penalty)
}
