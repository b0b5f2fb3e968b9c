//! Permutation entropy of ordinal patterns.

use crate::core::{FeatureRecord, Lag};
use crate::error::{HctsaError, Result};
use crate::utils::stats::argsort;

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

/// Index in `0..m!` of a permutation of `0..m` (Lehmer code).
pub fn lehmer_code(perm: &[usize]) -> usize {
    let m = perm.len();
    let mut code = 0;
    for i in 0..m {
        let smaller = perm[i + 1..].iter().filter(|&&p| p < perm[i]).count();
        code = code * (m - i) + smaller;
    }
    code
}

/// Counts of each ordinal pattern of `m` points spaced `tau` apart.
///
/// Patterns are the stable argsort of each embedding vector, so ties keep
/// their temporal order.
pub fn ordinal_pattern_counts(y: &[f64], m: usize, tau: usize) -> Vec<usize> {
    let mut counts = vec![0usize; factorial(m)];
    let span = (m - 1) * tau;
    if y.len() <= span {
        return counts;
    }
    let mut vector = vec![0.0; m];
    for start in 0..y.len() - span {
        for (k, v) in vector.iter_mut().enumerate() {
            *v = y[start + k * tau];
        }
        counts[lehmer_code(&argsort(&vector))] += 1;
    }
    counts
}

/// `EN_PermEn`: permutation entropy of order `m` at delay `tau`.
///
/// Keys `permEn` (bits over the observed patterns), `normPermEn`
/// (`permEn / log2(m!)`) and `permEnLE`, where every possible pattern's
/// probability is floored at `1/N_x` before the natural-log entropy is
/// divided by `m - 1`.
///
/// A delay the series cannot resolve gives a NaN record.
///
/// # Errors
/// `InvalidParameter` when `m < 2` or the delay is zero.
pub fn permutation_entropy(y: &[f64], m: usize, tau: Lag) -> Result<FeatureRecord> {
    if m < 2 {
        return Err(HctsaError::InvalidParameter(format!(
            "embedding dimension must be at least 2, got {m}"
        )));
    }
    let keys = ["permEn", "normPermEn", "permEnLE"];
    let Some(tau) = tau.resolve_embedding(y, "permutation entropy")? else {
        return Ok(FeatureRecord::nan_filled(&keys));
    };

    let span = (m - 1) * tau;
    if y.len() <= span {
        log::warn!(
            "permutation entropy: series of length {} has no embedding vectors",
            y.len()
        );
        return Ok(FeatureRecord::nan_filled(&keys));
    }

    let counts = ordinal_pattern_counts(y, m, tau);
    let nx = (y.len() - span) as f64;
    let probabilities: Vec<f64> = counts.iter().map(|&c| c as f64 / nx).collect();

    let perm_en: f64 = -probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>();
    let norm = perm_en / (factorial(m) as f64).log2();
    let floor = 1.0 / nx;
    let perm_en_le = -probabilities
        .iter()
        .map(|&p| p.max(floor))
        .map(|p| p * p.ln())
        .sum::<f64>()
        / (m - 1) as f64;

    let mut out = FeatureRecord::with_capacity(3);
    out.insert(keys[0], perm_en);
    out.insert(keys[1], norm);
    out.insert(keys[2], perm_en_le);
    Ok(out)
}
