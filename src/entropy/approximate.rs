//! Approximate entropy.

use crate::utils::stats::std_dev;

/// `EN_ApEn`: approximate entropy `ApEn(m, r)`.
///
/// The tolerance is `r_factor·std` of `y`. Template distances are Chebyshev
/// and a template counts as matching itself, so every `C_i > 0`.
///
/// # Arguments
/// * `y` - input series
/// * `m` - embedding dimension
/// * `r_factor` - tolerance as a multiple of the standard deviation
///
/// Returns NaN for a series without variance or too short for `m + 1`.
pub fn approximate_entropy(y: &[f64], m: usize, r_factor: f64) -> f64 {
    let n = y.len();
    if m == 0 || n < m + 1 {
        return f64::NAN;
    }
    let sd = std_dev(y);
    if sd.is_nan() || sd == 0.0 {
        log::warn!("approximate entropy: series has no variance");
        return f64::NAN;
    }
    let r = r_factor * sd;
    phi(y, m, r) - phi(y, m + 1, r)
}

/// Mean log fraction of templates of length `m` within `r` of each template.
fn phi(y: &[f64], m: usize, r: f64) -> f64 {
    let count = y.len() - m + 1;
    let mut sum = 0.0;
    for i in 0..count {
        let matches = (0..count)
            .filter(|&j| (0..m).all(|k| (y[i + k] - y[j + k]).abs() <= r))
            .count();
        sum += (matches as f64 / count as f64).ln();
    }
    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_is_nan() {
        assert!(approximate_entropy(&[1.0; 40], 1, 0.2).is_nan());
    }

    #[test]
    fn regular_sequence_has_low_apen() {
        let y: Vec<f64> = (0..200).map(|i| (i % 4) as f64).collect();
        let apen = approximate_entropy(&y, 2, 0.2);
        assert!(apen.abs() < 0.05, "apen = {apen}");
    }

    #[test]
    fn small_example() {
        // r = 0.2·std([1, 2, 1, 2, 3]) ≈ 0.167, so only equal values match
        let y = [1.0, 2.0, 1.0, 2.0, 3.0];
        // m = 1: C = [2/5, 2/5, 2/5, 2/5, 1/5]
        let phi1 = (4.0 * (0.4f64).ln() + (0.2f64).ln()) / 5.0;
        // m = 2: templates 12, 21, 12, 23 -> C = [2/4, 1/4, 2/4, 1/4]
        let phi2 = (2.0 * (0.5f64).ln() + 2.0 * (0.25f64).ln()) / 4.0;
        assert_relative_eq!(approximate_entropy(&y, 1, 0.2), phi1 - phi2, epsilon = 1e-12);
    }
}
