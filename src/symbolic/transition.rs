//! Transition matrices of coarse-grained series.

use nalgebra::DMatrix;

use super::coarse_grain::{coarse_grain, CoarseGrain};
use crate::core::{FeatureRecord, Lag};
use crate::correlation::fft_resample;
use crate::error::{HctsaError, Result};
use crate::utils::stats::{max, mean, min, std_dev};

/// Sample standard deviation (ddof 1) of complex values given as
/// `(re, im)` pairs.
fn complex_std(values: &[(f64, f64)]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let re = values.iter().map(|v| v.0).sum::<f64>() / n as f64;
    let im = values.iter().map(|v| v.1).sum::<f64>() / n as f64;
    let ss: f64 = values
        .iter()
        .map(|v| (v.0 - re).powi(2) + (v.1 - im).powi(2))
        .sum();
    (ss / (n - 1) as f64).sqrt()
}

const MATRIX_STATS: [&str; 12] = [
    "ondiag",
    "stddiag",
    "symdiff",
    "symsumdiff",
    "stdeig",
    "maxeig",
    "mineig",
    "maximeig",
    "sumdiagcov",
    "stdeigcov",
    "maxeigcov",
    "mineigcov",
];

fn transition_keys(groups: usize) -> Vec<String> {
    let entries = match groups {
        2 | 3 => (1..=groups * groups).map(|i| format!("T{i}")).collect(),
        _ => (1..=groups).map(|i| format!("TD{i}")).collect::<Vec<_>>(),
    };
    entries
        .into_iter()
        .chain(MATRIX_STATS.iter().map(|k| k.to_string()))
        .collect()
}

/// Covariance of the columns of `t` (observations in rows).
fn column_covariance(t: &DMatrix<f64>) -> DMatrix<f64> {
    let rows = t.nrows();
    let cols = t.ncols();
    let means: Vec<f64> = (0..cols).map(|j| t.column(j).mean()).collect();
    DMatrix::from_fn(cols, cols, |a, b| {
        let s: f64 = (0..rows)
            .map(|r| (t[(r, a)] - means[a]) * (t[(r, b)] - means[b]))
            .sum();
        s / (rows as f64 - 1.0)
    })
}

/// `SB_TransitionMatrix`: one-step transition probabilities between
/// equiprobable states.
///
/// The series is first resampled to `ceil(N/tau)` points when `tau > 1`,
/// then coarse-grained into `groups` quantile states. `T[i][j]` is the
/// fraction of the `N - 1` steps going from state `i` to state `j`.
///
/// # Arguments
/// * `y` - input series
/// * `groups` - number of states, at least 2
/// * `tau` - lag, resolved on `y`
///
/// A lag the series cannot resolve, or a resampled series shorter than
/// two points, gives a NaN record.
///
/// # Errors
/// `InvalidParameter` for fewer than two groups. `ComputationError` when
/// the coarse-grained series misses a state.
pub fn transition_matrix(y: &[f64], groups: usize, tau: Lag) -> Result<FeatureRecord> {
    if groups < 2 {
        return Err(HctsaError::InvalidParameter(
            "too few groups for coarse-graining".into(),
        ));
    }
    let Some(tau) = tau.resolve(y) else {
        log::warn!(
            "transition matrix: lag '{}' could not be resolved for a series of length {}",
            tau,
            y.len()
        );
        return Ok(FeatureRecord::nan_filled(&transition_keys(groups)));
    };

    let resampled;
    let y = if tau > 1 {
        resampled = fft_resample(y, y.len().div_ceil(tau));
        &resampled[..]
    } else {
        y
    };
    let n = y.len();
    if n < 2 {
        log::warn!("transition matrix: {} points left after resampling", n);
        return Ok(FeatureRecord::nan_filled(&transition_keys(groups)));
    }

    let symbols = coarse_grain(y, CoarseGrain::Quantile { groups })?;
    let mut t = DMatrix::<f64>::zeros(groups, groups);
    for w in symbols.windows(2) {
        t[(w[0] - 1, w[1] - 1)] += 1.0;
    }
    t /= (n - 1) as f64;

    let mut out = FeatureRecord::new();
    match groups {
        // column-major order
        2 | 3 => {
            for (i, v) in t.iter().enumerate() {
                out.insert(format!("T{}", i + 1), *v);
            }
        }
        _ => {
            for i in 0..groups {
                out.insert(format!("TD{}", i + 1), t[(i, i)]);
            }
        }
    }

    let diag: Vec<f64> = t.diagonal().iter().copied().collect();
    out.insert("ondiag", t.trace());
    out.insert("stddiag", std_dev(&diag));

    out.insert("symdiff", (&t - t.transpose()).abs().sum());
    let (mut lower, mut upper) = (0.0, 0.0);
    for i in 0..groups {
        for j in 0..groups {
            if i > j {
                lower += t[(i, j)];
            } else if j > i {
                upper += t[(i, j)];
            }
        }
    }
    out.insert("symsumdiff", lower - upper);

    let eig: Vec<(f64, f64)> = t
        .complex_eigenvalues()
        .iter()
        .map(|c| (c.re, c.im))
        .collect();
    let re: Vec<f64> = eig.iter().map(|c| c.0).collect();
    let im: Vec<f64> = eig.iter().map(|c| c.1).collect();
    out.insert("stdeig", complex_std(&eig));
    out.insert("maxeig", max(&re));
    out.insert("mineig", min(&re));
    out.insert("maximeig", max(&im));

    let cov = column_covariance(&t);
    out.insert("sumdiagcov", cov.trace());
    let eig_cov: Vec<f64> = cov.symmetric_eigenvalues().iter().copied().collect();
    out.insert("stdeigcov", std_dev(&eig_cov));
    out.insert("maxeigcov", max(&eig_cov));
    out.insert("mineigcov", min(&eig_cov));

    log::debug!(
        "transition matrix: {} states, mean eigenvalue {:.4}",
        groups,
        mean(&re)
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn alternating_two_state() {
        let y: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let rec = transition_matrix(&y, 2, Lag::Fixed(1)).unwrap();
        // state 2 is the upper half
        assert_relative_eq!(rec["T1"], 0.0);
        assert_relative_eq!(rec["T2"] + rec["T3"], 1.0, epsilon = 1e-12);
        assert_relative_eq!(rec["T4"], 0.0);
        assert_relative_eq!(rec["ondiag"], 0.0);
        assert_relative_eq!(rec["maxeig"], 0.5, epsilon = 1e-3);
        assert_relative_eq!(rec["mineig"], -0.5, epsilon = 1e-3);
        assert_relative_eq!(rec["maximeig"], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let y: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin() + 0.01 * i as f64).collect();
        let rec = transition_matrix(&y, 3, Lag::Fixed(1)).unwrap();
        let total: f64 = (1..=9).map(|i| rec[format!("T{i}").as_str()]).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert!(rec["stdeig"].is_finite());
        assert!(rec["maxeigcov"] >= rec["mineigcov"]);
    }

    #[test]
    fn many_groups_report_diagonal() {
        let y: Vec<f64> = (0..300).map(|i| (i as f64 * 0.05).sin()).collect();
        let rec = transition_matrix(&y, 5, Lag::Fixed(1)).unwrap();
        assert!(rec.contains_key("TD5"));
        assert!(!rec.contains_key("T1"));
        let diag: f64 = (1..=5).map(|i| rec[format!("TD{i}").as_str()]).sum();
        assert_relative_eq!(diag, rec["ondiag"], epsilon = 1e-12);
    }

    #[test]
    fn lag_resamples() {
        let y: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
        let rec = transition_matrix(&y, 2, Lag::Fixed(4)).unwrap();
        let total: f64 = (1..=4).map(|i| rec[format!("T{i}").as_str()]).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_one_group() {
        assert!(matches!(
            transition_matrix(&[1.0, 2.0, 3.0], 1, Lag::Fixed(1)),
            Err(HctsaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn unresolvable_lag_is_nan() {
        let y = vec![1.0; 30];
        let rec = transition_matrix(&y, 2, Lag::FirstZeroCrossing).unwrap();
        assert!(rec.all_nan());
        assert_eq!(rec.keys().collect::<Vec<_>>(), transition_keys(2));

        let varied: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
        let full = transition_matrix(&varied, 2, Lag::Fixed(1)).unwrap();
        assert_eq!(full.keys().collect::<Vec<_>>(), transition_keys(2));
    }

    #[test]
    fn missing_state_is_an_error() {
        let y = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0];
        assert!(matches!(
            transition_matrix(&y, 3, Lag::Fixed(1)),
            Err(HctsaError::ComputationError(_))
        ));
    }
}
