//! Moddemeijer's histogram estimator of mutual information.
//!
//! Cells are centred on the data range padded by half a sample spacing,
//! with `ceil(N^(1/3))` cells per axis. The biased estimate is corrected
//! by `(Kx - 1)(Ky - 1) / 2N` and comes with a standard error.

use std::str::FromStr;

use crate::error::{HctsaError, Result};
use crate::utils::stats::{max, min};

/// Bias treatment of [`rm_information`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RmApproach {
    #[default]
    Unbiased,
    /// Shrunk towards zero to minimise the mean squared error.
    Mmse,
    Biased,
}

impl FromStr for RmApproach {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unbiased" => Ok(RmApproach::Unbiased),
            "mmse" => Ok(RmApproach::Mmse),
            "biased" => Ok(RmApproach::Biased),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown bias approach '{other}'"
            ))),
        }
    }
}

/// Estimate returned by [`rm_information`], in nats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmEstimate {
    pub estimate: f64,
    /// Remaining N-bias; zero once corrected.
    pub nbias: f64,
    /// Standard error.
    pub sigma: f64,
}

/// Cell of `v` along one axis, `None` outside the descriptor.
fn cell(v: f64, lower: f64, upper: f64, ncell: usize) -> Option<usize> {
    let k = ((v - lower) / (upper - lower) * ncell as f64 + 0.5).round();
    (k >= 1.0 && k <= ncell as f64).then(|| k as usize - 1)
}

fn axis(v: &[f64]) -> (f64, f64) {
    let (lo, hi) = (min(v), max(v));
    let delta = (hi - lo) / (v.len() - 1) as f64;
    (lo - delta / 2.0, hi + delta / 2.0)
}

/// Mutual information of paired samples `x`, `y`.
///
/// Returns `None` (with a warning) when either sample is constant or fewer
/// than two pairs are given.
///
/// # Errors
/// `DimensionMismatch` for samples of different lengths.
pub fn rm_information(x: &[f64], y: &[f64], approach: RmApproach) -> Result<Option<RmEstimate>> {
    if x.len() != y.len() {
        return Err(HctsaError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    let n = x.len();
    if n < 2 || min(x) == max(x) || min(y) == max(y) {
        log::warn!("Moddemeijer information: {} pairs without spread on both axes", n);
        return Ok(None);
    }

    let ncell = (n as f64).cbrt().ceil() as usize;
    let (lx, ux) = axis(x);
    let (ly, uy) = axis(y);
    let mut h = vec![vec![0usize; ncell]; ncell];
    for (&a, &b) in x.iter().zip(y) {
        if let (Some(i), Some(j)) = (cell(a, lx, ux, ncell), cell(b, ly, uy, ncell)) {
            h[i][j] += 1;
        }
    }
    let hx: Vec<f64> = h.iter().map(|row| row.iter().sum::<usize>() as f64).collect();
    let hy: Vec<f64> = (0..ncell)
        .map(|j| h.iter().map(|row| row[j]).sum::<usize>() as f64)
        .collect();

    let (mut estimate, mut sigma, mut count) = (0.0, 0.0, 0.0);
    for (i, row) in h.iter().enumerate() {
        for (j, &c) in row.iter().enumerate() {
            if c == 0 {
                continue;
            }
            let c = c as f64;
            let logf = (c / hx[i] / hy[j]).ln();
            count += c;
            estimate += c * logf;
            sigma += c * logf * logf;
        }
    }
    estimate /= count;
    sigma = ((sigma / count - estimate * estimate) / (count - 1.0)).sqrt();
    estimate += count.ln();
    let mut nbias = ((ncell - 1) * (ncell - 1)) as f64 / (2.0 * count);

    match approach {
        RmApproach::Biased => {}
        RmApproach::Unbiased => {
            estimate -= nbias;
            nbias = 0.0;
        }
        RmApproach::Mmse => {
            estimate -= nbias;
            let lambda = estimate * estimate / (estimate * estimate + sigma * sigma);
            nbias = (1.0 - lambda) * estimate;
            estimate *= lambda;
            sigma *= lambda;
        }
    }
    Ok(Some(RmEstimate {
        estimate,
        nbias,
        sigma,
    }))
}

/// `CO_RM_AMInformation`: unbiased Moddemeijer automutual information of
/// `y` at `tau`.
///
/// NaN when the lag leaves fewer than two pairs or a lagged copy is
/// constant.
pub fn rm_ami(y: &[f64], tau: usize) -> f64 {
    let n = y.len();
    if tau >= n || n - tau < 2 {
        log::warn!(
            "Moddemeijer AMI: lag {} leaves fewer than 2 pairs in a series of length {}",
            tau,
            n
        );
        return f64::NAN;
    }
    match rm_information(&y[..n - tau], &y[tau..], RmApproach::Unbiased) {
        Ok(Some(est)) => est.estimate,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| StandardNormal.sample(&mut rng)).collect()
    }

    #[test]
    fn cells_follow_the_padded_range() {
        // 8 points: 2 cells over [-0.5, 7.5]
        assert_eq!(cell(0.0, -0.5, 7.5, 2), Some(0));
        assert_eq!(cell(3.4, -0.5, 7.5, 2), Some(0));
        assert_eq!(cell(3.6, -0.5, 7.5, 2), Some(1));
        assert_eq!(cell(7.0, -0.5, 7.5, 2), Some(1));
        assert_eq!(cell(9.0, -0.5, 7.5, 2), None);
    }

    #[test]
    fn identical_samples_give_the_binned_entropy() {
        // 10 points give 3 cells over [-0.5, 9.5] holding 3, 4 and 3 points
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let entropy = -(0.6 * 0.3f64.ln() + 0.4 * 0.4f64.ln());
        let biased = rm_information(&x, &x, RmApproach::Biased).unwrap().unwrap();
        assert_relative_eq!(biased.estimate, entropy, epsilon = 1e-12);
        assert_relative_eq!(biased.nbias, 0.2, epsilon = 1e-12);
        assert!(biased.sigma > 0.0);

        let unbiased = rm_information(&x, &x, RmApproach::Unbiased).unwrap().unwrap();
        assert_relative_eq!(unbiased.estimate, entropy - 0.2, epsilon = 1e-12);
        assert_eq!(unbiased.nbias, 0.0);
        assert_relative_eq!(rm_ami(&x, 0), entropy - 0.2, epsilon = 1e-12);
    }

    #[test]
    fn independent_noise_is_near_zero() {
        let y = noise(5000, 8);
        let ami = rm_ami(&y, 1);
        assert!(ami.abs() < 0.02, "ami = {ami}");

        let x = noise(2000, 1);
        let est = rm_information(&x, &noise(2000, 2), RmApproach::Mmse)
            .unwrap()
            .unwrap();
        assert!(est.estimate.abs() < 0.05);
        assert!(est.sigma >= 0.0);
    }

    #[test]
    fn slow_sine_has_high_ami() {
        let y: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.05).sin()).collect();
        assert!(rm_ami(&y, 1) > 1.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(rm_ami(&[1.0; 20], 1).is_nan());
        assert!(rm_ami(&[1.0, 2.0, 3.0], 2).is_nan());
        assert!(matches!(
            rm_information(&[1.0, 2.0], &[1.0], RmApproach::Biased),
            Err(HctsaError::DimensionMismatch { .. })
        ));
        assert_eq!("mmse".parse::<RmApproach>().unwrap(), RmApproach::Mmse);
    }
}
