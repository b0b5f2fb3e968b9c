//! Histogram mutual information between two vectors.

use crate::binning::{histogram, histogram2d};
use crate::error::{HctsaError, Result};
use crate::utils::stats::{linspace, max, min, quantiles_hazen};

/// Widening of the last edge so the maximum is counted.
const EDGE_EPS: f64 = 1e-6;

/// How the edges of one variable are placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeRule {
    /// Equal-width bins between the minimum and maximum.
    Range,
    /// Equiprobable bins at Hazen quantiles.
    Quantile,
    /// Equal-width bins over a fixed interval.
    Fixed(f64, f64),
}

impl EdgeRule {
    fn edges(&self, v: &[f64], num_bins: usize) -> Vec<f64> {
        match *self {
            EdgeRule::Range => linspace(min(v), max(v) + EDGE_EPS, num_bins + 1),
            EdgeRule::Quantile => {
                let mut e = quantiles_hazen(v, &linspace(0.0, 1.0, num_bins + 1));
                if let Some(last) = e.last_mut() {
                    *last += EDGE_EPS;
                }
                e
            }
            EdgeRule::Fixed(lo, hi) => linspace(lo, hi + EDGE_EPS, num_bins + 1),
        }
    }
}

/// `BF_MutualInformation`: mutual information (nats) of `v1` and `v2` from
/// a joint histogram.
///
/// # Arguments
/// * `v1`, `v2` - paired samples, equal length
/// * `r1`, `r2` - edge rule for each variable
/// * `num_bins` - bins per variable
///
/// # Errors
/// `DimensionMismatch` when the lengths differ, `InvalidParameter` for zero
/// bins, `EmptyData` for empty input.
pub fn mutual_information(
    v1: &[f64],
    v2: &[f64],
    r1: EdgeRule,
    r2: EdgeRule,
    num_bins: usize,
) -> Result<f64> {
    if v1.len() != v2.len() {
        return Err(HctsaError::DimensionMismatch {
            expected: v1.len(),
            got: v2.len(),
        });
    }
    if v1.is_empty() {
        return Err(HctsaError::EmptyData);
    }
    if num_bins == 0 {
        return Err(HctsaError::InvalidParameter(
            "number of bins must be positive".into(),
        ));
    }

    let e1 = r1.edges(v1, num_bins);
    let e2 = r2.edges(v2, num_bins);
    let joint = histogram2d(v1, v2, &e1, &e2);

    // marginals count every in-range value, even when its partner is dropped
    let n = v1.len() as f64;
    let p1: Vec<f64> = histogram(v1, &e1).iter().map(|&c| c as f64 / n).collect();
    let p2: Vec<f64> = histogram(v2, &e2).iter().map(|&c| c as f64 / n).collect();

    let mut mi = 0.0;
    let mut populated = false;
    for (i, row) in joint.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            let pij = count as f64 / n;
            if p1[i] * p2[j] > 0.0 && pij > 0.0 {
                populated = true;
                mi += pij * (pij / (p1[i] * p2[j])).ln();
            }
        }
    }
    if !populated {
        log::warn!("mutual information: no populated cells in the joint histogram");
        return Ok(f64::NAN);
    }
    Ok(mi)
}
