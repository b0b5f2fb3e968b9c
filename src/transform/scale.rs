//! Z-scoring and the z-score check used by many operations.

use crate::error::{HctsaError, Result};
use crate::utils::stats::{mean, std_pop};

/// Z-score `series` with the population standard deviation.
///
/// The transform is applied twice to shave off rounding error, so that the
/// output passes [`is_zscored`]. A constant series has no scale; the result
/// is all NaN and a warning is logged.
///
/// # Errors
/// Returns `InvalidParameter` if the input contains NaN.
pub fn zscore(series: &[f64]) -> Result<Vec<f64>> {
    if series.is_empty() {
        return Err(HctsaError::EmptyData);
    }
    if series.iter().any(|x| x.is_nan()) {
        return Err(HctsaError::InvalidParameter(
            "cannot z-score a series containing NaN".into(),
        ));
    }
    let once = standardize_pop(series);
    if once.iter().any(|x| !x.is_finite()) {
        log::warn!("z-scoring a constant series of length {}", series.len());
        return Ok(vec![f64::NAN; series.len()]);
    }
    Ok(standardize_pop(&once))
}

fn standardize_pop(series: &[f64]) -> Vec<f64> {
    let m = mean(series);
    let s = std_pop(series);
    series.iter().map(|&x| (x - m) / s).collect()
}

/// Crude check for whether a series is z-scored.
///
/// True when the mean and the population standard deviation are within
/// `100·ε` of 0 and 1 respectively.
pub fn is_zscored(series: &[f64]) -> bool {
    let threshold = 100.0 * f64::EPSILON;
    (mean(series).abs() < threshold) && ((std_pop(series) - 1.0).abs() < threshold)
}

/// Log a warning when an operation that assumes z-scored input gets raw data.
pub(crate) fn warn_if_not_zscored(series: &[f64], operation: &str) {
    if !is_zscored(series) {
        log::warn!("{operation}: input series is not z-scored");
    }
}
