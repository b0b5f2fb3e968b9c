//! Fast detrended fluctuation analysis.

use crate::error::{HctsaError, Result};
use crate::utils::ols::{linear_fit, polyfit_residuals};
use crate::utils::stats::cumsum;

/// Dyadic interval widths `round(N / 2^s)` from the coarsest scale down.
pub fn dyadic_intervals(n: usize) -> Vec<usize> {
    if n < 2 {
        return Vec::new();
    }
    let mut scales = n.ilog2() as usize;
    if scales > 0 && (1usize << (scales - 1)) as f64 > n as f64 / 2.5 {
        scales -= 1;
    }
    (0..scales)
        .rev()
        .map(|s| (n as f64 / (1usize << s) as f64 + 0.5) as usize)
        .collect()
}

/// RMS fluctuation of the integrated series `y` about piecewise linear
/// trends of width `interval`. A trailing partial segment is compared with
/// itself and so contributes zero.
fn fluctuation(y: &[f64], interval: usize) -> f64 {
    let n = y.len();
    let t: Vec<f64> = (0..interval).map(|i| i as f64).collect();
    let mut ss = 0.0;
    for segment in y.chunks_exact(interval) {
        if let Some(res) = polyfit_residuals(&t, segment, 1) {
            ss += res.iter().map(|r| r * r).sum::<f64>();
        }
    }
    (ss / n as f64).sqrt()
}

/// `SC_fastdfa`: DFA scaling exponent.
///
/// The cumulative sum is detrended segment by segment at each interval
/// width and the exponent is the slope of `log10 F` against
/// `log10 width`.
///
/// # Arguments
/// * `x` - input series
/// * `intervals` - widths to use; dyadic widths when `None`
///
/// # Errors
/// `InvalidParameter` when explicit intervals are fewer than two or lie
/// outside `3..=N`.
pub fn fast_dfa(x: &[f64], intervals: Option<&[usize]>) -> Result<f64> {
    let n = x.len();
    let intervals = match intervals {
        Some(given) => {
            if given.len() < 2 {
                return Err(HctsaError::InvalidParameter(
                    "number of intervals must be greater than one".into(),
                ));
            }
            if given.iter().any(|&w| w < 3 || w > n) {
                return Err(HctsaError::InvalidParameter(format!(
                    "interval sizes must lie between 3 and the series length {n}"
                )));
            }
            given.to_vec()
        }
        None => {
            let intervals = dyadic_intervals(n);
            if intervals.len() < 2 || intervals.iter().any(|&w| w < 2) {
                log::warn!("fast DFA: series of length {} is too short", n);
                return Ok(f64::NAN);
            }
            intervals
        }
    };

    let y = cumsum(x);
    let log_w: Vec<f64> = intervals.iter().map(|&w| (w as f64).log10()).collect();
    let log_f: Vec<f64> = intervals
        .iter()
        .map(|&w| fluctuation(&y, w).log10())
        .collect();
    Ok(linear_fit(&log_w, &log_f).map_or(f64::NAN, |(_, slope)| slope))
}
