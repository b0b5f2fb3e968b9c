//! Moving-threshold model of extreme events.

use crate::core::FeatureRecord;
use crate::error::{HctsaError, Result};
use crate::transform::warn_if_not_zscored;
use crate::utils::stats::{diff, iqr, max, mean, median, min, std_dev};

/// `EX_MovingThreshold`: a barrier that jumps on extreme events and decays
/// otherwise.
///
/// The barrier `q` starts at 1. When `|y[i]|` exceeds it, it is reset to
/// `(1 + a)·|y[i]|` (a "kick"); otherwise it shrinks by the proportion `b`.
/// Keys `meanq, medianq, iqrq, maxq, minq, stdq, meanqover, pkick`, and for
/// the intervals between kicks `stdkicks, meankickf, mediankicksf`.
/// `pkick` is the summed kick size over `N - 1`. Intended for z-scored
/// input.
///
/// # Errors
/// `EmptyData` for an empty series, `InvalidParameter` when `b` is outside
/// `[0, 1]`.
pub fn moving_threshold(y: &[f64], a: f64, b: f64) -> Result<FeatureRecord> {
    if y.is_empty() {
        return Err(HctsaError::EmptyData);
    }
    if !(0.0..=1.0).contains(&b) {
        return Err(HctsaError::InvalidParameter(format!(
            "barrier decay proportion must lie in [0, 1], got {b}"
        )));
    }
    warn_if_not_zscored(y, "moving threshold");

    let n = y.len();
    let abs: Vec<f64> = y.iter().map(|v| v.abs()).collect();
    let mut q = vec![0.0; n];
    let mut kicks = vec![0.0; n];
    q[0] = 1.0;
    for i in 1..n {
        if abs[i] > q[i - 1] {
            q[i] = (1.0 + a) * abs[i];
            kicks[i] = q[i] - q[i - 1];
        } else {
            q[i] = (1.0 - b) * q[i - 1];
        }
    }

    let over: Vec<f64> = q.iter().zip(&abs).map(|(qi, yi)| qi - yi).collect();
    let kick_times: Vec<f64> = kicks
        .iter()
        .enumerate()
        .filter(|&(_, &k)| k > 0.0)
        .map(|(i, _)| i as f64)
        .collect();
    let intervals = diff(&kick_times);

    let mut out = FeatureRecord::with_capacity(11);
    out.insert("meanq", mean(&q));
    out.insert("medianq", median(&q));
    out.insert("iqrq", iqr(&q));
    out.insert("maxq", max(&q));
    out.insert("minq", min(&q));
    out.insert("stdq", std_dev(&q));
    out.insert("meanqover", mean(&over));
    out.insert("pkick", kicks.iter().sum::<f64>() / (n as f64 - 1.0));
    out.insert("stdkicks", std_dev(&intervals));
    out.insert("meankickf", mean(&intervals));
    out.insert("mediankicksf", median(&intervals));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quiet_series_only_decays() {
        let y = [0.0; 5];
        let rec = moving_threshold(&y, 1.0, 0.5).unwrap();
        // q = 1, 0.5, 0.25, ... until |y| = 0 never exceeds it
        assert_relative_eq!(rec["maxq"], 1.0);
        assert_relative_eq!(rec["minq"], 0.0625);
        assert_relative_eq!(rec["pkick"], 0.0);
        assert!(rec["meankickf"].is_nan());
    }

    #[test]
    fn periodic_spikes_kick_regularly() {
        let y: Vec<f64> = (0..60).map(|i| if i % 10 == 5 { 3.0 } else { 0.0 }).collect();
        let rec = moving_threshold(&y, 0.1, 0.5).unwrap();
        assert_relative_eq!(rec["meankickf"], 10.0);
        assert_relative_eq!(rec["stdkicks"], 0.0);
        assert_relative_eq!(rec["maxq"], 3.3, epsilon = 1e-12);
    }

    #[test]
    fn decay_outside_unit_interval_is_rejected() {
        assert!(moving_threshold(&[1.0, 2.0], 1.0, 1.5).is_err());
        assert_eq!(moving_threshold(&[], 1.0, 0.1), Err(HctsaError::EmptyData));
    }
}
