//! Complexity estimates from the stretched-out length of the series.

use crate::core::FeatureRecord;
use crate::utils::stats::{diff, sorted};

/// Root mean square of consecutive differences.
fn ce1(y: &[f64]) -> f64 {
    let d = diff(y);
    if d.is_empty() {
        return f64::NAN;
    }
    (d.iter().map(|v| v * v).sum::<f64>() / d.len() as f64).sqrt()
}

/// Mean length of the unit-step line segments joining consecutive points.
fn ce2(y: &[f64]) -> f64 {
    let d = diff(y);
    if d.is_empty() {
        return f64::NAN;
    }
    d.iter().map(|v| (1.0 + v * v).sqrt()).sum::<f64>() / d.len() as f64
}

/// `EN_CID`: complexity-invariant distance estimates.
///
/// `CE1` is the RMS of the increments and `CE2` the mean segment length of
/// the line graph. Both are also computed for the sorted series, the least
/// complex ordering of the same values (`minCE1`, `minCE2`), and
/// normalised by them (`CE1_norm`, `CE2_norm`).
///
/// # Arguments
/// * `y` - Input time series
pub fn cid(y: &[f64]) -> FeatureRecord {
    let ordered = sorted(y);
    let (c1, c2) = (ce1(y), ce2(y));
    let (min1, min2) = (ce1(&ordered), ce2(&ordered));

    let mut out = FeatureRecord::with_capacity(6);
    out.insert("CE1", c1);
    out.insert("CE2", c2);
    out.insert("minCE1", min1);
    out.insert("minCE2", min2);
    out.insert("CE1_norm", c1 / min1);
    out.insert("CE2_norm", c2 / min2);
    out
}
