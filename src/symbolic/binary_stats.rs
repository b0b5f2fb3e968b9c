//! Run-length statistics of binarised series.

use std::str::FromStr;

use super::coarse_grain::{binarize, BinarizeMethod};
use crate::core::FeatureRecord;
use crate::error::{HctsaError, Result};
use crate::transform::sign_change_indices;
use crate::utils::stats::{mean, std_dev};

/// Lengths of maximal runs of `value` in `bits`.
pub fn run_lengths(bits: &[u8], value: u8) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0usize;
    for &b in bits {
        if b == value {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

struct StretchStats {
    long: f64,
    mean: f64,
    std: f64,
}

impl StretchStats {
    fn of(runs: &[usize]) -> Self {
        if runs.is_empty() {
            return Self {
                long: 0.0,
                mean: 0.0,
                std: f64::NAN,
            };
        }
        let lengths: Vec<f64> = runs.iter().map(|&r| r as f64).collect();
        Self {
            long: runs.iter().copied().max().unwrap_or(0) as f64,
            mean: mean(&lengths),
            std: std_dev(&lengths),
        }
    }
}

/// Fraction of runs of length 2 minus fraction of length 1; NaN without runs.
fn diff21(runs: &[usize]) -> f64 {
    if runs.is_empty() {
        return f64::NAN;
    }
    let n = runs.len() as f64;
    let twos = runs.iter().filter(|&&r| r == 2).count() as f64;
    let ones = runs.iter().filter(|&&r| r == 1).count() as f64;
    (twos - ones) / n
}

/// `SB_BinaryStats`: statistics on the stretches of 0s and 1s of a binary
/// symbolisation.
///
/// `pupstat2` is the ratio of 1s in the second half to 1s in the first.
/// Without stretches of a symbol its long/mean statistics are 0 and its
/// standard deviations NaN.
pub fn binary_stats(y: &[f64], method: BinarizeMethod) -> FeatureRecord {
    let bits = binarize(y, method);
    let n = bits.len() as f64;
    let half = bits.len() / 2;

    let ones = |s: &[u8]| s.iter().filter(|&&b| b == 1).count() as f64;
    let mut out = FeatureRecord::with_capacity(18);
    out.insert("pupstat2", ones(&bits[half..]) / ones(&bits[..half]));

    let runs0 = run_lengths(&bits, 0);
    let runs1 = run_lengths(&bits, 1);
    out.insert("pstretch1", runs1.len() as f64 / n);

    let s0 = StretchStats::of(&runs0);
    let s1 = StretchStats::of(&runs1);
    for (label, s) in [("0", &s0), ("1", &s1)] {
        out.insert(format!("longstretch{label}"), s.long);
        out.insert(format!("longstretch{label}norm"), s.long / n);
        out.insert(format!("meanstretch{label}"), s.mean);
        out.insert(format!("meanstretch{label}norm"), s.mean / n);
        out.insert(format!("stdstretch{label}"), s.std);
        out.insert(format!("stdstretch{label}norm"), s.std / n);
    }

    out.insert("meanstretchdiff", (s1.mean - s0.mean) / n);
    out.insert("stdstretchdiff", (s1.std - s0.std) / n);
    out.insert("diff21stretch1", diff21(&runs1));
    out.insert("diff21stretch0", diff21(&runs0));
    out
}

/// Symbol whose positions [`binary_stretch`] follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stretch {
    /// `"lseq1"`.
    #[default]
    Ones,
    /// `"lseq0"`.
    Zeros,
}

impl FromStr for Stretch {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lseq1" => Ok(Stretch::Ones),
            "lseq0" => Ok(Stretch::Zeros),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown stretch '{other}'"
            ))),
        }
    }
}

/// `SB_BinaryStretch`: longest alternation of clustered and isolated
/// occurrences of a symbol, as a proportion of the length.
///
/// The series is binarised by sign (`y > 0` is 1). Gaps between successive
/// positions of the chosen symbol are marked adjacent (gap 1) or separated;
/// the result is the longest distance between two switches of that mark,
/// divided by `N`. Fewer than two switches give 0.
pub fn binary_stretch(y: &[f64], what: Stretch) -> f64 {
    let symbol = match what {
        Stretch::Ones => true,
        Stretch::Zeros => false,
    };
    let positions: Vec<f64> = y
        .iter()
        .enumerate()
        .filter(|&(_, &v)| (v > 0.0) == symbol)
        .map(|(i, _)| i as f64)
        .collect();
    let gaps: Vec<f64> = positions.windows(2).map(|w| w[1] - w[0] - 1.5).collect();
    let switches = sign_change_indices(&gaps);
    switches
        .windows(2)
        .map(|w| w[1] - w[0])
        .max()
        .map_or(0.0, |longest| longest as f64 / y.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn runs() {
        let bits = [1, 1, 0, 1, 0, 0, 0, 1];
        assert_eq!(run_lengths(&bits, 1), vec![2, 1, 1]);
        assert_eq!(run_lengths(&bits, 0), vec![1, 3]);
        assert!(run_lengths(&[], 0).is_empty());
    }

    #[test]
    fn stats_of_known_sequence() {
        // binarised by mean: 1 1 0 1 0 0 0 1
        let y = [2.0, 2.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0];
        let rec = binary_stats(&y, BinarizeMethod::Mean);
        assert_eq!(rec.len(), 18);
        assert_relative_eq!(rec["pupstat2"], 1.0 / 3.0);
        assert_relative_eq!(rec["pstretch1"], 3.0 / 8.0);
        assert_relative_eq!(rec["longstretch0"], 3.0);
        assert_relative_eq!(rec["meanstretch0"], 2.0);
        assert_relative_eq!(rec["meanstretch1"], 4.0 / 3.0);
        assert_relative_eq!(rec["diff21stretch1"], -1.0 / 3.0);
        assert_relative_eq!(rec["diff21stretch0"], -0.5);
        assert_relative_eq!(
            rec["meanstretchdiff"],
            (4.0 / 3.0 - 2.0) / 8.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn monotone_series_has_no_zero_stretches() {
        let y: Vec<f64> = (0..20).map(f64::from).collect();
        let rec = binary_stats(&y, BinarizeMethod::Diff);
        assert_eq!(rec["longstretch0"], 0.0);
        assert!(rec["stdstretch0"].is_nan());
        assert!(rec["stdstretch0norm"].is_nan());
        assert_relative_eq!(rec["longstretch1"], 19.0);
        assert!(rec["diff21stretch0"].is_nan());
    }

    #[test]
    fn stretch_between_switches() {
        // ones at 0, 1, 2, 5, 7, 8, 9, 10: gaps 1 1 3 2 1 1 1
        let y = [1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, -1.0];
        // switches after gap index 1 and 3, so the longest is 2
        assert_relative_eq!(binary_stretch(&y, Stretch::Ones), 2.0 / 12.0);
        // zeros at 3, 4, 6, 11: gaps 1 2 5, a single switch
        assert_eq!(binary_stretch(&y, Stretch::Zeros), 0.0);
    }

    #[test]
    fn stretch_binarises_by_sign() {
        let y = [0.0; 10];
        assert_eq!(binary_stretch(&y, Stretch::Ones), 0.0);
        assert_eq!("lseq0".parse::<Stretch>().unwrap(), Stretch::Zeros);
        assert!("lseq2".parse::<Stretch>().is_err());
    }
}
