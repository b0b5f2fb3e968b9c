//! Bin-edge policies.

use std::str::FromStr;

use super::histogram::histogram;
use crate::error::{HctsaError, Result};
use crate::utils::stats::{linspace, max, min, quantiles_hazen, std_dev};

/// Padding added to the outer edges so boundary values fall inside.
const EDGE_PAD: f64 = 0.1;

/// Bin-edge policy for histogram automutual information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmiBinning {
    /// Equal-width bins across the observed range, outer edges padded.
    #[default]
    Even,
    /// Equal-width bins over `[-1, 1]`, widened by one bin on each side the
    /// data exceed.
    Std1,
    /// As `Std1` over `[-2, 2]`.
    Std2,
    /// Equiprobable bins from Hazen quantiles, outer edges padded.
    Quantiles,
    /// "Nice" automatic edges, see [`auto_edges`].
    Auto,
}

impl FromStr for AmiBinning {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "even" => Ok(AmiBinning::Even),
            "std1" => Ok(AmiBinning::Std1),
            "std2" => Ok(AmiBinning::Std2),
            "quantiles" => Ok(AmiBinning::Quantiles),
            "auto" => Ok(AmiBinning::Auto),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown binning method '{other}'"
            ))),
        }
    }
}

/// Bin edges for `y` under `policy`.
///
/// The number of bins of the result can exceed `num_bins` for `Std1` and
/// `Std2` and is data driven for `Auto`.
pub fn ami_bin_edges(y: &[f64], policy: AmiBinning, num_bins: usize) -> Vec<f64> {
    if y.is_empty() {
        return Vec::new();
    }
    match policy {
        AmiBinning::Even => {
            let mut b = linspace(min(y), max(y), num_bins + 1);
            pad_outer(&mut b);
            b
        }
        AmiBinning::Std1 => capped_edges(y, 1.0, num_bins),
        AmiBinning::Std2 => capped_edges(y, 2.0, num_bins),
        AmiBinning::Quantiles => {
            let mut b = quantiles_hazen(y, &linspace(0.0, 1.0, num_bins + 1));
            pad_outer(&mut b);
            b
        }
        AmiBinning::Auto => auto_edges(y),
    }
}

fn pad_outer(b: &mut [f64]) {
    if let Some(first) = b.first_mut() {
        *first -= EDGE_PAD;
    }
    if let Some(last) = b.last_mut() {
        *last += EDGE_PAD;
    }
}

fn capped_edges(y: &[f64], cap: f64, num_bins: usize) -> Vec<f64> {
    let mut b = Vec::with_capacity(num_bins + 3);
    let lo = min(y);
    let hi = max(y);
    if lo < -cap {
        b.push(lo - EDGE_PAD);
    }
    b.extend(linspace(-cap, cap, num_bins + 1));
    if hi > cap {
        b.push(hi + EDGE_PAD);
    }
    b
}

/// Which binner an operation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binner {
    /// Equal-width bins over `[min, max]`, see [`simple_binner`].
    #[default]
    Simple,
    /// "Nice" round-number widths, see [`nice_edges`].
    Nice,
}

impl FromStr for Binner {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(Binner::Simple),
            "nice" | "standard" => Ok(Binner::Nice),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown binner '{other}'"
            ))),
        }
    }
}

impl Binner {
    /// Counts and edges of `x` with (at most) `num_bins` bins.
    pub fn bin(&self, x: &[f64], num_bins: usize) -> (Vec<usize>, Vec<f64>) {
        match self {
            Binner::Simple => simple_binner(x, num_bins),
            Binner::Nice => {
                let edges = nice_edges(x, num_bins);
                (histogram(x, &edges), edges)
            }
        }
    }
}

/// Histogram with `num_bins` equal-width bins spanning `[min, max]`.
///
/// Bins are closed on the left; the last bin is also closed on the right.
pub fn simple_binner(x: &[f64], num_bins: usize) -> (Vec<usize>, Vec<f64>) {
    if x.is_empty() || num_bins == 0 {
        return (vec![0; num_bins], Vec::new());
    }
    let edges = linspace(min(x), max(x), num_bins + 1);
    let mut counts = vec![0usize; num_bins];
    for (i, count) in counts.iter_mut().enumerate() {
        let (lo, hi) = (edges[i], edges[i + 1]);
        *count = if i + 1 < num_bins {
            x.iter().filter(|&&v| v >= lo && v < hi).count()
        } else {
            x.iter().filter(|&&v| v >= lo && v <= hi).count()
        };
    }
    (counts, edges)
}

/// Choose "nice" bin edges for data spanning `[xmin, xmax]`.
///
/// With no bin count the width is rounded to 1, 2, 3, 5 or 10 times a
/// power of ten near `raw_bin_width`; with a bin count the width is refined so that
/// exactly `nbins` bins cover the data. Nearly constant data get
/// half-integer aligned edges.
pub fn binpicker(xmin: f64, xmax: f64, nbins: Option<usize>, raw_bin_width: f64) -> Vec<f64> {
    let xscale = xmin.abs().max(xmax.abs());
    let xrange = xmax - xmin;
    let raw_bin_width = raw_bin_width.max(spacing(xscale));

    let (left_edge, right_edge, bin_width, nbins_actual) =
        if xrange > spacing(xscale).sqrt().max(f64::MIN_POSITIVE) {
            let pow_of_ten = 10f64.powf(raw_bin_width.log10().floor());
            let rel_size = raw_bin_width / pow_of_ten;

            match nbins {
                None => {
                    let bin_width = pow_of_ten
                        * if rel_size < 1.5 {
                            1.0
                        } else if rel_size < 2.5 {
                            2.0
                        } else if rel_size < 4.0 {
                            3.0
                        } else if rel_size < 7.5 {
                            5.0
                        } else {
                            10.0
                        };
                    let left = (bin_width * (xmin / bin_width).floor()).min(xmin).max(-f64::MAX);
                    let count = ((xmax - left) / bin_width).ceil().max(1.0);
                    let right = (left + count * bin_width).max(xmax).min(f64::MAX);
                    (left, right, bin_width, count as usize)
                }
                Some(n) => {
                    let mut bin_width = pow_of_ten * rel_size.floor();
                    let left = (bin_width * (xmin / bin_width).floor()).min(xmin).max(-f64::MAX);
                    if n > 1 {
                        let ll = (xmax - left) / n as f64;
                        let ul = (xmax - left) / (n - 1) as f64;
                        let p10 = 10f64.powf((ul - ll).log10().floor());
                        bin_width = p10 * (ll / p10).ceil();
                    }
                    let right = (left + n as f64 * bin_width).max(xmax).min(f64::MAX);
                    (left, right, bin_width, n)
                }
            }
        } else {
            let n = nbins.unwrap_or(1);
            let bin_range = (n as f64 * spacing(xscale)).ceil().max(1.0);
            let left = (2.0 * (xmin - bin_range / 4.0)).floor() / 2.0;
            let right = (2.0 * (xmax + bin_range / 4.0)).ceil() / 2.0;
            (left, right, (right - left) / n as f64, n)
        };

    if !bin_width.is_finite() {
        return linspace(left_edge, right_edge, nbins_actual + 1);
    }
    let mut edges = Vec::with_capacity(nbins_actual + 1);
    edges.push(left_edge);
    edges.extend((1..nbins_actual).map(|i| left_edge + i as f64 * bin_width));
    edges.push(right_edge);
    edges
}

/// "Nice" edges with a requested bin count.
pub fn nice_edges(x: &[f64], num_bins: usize) -> Vec<f64> {
    if x.is_empty() {
        return (0..=num_bins).map(|i| i as f64).collect();
    }
    let (lo, hi) = (min(x), max(x));
    binpicker(lo, hi, Some(num_bins.max(1)), (hi - lo) / num_bins.max(1) as f64)
}

/// Automatic edges: the integer rule for small-range integer data,
/// otherwise Scott's normal-reference width passed through [`binpicker`].
pub fn auto_edges(x: &[f64]) -> Vec<f64> {
    if x.is_empty() {
        return vec![0.0, 1.0];
    }
    let (lo, hi) = (min(x), max(x));
    let all_integers = x.iter().all(|v| v.fract() == 0.0);
    if all_integers && hi - lo <= 50.0 {
        let count = (hi - lo) as usize + 1;
        return (0..=count).map(|i| lo - 0.5 + i as f64).collect();
    }
    let n = x.len() as f64;
    let sd = if x.len() > 1 { std_dev(x) } else { 0.0 };
    let raw = 3.5 * sd / n.cbrt();
    binpicker(lo, hi, None, raw)
}

/// Distance to the next representable float above `|x|`.
fn spacing(x: f64) -> f64 {
    let a = x.abs();
    if !a.is_finite() {
        return f64::NAN;
    }
    f64::from_bits(a.to_bits() + 1) - a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn even_edges_are_padded() {
        let y = [0.0, 1.0, 2.0, 3.0, 4.0];
        let b = ami_bin_edges(&y, AmiBinning::Even, 4);
        assert_eq!(b.len(), 5);
        assert_relative_eq!(b[0], -0.1);
        assert_relative_eq!(b[1], 1.0);
        assert_relative_eq!(b[4], 4.1);
    }

    #[test]
    fn std_edges_widen_for_outliers() {
        let y = [-3.0, -0.5, 0.0, 0.5, 1.5];
        let b = ami_bin_edges(&y, AmiBinning::Std2, 4);
        // -3 < -2 adds a lower edge, 1.5 < 2 does not add an upper edge
        assert_eq!(b.len(), 6);
        assert_relative_eq!(b[0], -3.1);
        assert_relative_eq!(b[1], -2.0);
        assert_relative_eq!(b[5], 2.0);

        let b1 = ami_bin_edges(&y, AmiBinning::Std1, 2);
        assert_eq!(b1.len(), 5);
        assert_relative_eq!(b1[4], 1.6);
    }

    #[test]
    fn quantile_edges_follow_hazen() {
        let y: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let b = ami_bin_edges(&y, AmiBinning::Quantiles, 2);
        assert_relative_eq!(b[0], 0.9);
        assert_relative_eq!(b[1], 5.5);
        assert_relative_eq!(b[2], 10.1);
    }

    #[test]
    fn simple_binner_includes_maximum() {
        let x = [0.0, 0.5, 1.0, 1.5, 2.0];
        let (counts, edges) = simple_binner(&x, 2);
        assert_eq!(counts, vec![2, 3]);
        assert_eq!(edges, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn binpicker_automatic_nice_widths() {
        // raw width 0.23 -> relative size 2.3 -> width 0.2
        let edges = binpicker(0.05, 0.97, None, 0.23);
        assert_relative_eq!(edges[1] - edges[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(edges[0], 0.0, epsilon = 1e-12);
        assert!(*edges.last().unwrap() >= 0.97);

        // raw width 6 -> relative size 6 -> width 5
        let edges = binpicker(3.0, 41.0, None, 6.0);
        assert_eq!(edges[0], 0.0);
        assert_relative_eq!(edges[1], 5.0);
        assert_relative_eq!(*edges.last().unwrap(), 45.0);
    }

    #[test]
    fn binpicker_with_bin_count() {
        let edges = binpicker(0.0, 10.0, Some(5), 2.0);
        assert_eq!(edges.len(), 6);
        assert_relative_eq!(edges[0], 0.0);
        assert!(*edges.last().unwrap() >= 10.0);
    }

    #[test]
    fn binpicker_constant_data() {
        let edges = binpicker(3.0, 3.0, None, 0.0);
        assert_eq!(edges, vec![2.5, 3.5]);
        let edges = binpicker(3.0, 3.0, Some(2), 0.0);
        assert_eq!(edges, vec![2.5, 3.0, 3.5]);
    }

    #[test]
    fn auto_edges_integer_rule() {
        let x = [1.0, 2.0, 2.0, 3.0, 5.0];
        let edges = auto_edges(&x);
        assert_eq!(edges, vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5]);
    }

    #[test]
    fn auto_edges_cover_continuous_data() {
        let x: Vec<f64> = (0..200).map(|i| (i as f64 * 0.731).sin() * 3.3).collect();
        let edges = auto_edges(&x);
        assert!(edges[0] <= min(&x));
        assert!(*edges.last().unwrap() >= max(&x));
        let counts = histogram(&x, &edges);
        assert_eq!(counts.iter().sum::<usize>(), x.len());
    }

    #[test]
    fn parse_policies() {
        assert_eq!("quantiles".parse::<AmiBinning>().unwrap(), AmiBinning::Quantiles);
        assert!("uniform".parse::<AmiBinning>().is_err());
        assert_eq!("nice".parse::<Binner>().unwrap(), Binner::Nice);
    }
}
