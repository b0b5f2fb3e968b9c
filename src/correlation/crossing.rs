//! Threshold crossings and first extrema of lag-indexed statistics.

use std::str::FromStr;

use super::autocorr::acf;
use crate::binning::AmiBinning;
use crate::core::{FeatureRecord, FeatureValue};
use crate::error::{HctsaError, Result};
use crate::information::{gaussian_ami, histogram_ami_at, EstimatorProvider, MiMethod};

/// Where a sequence first crosses a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// First index on the far side of the threshold.
    pub discrete: usize,
    /// Linearly interpolated crossing point, in `(discrete - 1, discrete]`.
    pub continuous: f64,
}

/// First crossing of `threshold` by `x`.
///
/// The side is fixed by `x[0]`: if it lies above the threshold the first
/// index strictly below is sought, otherwise the first index strictly above.
/// A sequence that never crosses reports `len - 1` for both fields; this
/// "scanned to the end" sentinel is shared by every caller and keeps lags
/// below the series length. Returns `None` for an empty sequence or a NaN
/// first value.
pub fn point_of_crossing(x: &[f64], threshold: f64) -> Option<Crossing> {
    let first = *x.first()?;
    if first.is_nan() {
        return None;
    }
    let above = first > threshold;
    let hit = x.iter().position(|&v| {
        if above {
            v < threshold
        } else {
            v > threshold
        }
    });

    Some(match hit {
        Some(i) => {
            let before = x[i - 1];
            let after = x[i];
            Crossing {
                discrete: i,
                continuous: (i - 1) as f64 + (threshold - before) / (after - before),
            }
        }
        None => Crossing {
            discrete: x.len() - 1,
            continuous: (x.len() - 1) as f64,
        },
    })
}

/// First crossing of `threshold` by the autocorrelation function of `y`.
///
/// Autocorrelation index and lag coincide, so the result is in lag units.
/// Returns `None` when the autocorrelation is undefined (constant series).
pub fn first_crossing(y: &[f64], threshold: f64) -> Option<Crossing> {
    let r = acf(y);
    if r.first().map_or(true, |v| v.is_nan()) {
        return None;
    }
    point_of_crossing(&r, threshold)
}

/// Self-correlation function scanned for a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationFn {
    /// Linear autocorrelation (`"ac"`).
    #[default]
    Autocorrelation,
}

impl FromStr for CorrelationFn {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ac" => Ok(CorrelationFn::Autocorrelation),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown correlation function '{other}'"
            ))),
        }
    }
}

/// Output form of [`co_first_crossing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossingOutput {
    Discrete,
    Continuous,
    #[default]
    Both,
}

impl FromStr for CrossingOutput {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "discrete" => Ok(CrossingOutput::Discrete),
            "continuous" => Ok(CrossingOutput::Continuous),
            "both" => Ok(CrossingOutput::Both),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown crossing output '{other}'"
            ))),
        }
    }
}

/// First crossing of a self-correlation function across a threshold.
///
/// `Both` returns a record with keys `firstCrossing` and `pointOfCrossing`.
/// An undefined correlation function gives NaN.
pub fn co_first_crossing(
    y: &[f64],
    corr: CorrelationFn,
    threshold: f64,
    output: CrossingOutput,
) -> FeatureValue {
    let crossing = match corr {
        CorrelationFn::Autocorrelation => first_crossing(y, threshold),
    };
    let (discrete, continuous) = match crossing {
        Some(c) => (c.discrete as f64, c.continuous),
        None => (f64::NAN, f64::NAN),
    };
    match output {
        CrossingOutput::Discrete => FeatureValue::Scalar(discrete),
        CrossingOutput::Continuous => FeatureValue::Scalar(continuous),
        CrossingOutput::Both => {
            let mut out = FeatureRecord::with_capacity(2);
            out.insert("firstCrossing", discrete);
            out.insert("pointOfCrossing", continuous);
            FeatureValue::Record(out)
        }
    }
}

/// Statistic scanned by [`first_min`].
#[derive(Clone, Copy)]
pub enum MinStatistic<'a> {
    /// Linear autocorrelation (`"ac"`, `"corr"`).
    Autocorrelation,
    /// Closed-form Gaussian automutual information (`"mi"`, `"mi-gaussian"`).
    MiGaussian,
    /// Histogram automutual information (`"mi-hist"`).
    MiHistogram { binning: AmiBinning, num_bins: usize },
    /// Automutual information from an external estimator.
    External {
        provider: &'a dyn EstimatorProvider,
        method: MiMethod,
    },
}

impl std::fmt::Debug for MinStatistic<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MinStatistic::Autocorrelation => write!(f, "Autocorrelation"),
            MinStatistic::MiGaussian => write!(f, "MiGaussian"),
            MinStatistic::MiHistogram { binning, num_bins } => f
                .debug_struct("MiHistogram")
                .field("binning", binning)
                .field("num_bins", num_bins)
                .finish(),
            MinStatistic::External { method, .. } => {
                f.debug_struct("External").field("method", method).finish()
            }
        }
    }
}

impl FromStr for MinStatistic<'static> {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ac" | "corr" => Ok(MinStatistic::Autocorrelation),
            "mi" | "mi-gaussian" => Ok(MinStatistic::MiGaussian),
            "mi-hist" => Ok(MinStatistic::MiHistogram {
                binning: AmiBinning::Even,
                num_bins: 10,
            }),
            "mi-kernel" | "mi-kraskov1" | "mi-kraskov2" => Err(HctsaError::InvalidParameter(
                format!("'{s}' needs an external estimator provider"),
            )),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown correlation type '{other}'"
            ))),
        }
    }
}

/// Which kind of extremum [`first_min`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extremum {
    #[default]
    Minimum,
    Maximum,
}

/// Lag of the first local minimum (or maximum) of a self-correlation function.
///
/// The statistic is evaluated at lags `1, 2, ...`. Because lag 0 is maximal,
/// a rise from lag 1 to lag 2 places the minimum at lag 1. Afterwards a
/// minimum at lag `i-1` is reported when `f(i-2) > f(i-1) < f(i)`.
/// Maxima use only the three-point rule.
/// A NaN encountered first is warned about and gives NaN. When no extremum
/// exists `N - 1` is returned, matching the crossing sentinel.
///
/// # Errors
/// Only failures of an external estimator are returned as errors.
pub fn first_min(y: &[f64], what: &MinStatistic<'_>, extremum: Extremum) -> Result<f64> {
    let n = y.len();
    if n < 2 {
        log::warn!("first minimum: series of length {} is too short", n);
        return Ok(f64::NAN);
    }

    let full_acf = match what {
        MinStatistic::Autocorrelation => Some(acf(y)),
        _ => None,
    };
    let statistic = |lag: usize| -> Result<f64> {
        match what {
            MinStatistic::Autocorrelation => Ok(full_acf.as_ref().map_or(f64::NAN, |r| r[lag])),
            MinStatistic::MiGaussian => Ok(gaussian_ami(y, lag)),
            MinStatistic::MiHistogram { binning, num_bins } => {
                Ok(histogram_ami_at(y, lag, *binning, *num_bins))
            }
            MinStatistic::External { provider, method } => {
                let mut estimator = provider.initialize(*method, 3, false)?;
                estimator.set_observations(&y[..n - lag], &y[lag..])?;
                estimator.compute()
            }
        }
    };

    let is_extremum = |prev: f64, mid: f64, next: f64| match extremum {
        Extremum::Minimum => prev > mid && mid < next,
        Extremum::Maximum => prev < mid && mid > next,
    };

    let mut values: Vec<f64> = Vec::with_capacity(n - 1);
    for lag in 1..n {
        let v = statistic(lag)?;
        if v.is_nan() {
            log::warn!(
                "first minimum: statistic undefined at lag {} before an extremum was found",
                lag
            );
            return Ok(f64::NAN);
        }
        values.push(v);
        let i = values.len();
        // lag 0 is the global maximum, so only a minimum can sit at lag 1
        if i == 2 && extremum == Extremum::Minimum && values[1] > values[0] {
            return Ok(1.0);
        } else if i > 2 && is_extremum(values[i - 3], values[i - 2], values[i - 1]) {
            return Ok((i - 1) as f64);
        }
    }
    Ok((n - 1) as f64)
}
