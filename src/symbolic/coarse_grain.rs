//! Coarse-graining of a series to a small alphabet, and binarisation.

use std::str::FromStr;

use crate::core::Lag;
use crate::error::{HctsaError, Result};
use crate::utils::stats::{diff, linspace, mean, median, quantiles_hazen};

/// How a series is mapped to symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoarseGrain {
    /// Equiprobable alphabet of `groups` letters by value.
    Quantile { groups: usize },
    /// Equiprobable alphabet of `groups` letters by increment.
    UpDown { groups: usize },
    /// Quadrant of `(y[i], y[i+tau])` in the two-dimensional embedding.
    Embed2Quadrants { tau: Lag },
    /// Octant of `(y[i], y[i+tau])` in the two-dimensional embedding.
    Embed2Octants { tau: Lag },
}

impl CoarseGrain {
    /// Build from a method name. `groups` is the alphabet size for the
    /// quantile methods and the embedding lag for the embedding methods.
    pub fn from_name(name: &str, groups: usize) -> Result<Self> {
        match name {
            "quantile" => Ok(CoarseGrain::Quantile { groups }),
            "updown" => Ok(CoarseGrain::UpDown { groups }),
            "embed2quadrants" => Ok(CoarseGrain::Embed2Quadrants {
                tau: Lag::Fixed(groups),
            }),
            "embed2octants" => Ok(CoarseGrain::Embed2Octants {
                tau: Lag::Fixed(groups),
            }),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown coarse-graining method '{other}'"
            ))),
        }
    }

    /// Number of distinct symbols this method can produce.
    pub fn alphabet_size(&self) -> usize {
        match self {
            CoarseGrain::Quantile { groups } | CoarseGrain::UpDown { groups } => *groups,
            CoarseGrain::Embed2Quadrants { .. } => 4,
            CoarseGrain::Embed2Octants { .. } => 8,
        }
    }
}

/// Equiprobable symbols `1..=groups` from Hazen quantile thresholds.
fn quantile_symbols(y: &[f64], groups: usize) -> Vec<usize> {
    let mut th = quantiles_hazen(y, &linspace(0.0, 1.0, groups + 1));
    if let Some(first) = th.first_mut() {
        *first -= 1.0;
    }
    y.iter()
        .map(|&v| {
            (0..groups)
                .rev()
                .find(|&i| v > th[i] && v <= th[i + 1])
                .map_or(0, |i| i + 1)
        })
        .collect()
}

fn embedding_pairs(y: &[f64], tau: &Lag) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = y.len();
    let mut tau = tau.resolve(y).ok_or(HctsaError::InsufficientData {
        needed: 2,
        got: n,
    })?;
    if tau as f64 > n as f64 / 25.0 {
        tau = n / 25;
    }
    if tau == 0 {
        return Err(HctsaError::InsufficientData { needed: 25, got: n });
    }
    Ok((y[..n - tau].to_vec(), y[tau..].to_vec()))
}

fn quadrant(m1: f64, m2: f64) -> usize {
    let up = m2 >= 0.0;
    let down = m2 < 0.0;
    if up && m1 >= 0.0 {
        1
    } else if up && m1 < 0.0 {
        2
    } else if down && m1 < 0.0 {
        3
    } else if down && m1 >= 0.0 {
        4
    } else {
        0
    }
}

fn octant(m1: f64, m2: f64) -> usize {
    match quadrant(m1, m2) {
        1 if m2 < m1 => 1,
        1 => 2,
        2 if m2 >= -m1 => 3,
        2 => 4,
        3 if m2 >= m1 => 5,
        3 => 6,
        4 if m2 < -m1 => 7,
        4 => 8,
        _ => 0,
    }
}

/// `SB_CoarseGrain`: symbolise `y` with symbols starting at 1.
///
/// # Errors
/// `InsufficientData` when an embedding lag cannot be resolved or is
/// capped to zero, `InvalidParameter` for zero groups and `ComputationError`
/// when some value could not be assigned a symbol (NaN input) or some
/// symbol of the alphabet never occurs (heavily tied input).
pub fn coarse_grain(y: &[f64], method: CoarseGrain) -> Result<Vec<usize>> {
    if y.is_empty() {
        return Err(HctsaError::EmptyData);
    }
    let symbols = match method {
        CoarseGrain::Quantile { groups } | CoarseGrain::UpDown { groups } if groups == 0 => {
            return Err(HctsaError::InvalidParameter(
                "number of groups must be positive".into(),
            ));
        }
        CoarseGrain::Quantile { groups } => quantile_symbols(y, groups),
        CoarseGrain::UpDown { groups } => quantile_symbols(&diff(y), groups),
        CoarseGrain::Embed2Quadrants { tau } => {
            let (m1, m2) = embedding_pairs(y, &tau)?;
            m1.iter().zip(m2.iter()).map(|(&a, &b)| quadrant(a, b)).collect()
        }
        CoarseGrain::Embed2Octants { tau } => {
            let (m1, m2) = embedding_pairs(y, &tau)?;
            m1.iter().zip(m2.iter()).map(|(&a, &b)| octant(a, b)).collect()
        }
    };
    if symbols.contains(&0) {
        return Err(HctsaError::ComputationError(
            "not every value was assigned to a group".into(),
        ));
    }
    let k = method.alphabet_size();
    let mut seen = vec![false; k];
    for &s in &symbols {
        seen[s - 1] = true;
    }
    if let Some(missing) = seen.iter().position(|&hit| !hit) {
        return Err(HctsaError::ComputationError(format!(
            "symbol {} of {} never occurs in the coarse-grained series",
            missing + 1,
            k
        )));
    }
    Ok(symbols)
}

/// Rule for [`binarize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinarizeMethod {
    /// 1 for an increase, 0 otherwise. One shorter than the input.
    #[default]
    Diff,
    /// 1 above the mean.
    Mean,
    /// 1 above the median.
    Median,
    /// 1 strictly inside the interquartile range.
    Iqr,
}

impl FromStr for BinarizeMethod {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "diff" => Ok(BinarizeMethod::Diff),
            "mean" => Ok(BinarizeMethod::Mean),
            "median" => Ok(BinarizeMethod::Median),
            "iqr" => Ok(BinarizeMethod::Iqr),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown binary transformation setting '{other}'"
            ))),
        }
    }
}

fn step(values: impl Iterator<Item = f64>) -> Vec<u8> {
    values.map(|v| u8::from(v > 0.0)).collect()
}

/// `BF_Binarize`: map `y` to a 0/1 sequence.
pub fn binarize(y: &[f64], method: BinarizeMethod) -> Vec<u8> {
    match method {
        BinarizeMethod::Diff => step(y.windows(2).map(|w| w[1] - w[0])),
        BinarizeMethod::Mean => {
            let m = mean(y);
            step(y.iter().map(|v| v - m))
        }
        BinarizeMethod::Median => {
            let m = median(y);
            step(y.iter().map(|v| v - m))
        }
        BinarizeMethod::Iqr => {
            let q = quantiles_hazen(y, &[0.25, 0.75]);
            y.iter().map(|&v| u8::from(v > q[0] && v < q[1])).collect()
        }
    }
}
