//! Symbolic time lags.

use std::fmt;
use std::str::FromStr;

use crate::correlation::{first_crossing, first_min, Extremum, MinStatistic};
use crate::error::{HctsaError, Result};

/// A time lag, either given directly or derived from the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lag {
    /// A concrete lag.
    Fixed(usize),
    /// First zero crossing of the autocorrelation function (`"ac"` / `"tau"`).
    FirstZeroCrossing,
    /// First minimum of the Gaussian automutual information (`"mi"`).
    FirstMinMutualInfo,
}

impl Lag {
    /// Resolve to a concrete lag for `y`.
    ///
    /// Returns `None` when the lag cannot be derived (constant or too short
    /// series) or when the resolved lag is not smaller than the series length.
    pub fn resolve(&self, y: &[f64]) -> Option<usize> {
        let tau = match self {
            Lag::Fixed(tau) => *tau,
            Lag::FirstZeroCrossing => first_crossing(y, 0.0)?.discrete,
            Lag::FirstMinMutualInfo => {
                let tau = first_min(y, &MinStatistic::MiGaussian, Extremum::Minimum).ok()?;
                if !tau.is_finite() {
                    return None;
                }
                tau as usize
            }
        };
        (tau < y.len()).then_some(tau)
    }

    /// Resolve a delay-embedding lag, which must be positive.
    ///
    /// `Ok(None)` after a warning when the series does not determine a usable
    /// lag (constant, too short, lag beyond the end).
    ///
    /// # Errors
    /// `InvalidParameter` for `Lag::Fixed(0)`.
    pub fn resolve_embedding(&self, y: &[f64], operation: &str) -> Result<Option<usize>> {
        if *self == Lag::Fixed(0) {
            return Err(HctsaError::InvalidParameter(format!(
                "{operation}: embedding lag must be positive"
            )));
        }
        let tau = self.resolve(y).filter(|&t| t > 0);
        if tau.is_none() {
            log::warn!(
                "{}: lag '{}' could not be resolved for a series of length {}",
                operation,
                self,
                y.len()
            );
        }
        Ok(tau)
    }
}

impl Default for Lag {
    fn default() -> Self {
        Lag::Fixed(1)
    }
}

impl From<usize> for Lag {
    fn from(tau: usize) -> Self {
        Lag::Fixed(tau)
    }
}

impl FromStr for Lag {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ac" | "tau" => Ok(Lag::FirstZeroCrossing),
            "mi" => Ok(Lag::FirstMinMutualInfo),
            other => other.parse::<usize>().map(Lag::Fixed).map_err(|_| {
                HctsaError::InvalidParameter(format!("unknown lag specification '{other}'"))
            }),
        }
    }
}

impl fmt::Display for Lag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lag::Fixed(tau) => write!(f, "{tau}"),
            Lag::FirstZeroCrossing => write!(f, "ac"),
            Lag::FirstMinMutualInfo => write!(f, "mi"),
        }
    }
}
