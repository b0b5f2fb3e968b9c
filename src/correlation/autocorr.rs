//! Sample autocorrelation at one, several or all lags.

use std::str::FromStr;

use super::fft::autocorr_fft;
use crate::error::{HctsaError, Result};
use crate::utils::stats::{mean, variance};

/// How the autocorrelation is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcfMethod {
    /// Inverse transform of the power spectrum. Used by every other operation.
    #[default]
    Fourier,
    /// Direct lagged dot product normalised by the total sum of squares.
    /// Agrees with `Fourier` to rounding error.
    TimeDomain,
    /// Mean lagged product over the `N - τ` available pairs divided by the
    /// unbiased variance. Not normalised to agree with the other two.
    TimeDomainStat,
}

impl FromStr for AcfMethod {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Fourier" | "fourier" => Ok(AcfMethod::Fourier),
            "TimeDomain" | "timedomain" => Ok(AcfMethod::TimeDomain),
            "TimeDomainStat" | "timedomainstat" => Ok(AcfMethod::TimeDomainStat),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown autocorrelation method '{other}'"
            ))),
        }
    }
}

/// Which lags to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcfLags {
    Single(usize),
    List(Vec<usize>),
    /// Every lag `0..N`.
    All,
}

/// Autocorrelation of `y` at the requested lags.
///
/// Lag 0 is exactly 1 for any non-constant series. A lag `≥ N` yields NaN
/// (one warning per call). A constant series yields NaN at every lag.
///
/// # Arguments
/// * `y` - Input time series
/// * `lags` - Lags to evaluate
/// * `method` - Estimator
pub fn autocorr(y: &[f64], lags: &AcfLags, method: AcfMethod) -> Vec<f64> {
    let n = y.len();
    let requested: Vec<usize> = match lags {
        AcfLags::Single(tau) => vec![*tau],
        AcfLags::List(taus) => taus.clone(),
        AcfLags::All => (0..n).collect(),
    };

    if requested.iter().any(|&tau| tau >= n) {
        log::warn!(
            "autocorrelation requested at lag >= series length {}; returning NaN there",
            n
        );
    }

    let constant = n == 0 || y.iter().all(|&v| v == y[0]);
    if constant {
        return vec![f64::NAN; requested.len()];
    }

    match method {
        AcfMethod::Fourier => {
            let full = autocorr_fft(y);
            requested
                .iter()
                .map(|&tau| match &full {
                    Some(acf) if tau < n => acf[tau],
                    _ => f64::NAN,
                })
                .collect()
        }
        AcfMethod::TimeDomain => {
            let m = mean(y);
            let denom: f64 = y.iter().map(|v| (v - m).powi(2)).sum();
            requested
                .iter()
                .map(|&tau| match tau {
                    0 => 1.0,
                    t if t < n => lagged_products(y, m, t).sum::<f64>() / denom,
                    _ => f64::NAN,
                })
                .collect()
        }
        AcfMethod::TimeDomainStat => {
            let m = mean(y);
            let var = variance(y);
            requested
                .iter()
                .map(|&tau| match tau {
                    0 => 1.0,
                    t if t < n => lagged_products(y, m, t).sum::<f64>() / (n - t) as f64 / var,
                    _ => f64::NAN,
                })
                .collect()
        }
    }
}

fn lagged_products(y: &[f64], m: f64, tau: usize) -> impl Iterator<Item = f64> + '_ {
    y.iter()
        .zip(y[tau..].iter())
        .map(move |(a, b)| (a - m) * (b - m))
}

/// Autocorrelation at a single lag with the Fourier estimator.
pub fn autocorr_at(y: &[f64], tau: usize) -> f64 {
    autocorr(y, &AcfLags::Single(tau), AcfMethod::Fourier)[0]
}

/// Autocorrelation at every lag with the Fourier estimator.
pub fn acf(y: &[f64]) -> Vec<f64> {
    autocorr(y, &AcfLags::All, AcfMethod::Fourier)
}
