//! Partial autocorrelation.

use std::str::FromStr;

use crate::core::FeatureRecord;
use crate::error::{HctsaError, Result};
use crate::utils::ols::least_squares;
use crate::utils::stats::mean;

/// Partial autocorrelation estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacfMethod {
    /// Last coefficient of an autoregression with intercept, fitted on all
    /// available observations for each order.
    #[default]
    Ols,
    /// Durbin-Levinson recursion on the unbiased (`1/(N-k)`) autocovariances.
    YuleWalker,
}

impl FromStr for PacfMethod {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ols" => Ok(PacfMethod::Ols),
            "yule_walker" | "yw" => Ok(PacfMethod::YuleWalker),
            other => Err(HctsaError::InvalidParameter(format!(
                "invalid partial autocorrelation method '{other}', use 'ols' or 'yule_walker'"
            ))),
        }
    }
}

/// Partial autocorrelations at lags `1..=max_tau`, keyed `pac_1 ... pac_K`.
///
/// Lags that cannot be estimated from the data are NaN.
///
/// # Errors
/// `InvalidParameter` if `max_tau` is zero.
pub fn partial_autocorr(y: &[f64], max_tau: usize, method: PacfMethod) -> Result<FeatureRecord> {
    if max_tau == 0 {
        return Err(HctsaError::InvalidParameter(
            "partial autocorrelation needs a positive maximum lag".into(),
        ));
    }
    let values = match method {
        PacfMethod::Ols => pacf_ols(y, max_tau),
        PacfMethod::YuleWalker => pacf_yule_walker(y, max_tau),
    };
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (format!("pac_{}", i + 1), v))
        .collect())
}

fn pacf_ols(y: &[f64], max_tau: usize) -> Vec<f64> {
    let n = y.len();
    (1..=max_tau)
        .map(|k| {
            if n <= 2 * k {
                return f64::NAN;
            }
            let target = &y[k..];
            let mut columns = vec![vec![1.0; n - k]];
            for lag in 1..=k {
                columns.push(y[k - lag..n - lag].to_vec());
            }
            least_squares(&columns, target).map_or(f64::NAN, |beta| beta[k])
        })
        .collect()
}

fn pacf_yule_walker(y: &[f64], max_tau: usize) -> Vec<f64> {
    let n = y.len();
    let mut out = vec![f64::NAN; max_tau];
    if n <= max_tau + 1 {
        return out;
    }
    let m = mean(y);
    let d: Vec<f64> = y.iter().map(|v| v - m).collect();
    let acov: Vec<f64> = (0..=max_tau)
        .map(|k| d.iter().zip(d[k..].iter()).map(|(a, b)| a * b).sum::<f64>() / (n - k) as f64)
        .collect();
    if acov[0] <= 0.0 {
        return out;
    }
    let r: Vec<f64> = acov.iter().map(|c| c / acov[0]).collect();

    // Durbin-Levinson recursion
    let mut phi = vec![0.0; max_tau + 1];
    let mut prev = vec![0.0; max_tau + 1];
    phi[1] = r[1];
    out[0] = r[1];
    for k in 2..=max_tau {
        prev[..k].copy_from_slice(&phi[..k]);
        let num = r[k] - (1..k).map(|j| prev[j] * r[k - j]).sum::<f64>();
        let denom = 1.0 - (1..k).map(|j| prev[j] * r[j]).sum::<f64>();
        if denom.abs() < 1e-12 {
            break;
        }
        phi[k] = num / denom;
        for j in 1..k {
            phi[j] = prev[j] - phi[k] * prev[k - j];
        }
        out[k - 1] = phi[k];
    }
    out
}
