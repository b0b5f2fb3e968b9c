//! Robust straight-line regression.
//!
//! Iteratively reweighted least squares with Tukey's biweight norm and a
//! median-absolute-deviation scale, started from the OLS solution.

use super::ols::{least_squares, solve_symmetric};
use super::stats::{mean, median, variance_pop};

/// Tuning constant of the biweight norm (95% Gaussian efficiency).
const TUKEY_C: f64 = 4.685;
/// Consistency constant for the MAD: Φ⁻¹(3/4).
const MAD_NORMAL: f64 = 0.674_489_750_196_081_7;
const MAX_ITER: usize = 50;
const TOLERANCE: f64 = 1e-8;

/// Result of a robust line fit `y ≈ intercept + slope·x`.
#[derive(Debug, Clone)]
pub struct RobustLineFit {
    pub intercept: f64,
    pub slope: f64,
    /// Standard error of the intercept.
    pub se_intercept: f64,
    /// Standard error of the slope.
    pub se_slope: f64,
    /// Final residuals `y - fit`.
    pub residuals: Vec<f64>,
    /// Number of reweighting iterations performed.
    pub iterations: usize,
}

/// Fit a straight line robustly.
///
/// Returns `None` if fewer than three points are given or the design is
/// degenerate (all `x` equal).
pub fn robust_linear_fit(x: &[f64], y: &[f64]) -> Option<RobustLineFit> {
    let n = x.len();
    if n != y.len() || n < 3 {
        return None;
    }
    let design = [vec![1.0; n], x.to_vec()];

    let mut params = least_squares(&design, y)?;
    let mut resid = residuals(x, y, &params);
    let mut scale = mad_about_zero(&resid);
    let mut iterations = 0;

    if scale > 0.0 {
        let mut deviance = total_rho(&resid, scale);
        while iterations < MAX_ITER {
            iterations += 1;
            let weights: Vec<f64> = resid.iter().map(|r| biweight_weight(r / scale)).collect();
            params = match weighted_line(x, y, &weights) {
                Some(p) => p,
                None => break,
            };
            resid = residuals(x, y, &params);
            scale = mad_about_zero(&resid);
            if scale == 0.0 {
                break;
            }
            let next = total_rho(&resid, scale);
            let converged = (next - deviance).abs() < TOLERANCE;
            deviance = next;
            if converged {
                break;
            }
        }
    }

    let (se_intercept, se_slope) = if scale > 0.0 {
        h1_standard_errors(x, &resid, scale)
    } else {
        (0.0, 0.0)
    };

    Some(RobustLineFit {
        intercept: params[0],
        slope: params[1],
        se_intercept,
        se_slope,
        residuals: resid,
        iterations,
    })
}

fn residuals(x: &[f64], y: &[f64], params: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| yi - params[0] - params[1] * xi)
        .collect()
}

fn weighted_line(x: &[f64], y: &[f64], w: &[f64]) -> Option<Vec<f64>> {
    let (mut s0, mut s1, mut s2, mut t0, mut t1) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for ((&xi, &yi), &wi) in x.iter().zip(y.iter()).zip(w.iter()) {
        s0 += wi;
        s1 += wi * xi;
        s2 += wi * xi * xi;
        t0 += wi * yi;
        t1 += wi * xi * yi;
    }
    solve_symmetric(&[vec![s0, s1], vec![s1, s2]], &[t0, t1])
}

fn mad_about_zero(resid: &[f64]) -> f64 {
    let abs: Vec<f64> = resid.iter().map(|r| r.abs()).collect();
    median(&abs) / MAD_NORMAL
}

fn total_rho(resid: &[f64], scale: f64) -> f64 {
    resid.iter().map(|r| biweight_rho(r / scale)).sum()
}

fn biweight_rho(z: f64) -> f64 {
    let c2 = TUKEY_C * TUKEY_C / 6.0;
    if z.abs() <= TUKEY_C {
        let u = 1.0 - (z / TUKEY_C).powi(2);
        c2 * (1.0 - u.powi(3))
    } else {
        c2
    }
}

fn biweight_weight(z: f64) -> f64 {
    if z.abs() <= TUKEY_C {
        (1.0 - (z / TUKEY_C).powi(2)).powi(2)
    } else {
        0.0
    }
}

fn biweight_psi(z: f64) -> f64 {
    z * biweight_weight(z)
}

fn biweight_psi_deriv(z: f64) -> f64 {
    if z.abs() <= TUKEY_C {
        let u = (z / TUKEY_C).powi(2);
        (1.0 - u) * (1.0 - 5.0 * u)
    } else {
        0.0
    }
}

// Huber's H1 sandwich estimate scaled onto the unweighted (X'X)^-1.
fn h1_standard_errors(x: &[f64], resid: &[f64], scale: f64) -> (f64, f64) {
    let n = x.len() as f64;
    let p = 2.0;
    let sresid: Vec<f64> = resid.iter().map(|r| r / scale).collect();
    let deriv: Vec<f64> = sresid.iter().map(|&z| biweight_psi_deriv(z)).collect();
    let m = mean(&deriv);
    if m == 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let k = 1.0 + p / n * variance_pop(&deriv) / (m * m);
    let ss_psi: f64 = sresid.iter().map(|&z| biweight_psi(z).powi(2)).sum();
    let factor = k * k * (ss_psi / (n - p)) * scale * scale / (m * m);

    let s1: f64 = x.iter().sum();
    let s2: f64 = x.iter().map(|v| v * v).sum();
    let det = n * s2 - s1 * s1;
    if det == 0.0 {
        return (f64::NAN, f64::NAN);
    }
    ((factor * s2 / det).sqrt(), (factor * n / det).sqrt())
}
