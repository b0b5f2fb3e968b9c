//! Maximum-likelihood fits of continuous distribution families.
//!
//! Closed-form estimators are used where they exist; the remaining
//! families minimise the negative log-likelihood with Nelder-Mead over
//! log-transformed parameters, started from moment estimates.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use statrs::distribution::{
    Beta, Continuous, ContinuousCDF, Exp, Gamma, LogNormal, Normal, Uniform, Weibull,
};

use crate::error::{HctsaError, Result};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{max, mean, min, std_pop, variance_pop};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// A fitted distribution: the collaborator goodness-of-fit tests talk to.
pub trait DistributionFit {
    /// Fitted parameters in the family's conventional order.
    fn params(&self) -> &[f64];

    fn logpdf(&self, x: f64) -> f64;

    fn cdf(&self, x: f64) -> f64;

    fn num_params(&self) -> usize {
        self.params().len()
    }

    /// Sum of `logpdf` over `data`.
    fn log_likelihood(&self, data: &[f64]) -> f64 {
        data.iter().map(|&x| self.logpdf(x)).sum()
    }
}

/// Distribution families that can be fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Normal,
    /// Minimum extreme value (left-skewed Gumbel).
    ExtremeValue,
    Uniform,
    Beta,
    Rayleigh,
    Exponential,
    Gamma,
    LogNormal,
    Weibull,
}

impl FromStr for Family {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "norm" => Ok(Family::Normal),
            "ev" => Ok(Family::ExtremeValue),
            "uni" => Ok(Family::Uniform),
            "beta" => Ok(Family::Beta),
            "rayleigh" => Ok(Family::Rayleigh),
            "exp" => Ok(Family::Exponential),
            "gamma" => Ok(Family::Gamma),
            "logn" => Ok(Family::LogNormal),
            "wbl" => Ok(Family::Weibull),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown distribution family '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Normal => "norm",
            Family::ExtremeValue => "ev",
            Family::Uniform => "uni",
            Family::Beta => "beta",
            Family::Rayleigh => "rayleigh",
            Family::Exponential => "exp",
            Family::Gamma => "gamma",
            Family::LogNormal => "logn",
            Family::Weibull => "wbl",
        };
        write!(f, "{name}")
    }
}

struct StatrsFit<D> {
    dist: D,
    params: Vec<f64>,
}

impl<D> DistributionFit for StatrsFit<D>
where
    D: Continuous<f64, f64> + ContinuousCDF<f64, f64>,
{
    fn params(&self) -> &[f64] {
        &self.params
    }

    fn logpdf(&self, x: f64) -> f64 {
        self.dist.ln_pdf(x)
    }

    fn cdf(&self, x: f64) -> f64 {
        self.dist.cdf(x)
    }
}

fn boxed<D>(dist: D, params: Vec<f64>) -> Box<dyn DistributionFit>
where
    D: Continuous<f64, f64> + ContinuousCDF<f64, f64> + 'static,
{
    Box::new(StatrsFit { dist, params })
}

/// Rayleigh distribution with scale `sigma`.
struct Rayleigh {
    params: [f64; 1],
}

impl DistributionFit for Rayleigh {
    fn params(&self) -> &[f64] {
        &self.params
    }

    fn logpdf(&self, x: f64) -> f64 {
        let s2 = self.params[0] * self.params[0];
        if x < 0.0 {
            return f64::NEG_INFINITY;
        }
        x.ln() - s2.ln() - x * x / (2.0 * s2)
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        let s = self.params[0];
        1.0 - (-x * x / (2.0 * s * s)).exp()
    }
}

/// Minimum extreme value distribution with location `mu` and scale `beta`.
struct MinGumbel {
    params: [f64; 2],
}

impl DistributionFit for MinGumbel {
    fn params(&self) -> &[f64] {
        &self.params
    }

    fn logpdf(&self, x: f64) -> f64 {
        let [mu, beta] = self.params;
        let z = (x - mu) / beta;
        z - z.exp() - beta.ln()
    }

    fn cdf(&self, x: f64) -> f64 {
        let [mu, beta] = self.params;
        1.0 - (-((x - mu) / beta).exp()).exp()
    }
}

fn min_gumbel_nll(data: &[f64], mu: f64, beta: f64) -> f64 {
    if beta.is_nan() || beta <= 0.0 || beta.is_infinite() {
        return f64::INFINITY;
    }
    -MinGumbel { params: [mu, beta] }.log_likelihood(data)
}

fn statrs_nll<D, E>(data: &[f64], dist: std::result::Result<D, E>) -> f64
where
    D: Continuous<f64, f64>,
{
    match dist {
        Ok(d) => {
            let ll: f64 = data.iter().map(|&x| d.ln_pdf(x)).sum();
            if ll.is_finite() {
                -ll
            } else {
                f64::INFINITY
            }
        }
        Err(_) => f64::INFINITY,
    }
}

/// Minimise `nll` over two log-scale parameters from `start`.
fn minimise_log2(start: [f64; 2], nll: impl Fn(f64, f64) -> f64) -> Option<[f64; 2]> {
    let initial = [start[0].ln(), start[1].ln()];
    if initial.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let result = nelder_mead(
        |p| nll(p[0].exp(), p[1].exp()),
        &initial,
        NelderMeadConfig::default(),
    );
    result
        .optimal_value
        .is_finite()
        .then(|| [result.optimal_point[0].exp(), result.optimal_point[1].exp()])
}

impl Family {
    /// Whether every value lies in the family's support.
    fn supports(&self, data: &[f64]) -> bool {
        match self {
            Family::Normal | Family::ExtremeValue | Family::Uniform => true,
            Family::Beta => data.iter().all(|&x| x > 0.0 && x < 1.0),
            Family::Rayleigh | Family::Exponential => data.iter().all(|&x| x >= 0.0),
            Family::Gamma | Family::LogNormal | Family::Weibull => data.iter().all(|&x| x > 0.0),
        }
    }

    /// Maximum-likelihood fit of the family to `data`.
    ///
    /// Returns `None` when the data lie outside the support, are degenerate
    /// (zero spread) or the optimiser does not reach a finite likelihood.
    pub fn fit(&self, data: &[f64]) -> Option<Box<dyn DistributionFit>> {
        if data.len() < 2 || !self.supports(data) {
            return None;
        }
        let m = mean(data);
        let sd = std_pop(data);
        if sd.is_nan() || sd <= 0.0 {
            return None;
        }

        match self {
            Family::Normal => Normal::new(m, sd).ok().map(|d| boxed(d, vec![m, sd])),
            Family::Uniform => {
                let (a, b) = (min(data), max(data));
                Uniform::new(a, b).ok().map(|d| boxed(d, vec![a, b]))
            }
            Family::Exponential => {
                let rate = 1.0 / m;
                Exp::new(rate).ok().map(|d| boxed(d, vec![rate]))
            }
            Family::LogNormal => {
                let logs: Vec<f64> = data.iter().map(|x| x.ln()).collect();
                let (mu, sigma) = (mean(&logs), std_pop(&logs));
                LogNormal::new(mu, sigma).ok().map(|d| boxed(d, vec![mu, sigma]))
            }
            Family::Rayleigh => {
                let ss: f64 = data.iter().map(|x| x * x).sum();
                let sigma = (ss / (2.0 * data.len() as f64)).sqrt();
                Some(Box::new(Rayleigh { params: [sigma] }))
            }
            Family::ExtremeValue => {
                let beta0 = sd * 6f64.sqrt() / PI;
                let mu0 = m + EULER_GAMMA * beta0;
                let result = nelder_mead(
                    |p| min_gumbel_nll(data, p[0], p[1].exp()),
                    &[mu0, beta0.ln()],
                    NelderMeadConfig::default(),
                );
                if !result.optimal_value.is_finite() {
                    return None;
                }
                let params = [result.optimal_point[0], result.optimal_point[1].exp()];
                Some(Box::new(MinGumbel { params }))
            }
            Family::Gamma => {
                let var = variance_pop(data);
                let [shape, rate] = minimise_log2([m * m / var, m / var], |k, r| {
                    statrs_nll(data, Gamma::new(k, r))
                })?;
                Gamma::new(shape, rate).ok().map(|d| boxed(d, vec![shape, rate]))
            }
            Family::Weibull => {
                let logs: Vec<f64> = data.iter().map(|x| x.ln()).collect();
                let k0 = 1.2 / std_pop(&logs);
                let scale0 = (mean(&logs) + EULER_GAMMA / k0).exp();
                let [shape, scale] = minimise_log2([k0, scale0], |k, s| {
                    statrs_nll(data, Weibull::new(k, s))
                })?;
                Weibull::new(shape, scale).ok().map(|d| boxed(d, vec![shape, scale]))
            }
            Family::Beta => {
                let var = variance_pop(data);
                let common = m * (1.0 - m) / var - 1.0;
                let [a, b] = minimise_log2([m * common, (1.0 - m) * common], |a, b| {
                    statrs_nll(data, Beta::new(a, b))
                })?;
                Beta::new(a, b).ok().map(|d| boxed(d, vec![a, b]))
            }
        }
    }
}
