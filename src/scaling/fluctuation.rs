//! Fluctuation analysis of the integrated series across window sizes.

use std::str::FromStr;

use crate::core::{FeatureRecord, FeatureValue};
use crate::correlation::autocorr_at;
use crate::error::{HctsaError, Result};
use crate::transform::make_buffer;
use crate::utils::ols::{linear_residuals, polyfit_residuals};
use crate::utils::robust::robust_linear_fit;
use crate::utils::spline::spline_not_a_knot;
use crate::utils::stats::{cumsum, linspace, max, min, quantile_hazen, std_dev};

/// Smallest window size analysed.
const MIN_TAU: usize = 5;
/// Fewest window sizes a fluctuation function is fitted on.
const MIN_SCALES: usize = 8;
/// Points of the evenly resampled log-log curve for linear spacing.
const RESAMPLED_SCALES: usize = 50;
/// Fewest points on each side of a breakpoint.
const MIN_SEGMENT: usize = 6;

/// Fluctuation measured within each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fluctuation {
    /// The raw integrated values.
    Nothing,
    /// Difference between the last and first value.
    EndPtDiff,
    /// Range of the values.
    Range,
    /// Sample standard deviation.
    Std,
    /// Hazen interquartile range.
    Iqr,
    /// Residuals of a polynomial fit of order `k`.
    Dfa { k: usize },
    /// Range after removing the line joining the end points.
    #[default]
    RsRange,
    /// Range of the residuals of a polynomial fit of order `k`.
    RsRangeFit { k: usize },
}

impl FromStr for Fluctuation {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nothing" => Ok(Fluctuation::Nothing),
            "endptdiff" => Ok(Fluctuation::EndPtDiff),
            "range" => Ok(Fluctuation::Range),
            "std" => Ok(Fluctuation::Std),
            "iqr" => Ok(Fluctuation::Iqr),
            "dfa" => Ok(Fluctuation::Dfa { k: 1 }),
            "rsrange" => Ok(Fluctuation::RsRange),
            "rsrangefit" => Ok(Fluctuation::RsRangeFit { k: 1 }),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown fluctuation analysis method '{other}'"
            ))),
        }
    }
}

impl Fluctuation {
    /// Fluctuation values of one window `w` of the integrated series.
    fn measure(&self, w: &[f64]) -> Vec<f64> {
        let tau = w.len();
        let tt: Vec<f64> = (1..=tau).map(|t| t as f64).collect();
        let span = |v: &[f64]| max(v) - min(v);
        match *self {
            Fluctuation::Nothing => w.to_vec(),
            Fluctuation::EndPtDiff => vec![w[tau - 1] - w[0]],
            Fluctuation::Range => vec![span(w)],
            Fluctuation::Std => vec![std_dev(w)],
            Fluctuation::Iqr => vec![quantile_hazen(w, 0.75) - quantile_hazen(w, 0.25)],
            Fluctuation::Dfa { k } => {
                polyfit_residuals(&tt, w, k).unwrap_or_else(|| vec![f64::NAN; tau])
            }
            Fluctuation::RsRange => {
                let b = w[0];
                let m = w[tau - 1] - b;
                let detrended: Vec<f64> = linspace(0.0, 1.0, tau)
                    .iter()
                    .zip(w.iter())
                    .map(|(s, v)| v - (s * m + b))
                    .collect();
                vec![span(&detrended)]
            }
            Fluctuation::RsRangeFit { k } => match polyfit_residuals(&tt, w, k) {
                Some(res) => vec![span(&res)],
                None => vec![f64::NAN],
            },
        }
    }
}

/// Settings for [`fluct_anal`].
#[derive(Debug, Clone, PartialEq)]
pub struct FluctAnalConfig {
    /// Order of the fluctuation moment.
    pub q: f64,
    pub method: Fluctuation,
    /// Number of log-spaced window sizes, or the step of linear spacing.
    pub tau_step: usize,
    /// Decimation of the series before integration.
    pub lag: Option<usize>,
    /// Log-spaced window sizes when true.
    pub log_inc: bool,
}

impl Default for FluctAnalConfig {
    fn default() -> Self {
        Self {
            q: 2.0,
            method: Fluctuation::RsRange,
            tau_step: 1,
            lag: None,
            log_inc: true,
        }
    }
}

impl FluctAnalConfig {
    pub fn new(method: Fluctuation) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    pub fn with_tau_step(mut self, tau_step: usize) -> Self {
        self.tau_step = tau_step;
        self
    }

    pub fn with_lag(mut self, lag: usize) -> Self {
        self.lag = Some(lag);
        self
    }

    pub fn with_log_inc(mut self, log_inc: bool) -> Self {
        self.log_inc = log_inc;
        self
    }
}

/// Window sizes between 5 and `n/2`.
fn window_sizes(n: usize, tau_step: usize, log_inc: bool) -> Vec<usize> {
    let upper = n / 2;
    if upper < MIN_TAU || tau_step == 0 {
        return Vec::new();
    }
    if log_inc {
        let log_range = if tau_step == 1 {
            vec![(upper as f64).ln()]
        } else {
            linspace((MIN_TAU as f64).ln(), (upper as f64).ln(), tau_step)
        };
        let mut taus: Vec<usize> = log_range.iter().map(|v| v.exp().round() as usize).collect();
        taus.dedup();
        taus
    } else {
        (MIN_TAU..=upper).step_by(tau_step).collect()
    }
}

const FIT_KEYS: [&str; 6] = ["linfitint", "alpha", "se1", "se2", "ssr", "resac1"];

/// Robust line statistics of `y` against `x`, keys prefixed by `prefix`.
fn robust_fit_stats(out: &mut FeatureRecord, x: &[f64], y: &[f64], prefix: &str) {
    let fit = if x.len() < MIN_SCALES || y.iter().all(|v| v.is_nan()) {
        None
    } else {
        robust_linear_fit(x, y)
    };
    let values = match fit {
        Some(fit) => {
            let ssr = fit.residuals.iter().map(|r| r * r).sum::<f64>() / fit.residuals.len() as f64;
            [
                fit.intercept,
                fit.slope,
                fit.se_intercept,
                fit.se_slope,
                ssr,
                autocorr_at(&fit.residuals, 1),
            ]
        }
        None => [f64::NAN; 6],
    };
    for (key, v) in FIT_KEYS.iter().zip(values) {
        out.insert(format!("{prefix}{key}"), v);
    }
}

fn residual_norm(x: &[f64], y: &[f64]) -> f64 {
    linear_residuals(x, y)
        .map(|r| r.iter().map(|v| v * v).sum::<f64>().sqrt())
        .unwrap_or(f64::NAN)
}

/// `SC_FluctAnal`: scaling of the fluctuation function of the integrated
/// series.
///
/// `F(τ) = mean(|f|^q)^(1/q)` over the full windows of size `τ`. The log-log
/// curve is fitted with a robust line over the whole range and, after a
/// search for the breakpoint minimising the summed residual norms of two
/// straight lines, over each side (`r1_`, `r2_` prefixes). Fewer than eight
/// window sizes give a NaN scalar with a warning.
pub fn fluct_anal(x: &[f64], config: &FluctAnalConfig) -> FeatureValue {
    let decimated: Vec<f64>;
    let source = match config.lag {
        Some(lag) if lag > 1 => {
            decimated = x.iter().step_by(lag).copied().collect();
            &decimated[..]
        }
        _ => x,
    };
    let y = cumsum(source);
    let n = y.len();

    let taur = window_sizes(n, config.tau_step, config.log_inc);
    if taur.len() < MIN_SCALES {
        log::warn!(
            "fluctuation analysis: series of length {} gives only {} window sizes",
            n,
            taur.len()
        );
        return FeatureValue::Scalar(f64::NAN);
    }

    let q = config.q;
    let f: Vec<f64> = taur
        .iter()
        .map(|&tau| {
            let fluct: Vec<f64> = make_buffer(&y, tau)
                .into_iter()
                .flat_map(|w| config.method.measure(w))
                .collect();
            let moment = fluct.iter().map(|v| v.abs().powf(q)).sum::<f64>() / fluct.len() as f64;
            moment.powf(1.0 / q)
        })
        .collect();

    let log_tau: Vec<f64> = taur.iter().map(|&t| (t as f64).ln()).collect();
    let log_f: Vec<f64> = f.iter().map(|v| v.ln()).collect();
    let (logtt, logff) = if config.log_inc {
        (log_tau, log_f)
    } else {
        let grid = linspace(log_tau[0], log_tau[log_tau.len() - 1], RESAMPLED_SCALES);
        match spline_not_a_knot(&log_tau, &log_f, &grid) {
            Some(values) => (grid, values),
            None => (grid, vec![f64::NAN; RESAMPLED_SCALES]),
        }
    };
    let num = logtt.len();

    let mut out = FeatureRecord::with_capacity(24);
    robust_fit_stats(&mut out, &logtt, &logff, "");

    let sserr: Vec<(usize, f64)> = if num >= 2 * MIN_SEGMENT {
        (MIN_SEGMENT..=num - MIN_SEGMENT)
            .map(|i| {
                let e = residual_norm(&logtt[..i], &logff[..i])
                    + residual_norm(&logtt[i - 1..], &logff[i - 1..]);
                (i, e)
            })
            .filter(|(_, e)| !e.is_nan())
            .collect()
    } else {
        Vec::new()
    };

    let Some(&(break_pt, min_err)) = sserr
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
    else {
        for key in ["prop_r1", "logtausplit", "ratsplitminerr", "meanssr", "stdssr"] {
            out.insert(key, f64::NAN);
        }
        robust_fit_stats(&mut out, &[], &[], "r1_");
        robust_fit_stats(&mut out, &[], &[], "r2_");
        out.insert("alpharat", f64::NAN);
        return FeatureValue::Record(out);
    };

    let errs: Vec<f64> = sserr.iter().map(|e| e.1).collect();
    out.insert("prop_r1", break_pt as f64 / num as f64);
    out.insert("logtausplit", logtt[break_pt]);
    out.insert("ratsplitminerr", min_err / out["ssr"]);
    out.insert("meanssr", errs.iter().sum::<f64>() / errs.len() as f64);
    out.insert("stdssr", std_dev(&errs));

    robust_fit_stats(&mut out, &logtt[..break_pt], &logff[..break_pt], "r1_");
    robust_fit_stats(&mut out, &logtt[break_pt..], &logff[break_pt..], "r2_");

    let a1 = out["r1_alpha"];
    let a2 = out["r2_alpha"];
    out.insert(
        "alpharat",
        if a1.is_nan() || a2.is_nan() {
            f64::NAN
        } else {
            a1 / a2
        },
    );
    FeatureValue::Record(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn window_size_grids() {
        assert_eq!(window_sizes(40, 3, false), vec![5, 8, 11, 14, 17, 20]);
        let log = window_sizes(1000, 10, true);
        assert_eq!(log[0], 5);
        assert_eq!(*log.last().unwrap(), 500);
        assert!(log.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(window_sizes(1000, 1, true), vec![500]);
        assert!(window_sizes(8, 2, false).is_empty());
    }

    #[test]
    fn too_few_scales_is_nan() {
        let x = noise(1000, 1);
        let out = fluct_anal(&x, &FluctAnalConfig::default());
        assert!(out.as_scalar().unwrap().is_nan());
    }

    #[test]
    fn dfa_of_white_noise_scales_near_half() {
        let x = noise(2000, 5);
        let cfg = FluctAnalConfig::new(Fluctuation::Dfa { k: 1 }).with_tau_step(30);
        let out = fluct_anal(&x, &cfg);
        let rec = out.as_record().unwrap();
        assert_eq!(rec.len(), 24);
        assert!((rec["alpha"] - 0.5).abs() < 0.15, "alpha = {}", rec["alpha"]);
        assert!(rec["prop_r1"] > 0.0 && rec["prop_r1"] < 1.0);
    }

    #[test]
    fn linear_spacing_resamples() {
        let x = noise(400, 9);
        let cfg = FluctAnalConfig::new(Fluctuation::Std)
            .with_tau_step(5)
            .with_log_inc(false);
        let rec = fluct_anal(&x, &cfg);
        let rec = rec.as_record().unwrap();
        assert!(rec["alpha"].is_finite());
        assert!(rec["r1_alpha"].is_finite());
        assert!(rec["r2_alpha"].is_finite());
        assert_relative_eq!(rec["alpharat"], rec["r1_alpha"] / rec["r2_alpha"]);
    }

    #[test]
    fn method_names() {
        assert_eq!("dfa".parse::<Fluctuation>().unwrap(), Fluctuation::Dfa { k: 1 });
        assert_eq!(
            "rsrangefit".parse::<Fluctuation>().unwrap(),
            Fluctuation::RsRangeFit { k: 1 }
        );
        assert!("wavelet".parse::<Fluctuation>().is_err());
    }

    #[test]
    fn window_measures() {
        let w = [1.0, 3.0, 2.0, 6.0];
        assert_eq!(Fluctuation::EndPtDiff.measure(&w), vec![5.0]);
        assert_eq!(Fluctuation::Range.measure(&w), vec![5.0]);
        // line from 1 to 6: 1, 2.667, 4.333, 6 -> residuals 0, 0.333, -2.333, 0
        let rs = Fluctuation::RsRange.measure(&w)[0];
        assert_relative_eq!(rs, 1.0 / 3.0 + 7.0 / 3.0, epsilon = 1e-12);
        let dfa = Fluctuation::Dfa { k: 1 }.measure(&w);
        assert_relative_eq!(dfa.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }
}
