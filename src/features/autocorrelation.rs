//! Nonlinear autocorrelations and the shape of the autocorrelation function.

use std::str::FromStr;

use crate::core::{FeatureRecord, Lag};
use crate::correlation::{acf, autocorr_at, first_crossing};
use crate::error::{HctsaError, Result};
use crate::transform::sign_change_indices;
use crate::utils::optimization::curve_fit;
use crate::utils::stats::{diff, mean, std_dev};

pub use crate::correlation::{partial_autocorr, PacfMethod};

const NONLINEAR_KEYS: [&str; 5] = ["raw", "abs", "num", "absnum", "denom"];

fn nonlinear_record(num: f64, denom: f64) -> FeatureRecord {
    let raw = num / denom;
    NONLINEAR_KEYS
        .iter()
        .zip([raw, raw.abs(), num, num.abs(), denom])
        .map(|(k, v)| (*k, v))
        .collect()
}

/// `CO_trev`: time-reversal asymmetry at lag `tau`.
///
/// `raw = mean(d³) / mean(d²)^{3/2}` with `d = y[t+τ] - y[t]`; the record
/// also carries `abs`, `num`, `absnum` and `denom`.
///
/// A lag the series cannot resolve gives a NaN record.
///
/// # Errors
/// `InvalidParameter` for a zero lag.
pub fn trev(y: &[f64], tau: Lag) -> Result<FeatureRecord> {
    let Some(tau) = tau.resolve_embedding(y, "trev")? else {
        return Ok(FeatureRecord::nan_filled(&NONLINEAR_KEYS));
    };
    let d: Vec<f64> = y[tau..].iter().zip(y.iter()).map(|(a, b)| a - b).collect();
    let num = mean(&d.iter().map(|v| v.powi(3)).collect::<Vec<_>>());
    let denom = mean(&d.iter().map(|v| v * v).collect::<Vec<_>>()).powf(1.5);
    Ok(nonlinear_record(num, denom))
}

/// `CO_tc3`: third-order autocorrelation at lags `τ` and `2τ`, normalised
/// by `|mean(y[t]·y[t+τ])|^{3/2}`.
///
/// # Errors
/// `InvalidParameter` for a zero lag.
pub fn tc3(y: &[f64], tau: Lag) -> Result<FeatureRecord> {
    let Some(tau) = tau.resolve_embedding(y, "tc3")? else {
        return Ok(FeatureRecord::nan_filled(&NONLINEAR_KEYS));
    };
    let n = y.len();
    if 2 * tau >= n {
        log::warn!("tc3: lag {} leaves no triples in a series of length {}", tau, n);
        return Ok(FeatureRecord::nan_filled(&NONLINEAR_KEYS));
    }
    let m = n - 2 * tau;
    let num = (0..m).map(|i| y[i] * y[i + tau] * y[i + 2 * tau]).sum::<f64>() / m as f64;
    let denom = ((0..m).map(|i| y[i] * y[i + tau]).sum::<f64>() / m as f64)
        .abs()
        .powf(1.5);
    Ok(nonlinear_record(num, denom))
}

fn glscf_at(y: &[f64], alpha: f64, beta: f64, tau: usize) -> f64 {
    let n = y.len();
    if tau == 0 || tau >= n {
        return f64::NAN;
    }
    let y1: Vec<f64> = y[..n - tau].iter().map(|v| v.abs().powf(alpha)).collect();
    let y2: Vec<f64> = y[tau..].iter().map(|v| v.abs().powf(beta)).collect();
    let (m1, m2) = (mean(&y1), mean(&y2));
    let joint = y1.iter().zip(&y2).map(|(a, b)| a * b).sum::<f64>() / y1.len() as f64;
    let s1 = (y1.iter().map(|v| v * v).sum::<f64>() / y1.len() as f64 - m1 * m1).sqrt();
    let s2 = (y2.iter().map(|v| v * v).sum::<f64>() / y2.len() as f64 - m2 * m2).sqrt();
    (joint - m1 * m2) / (s1 * s2)
}

fn check_exponents(alpha: f64, beta: f64) -> Result<()> {
    if alpha == 0.0 || beta == 0.0 || !alpha.is_finite() || !beta.is_finite() {
        return Err(HctsaError::InvalidParameter(format!(
            "magnitude exponents must be finite and nonzero, got alpha = {alpha}, beta = {beta}"
        )));
    }
    Ok(())
}

/// `CO_glscf`: generalised linear self-correlation of magnitudes.
///
/// With `a = |y[t]|^α` and `b = |y[t+τ]|^β` this is
/// `(⟨ab⟩ - ⟨a⟩⟨b⟩) / (σ_a·σ_b)` using population deviations
/// (Queirós & Moyano, Physica A 383, 2007). NaN when either magnitude
/// series has no variance or the lag cannot be resolved.
///
/// # Errors
/// `InvalidParameter` for a zero exponent or a zero lag.
pub fn glscf(y: &[f64], alpha: f64, beta: f64, tau: Lag) -> Result<f64> {
    check_exponents(alpha, beta)?;
    let Some(tau) = tau.resolve_embedding(y, "glscf")? else {
        return Ok(f64::NAN);
    };
    let g = glscf_at(y, alpha, beta, tau);
    if g.is_nan() {
        log::warn!("glscf: magnitudes at lag {} have no variance", tau);
    }
    Ok(g)
}

/// `CO_fzcglscf`: first zero crossing of [`glscf`] over `τ = 1..=max_tau`.
///
/// At the first sign change between `τ - 1` and `τ` the crossing is placed
/// at `τ - 1 + g(τ)/(g(τ) - g(τ-1))`. `max_tau` defaults to the series
/// length and is returned when no crossing occurs.
///
/// # Errors
/// `InvalidParameter` for a zero exponent.
pub fn fzcglscf(y: &[f64], alpha: f64, beta: f64, max_tau: Option<usize>) -> Result<f64> {
    check_exponents(alpha, beta)?;
    let max_tau = max_tau.unwrap_or(y.len());
    let mut previous = f64::NAN;
    for tau in 1..=max_tau.min(y.len().saturating_sub(1)) {
        let g = glscf_at(y, alpha, beta, tau);
        if g * previous < 0.0 {
            return Ok((tau - 1) as f64 + g / (g - previous));
        }
        previous = g;
    }
    Ok(max_tau as f64)
}

/// `CO_NonlinearAutoCorr`: mean of `y[t]·Π y[t - τ_i]` over the lags.
///
/// Lags may repeat (`[1, 1, 3]` gives `⟨y_t·y_{t-1}²·y_{t-3}⟩`) and include
/// 0. The absolute value is taken before averaging when `do_abs` is set;
/// by default for an even number of lags, i.e. an odd-order product.
/// Intended for z-scored input. NaN when the largest lag reaches the end of
/// the series.
///
/// # Errors
/// `InvalidParameter` for an empty list of lags.
pub fn nonlinear_autocorr(y: &[f64], taus: &[usize], do_abs: Option<bool>) -> Result<f64> {
    let Some(&tmax) = taus.iter().max() else {
        return Err(HctsaError::InvalidParameter(
            "nonlinear autocorrelation needs at least one lag".into(),
        ));
    };
    let n = y.len();
    if tmax >= n {
        log::warn!(
            "nonlinear autocorrelation: lag {} leaves no products in a series of length {}",
            tmax,
            n
        );
        return Ok(f64::NAN);
    }
    let do_abs = do_abs.unwrap_or(taus.len() % 2 == 0);
    let products: Vec<f64> = (tmax..n)
        .map(|t| {
            let p = taus.iter().fold(y[t], |acc, &tau| acc * y[t - tau]);
            if do_abs {
                p.abs()
            } else {
                p
            }
        })
        .collect();
    Ok(mean(&products))
}

/// How far along the autocorrelation function [`autocorr_shape`] looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopWhen {
    /// Up to the first lag below `2/√N`, keeping only positive values.
    #[default]
    PosDrown,
    /// Up to and including the first lag with `|r| < 2/√N`.
    Drown,
    /// Up to twice the last lag seen with `|r| < 2/√N`.
    DoubleDrown,
    /// Lags `0..=k`.
    Lag(usize),
}

impl FromStr for StopWhen {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "posDrown" => Ok(StopWhen::PosDrown),
            "drown" => Ok(StopWhen::Drown),
            "doubleDrown" => Ok(StopWhen::DoubleDrown),
            other => other.parse::<usize>().map(StopWhen::Lag).map_err(|_| {
                HctsaError::InvalidParameter(format!("unknown ACF decay criterion '{other}'"))
            }),
        }
    }
}

fn shape_keys(stop: StopWhen) -> Vec<&'static str> {
    let mut keys = vec!["Nac", "sumacf", "meanacf"];
    if stop != StopWhen::PosDrown {
        keys.extend(["meanabsacf", "sumabsacf"]);
    }
    keys.extend([
        "ac1",
        "actau",
        "nminima",
        "meanminima",
        "nmaxima",
        "meanmaxima",
        "nextrema",
        "pextrema",
        "decayTimescale",
        "fexpacf_r2",
        "fexpacf_stdres",
    ]);
    keys
}

/// Truncate the autocorrelation function according to `stop`.
///
/// Returns the retained values and the "drown" lag.
fn truncated_acf(full: &[f64], stop: StopWhen) -> (Vec<f64>, usize) {
    let n = full.len();
    let th = 2.0 / (n as f64).sqrt();
    let mut kept = Vec::new();
    let mut drown = 0;
    match stop {
        StopWhen::Lag(k) => {
            kept = (0..=k).map(|t| full.get(t).copied().unwrap_or(f64::NAN)).collect();
            drown = k;
        }
        StopWhen::PosDrown => {
            for (i, &r) in full.iter().enumerate() {
                if r < th {
                    if r > 0.0 {
                        drown = i + 1;
                        kept.push(r);
                    } else {
                        drown = i;
                    }
                    break;
                }
                kept.push(r);
            }
        }
        StopWhen::Drown => {
            for (i, &r) in full.iter().enumerate() {
                kept.push(r);
                if r.abs() < th {
                    drown = i + 1;
                    break;
                }
            }
        }
        StopWhen::DoubleDrown => {
            for (i, &r) in full.iter().enumerate() {
                let step = i + 1;
                if drown > 0 && step == 2 * drown {
                    kept.push(r);
                    break;
                } else if step > 1 && r.abs() < th {
                    drown = step;
                }
                kept.push(r);
            }
        }
    }
    (kept, drown)
}

/// `CO_AutoCorrShape`: how the autocorrelation function decays with lag.
///
/// The Fourier autocorrelation is truncated according to `stop`, then
/// summarised: its sum and mean (absolute versions too unless
/// `PosDrown`), its own autocorrelation at lag 1 and at its first zero
/// crossing (`ac1`, `actau`), counts and mean curvature of its local
/// minima and maxima, and for `PosDrown` the fit of `exp(-b·τ)`
/// (`decayTimescale = 1/b`, `fexpacf_r2`, `fexpacf_stdres`).
///
/// A constant series gives a record of NaN.
pub fn autocorr_shape(y: &[f64], stop: StopWhen) -> FeatureRecord {
    let keys = shape_keys(stop);
    let full = acf(y);
    if full.first().map_or(true, |r| r.is_nan()) {
        log::warn!("autocorrelation shape: autocorrelation undefined (constant series?)");
        return FeatureRecord::nan_filled(&keys);
    }

    let (r, drown) = truncated_acf(&full, stop);
    let nac = r.len();
    let mut out = FeatureRecord::with_capacity(keys.len());
    out.insert("Nac", drown as f64);
    out.insert("sumacf", r.iter().sum());
    out.insert("meanacf", mean(&r));
    if stop != StopWhen::PosDrown {
        let abs: Vec<f64> = r.iter().map(|v| v.abs()).collect();
        out.insert("meanabsacf", mean(&abs));
        out.insert("sumabsacf", abs.iter().sum());
    }

    if nac > 5 {
        out.insert("ac1", autocorr_at(&r, 1));
        let actau = if r.iter().all(|&v| v > 0.0) {
            f64::NAN
        } else {
            first_crossing(&r, 0.0).map_or(f64::NAN, |c| autocorr_at(&r, c.discrete))
        };
        out.insert("actau", actau);
    } else {
        out.insert("ac1", f64::NAN);
        out.insert("actau", f64::NAN);
    }

    // Curvature at each turning point of the truncated ACF
    let d = diff(&r);
    let dd = diff(&d);
    let curvature: Vec<f64> = sign_change_indices(&d)
        .into_iter()
        .filter_map(|i| dd.get(i).copied())
        .collect();
    let minima: Vec<f64> = curvature.iter().copied().filter(|&c| c > 0.0).collect();
    let maxima: Vec<f64> = curvature.iter().copied().filter(|&c| c < 0.0).collect();
    out.insert("nminima", minima.len() as f64);
    out.insert("meanminima", mean(&minima));
    out.insert("nmaxima", maxima.len() as f64);
    out.insert("meanmaxima", mean(&maxima).abs());
    out.insert("nextrema", curvature.len() as f64);
    out.insert("pextrema", curvature.len() as f64 / nac as f64);

    let fit = if stop == StopWhen::PosDrown && nac >= 4 {
        let lags: Vec<f64> = (0..nac).map(|t| t as f64).collect();
        curve_fit(|t, p| (-p[0] * t).exp(), &lags, &r, &[0.5])
    } else {
        None
    };
    match fit {
        Some(fit) => {
            out.insert("decayTimescale", 1.0 / fit.params[0]);
            out.insert("fexpacf_r2", fit.r_squared);
            out.insert("fexpacf_stdres", std_dev(&fit.residuals));
        }
        None => {
            out.insert("decayTimescale", f64::NAN);
            out.insert("fexpacf_r2", f64::NAN);
            out.insert("fexpacf_stdres", f64::NAN);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut y = vec![0.0; n];
        for t in 1..n {
            y[t] = phi * y[t - 1] + normal.sample(&mut rng);
        }
        y
    }

    #[test]
    fn trev_of_sawtooth() {
        // Rises by 1 three times then drops by 3: skewed increments.
        let y: Vec<f64> = (0..41).map(|i| (i % 4) as f64).collect();
        let rec = trev(&y, Lag::Fixed(1)).unwrap();
        // d = [1, 1, 1, -3, ...]: mean d³ = (3 - 27)/4, mean d² = 12/4
        assert_relative_eq!(rec["num"], -6.0, epsilon = 1e-12);
        assert_relative_eq!(rec["denom"], 3f64.powf(1.5), epsilon = 1e-12);
        assert!(rec["raw"] < 0.0);
        assert_relative_eq!(rec["abs"], rec["raw"].abs());
        assert_relative_eq!(rec["raw"], rec["num"] / rec["denom"]);
    }

    #[test]
    fn trev_time_reversal_flips_sign() {
        let y: Vec<f64> = (0..60).map(|i| ((i * 7) % 11) as f64).collect();
        let rev: Vec<f64> = y.iter().rev().copied().collect();
        let a = trev(&y, Lag::Fixed(2)).unwrap();
        let b = trev(&rev, Lag::Fixed(2)).unwrap();
        assert_relative_eq!(a["raw"], -b["raw"], epsilon = 1e-12);
    }

    #[test]
    fn trev_rejects_zero_lag() {
        assert!(matches!(
            trev(&[1.0, 2.0, 3.0], Lag::Fixed(0)),
            Err(HctsaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn unresolved_lag_gives_nan_records() {
        let y = [5.0; 50];
        let rec = trev(&y, Lag::FirstZeroCrossing).unwrap();
        assert!(rec.all_nan());
        assert_eq!(rec.len(), 5);
        assert!(tc3(&y, Lag::FirstMinMutualInfo).unwrap().all_nan());
        assert!(tc3(&[1.0, 2.0, 3.0], Lag::Fixed(7)).unwrap().all_nan());
    }

    #[test]
    fn tc3_matches_direct_formula() {
        let y = [1.0, 2.0, -1.0, 0.5, 3.0, -2.0];
        let rec = tc3(&y, Lag::Fixed(1)).unwrap();
        let num = (1.0 * 2.0 * -1.0 + 2.0 * -1.0 * 0.5 + -1.0 * 0.5 * 3.0 + 0.5 * 3.0 * -2.0) / 4.0;
        let den: f64 = ((1.0 * 2.0 + 2.0 * -1.0 + -1.0 * 0.5 + 0.5 * 3.0) / 4.0f64).abs();
        assert_relative_eq!(rec["num"], num, epsilon = 1e-12);
        assert_relative_eq!(rec["denom"], den.powf(1.5), epsilon = 1e-12);
    }

    #[test]
    fn tc3_lag_too_long_is_nan() {
        let rec = tc3(&[1.0, 2.0, 3.0, 4.0], Lag::Fixed(2)).unwrap();
        assert!(rec.all_nan());
    }

    #[test]
    fn glscf_with_unit_exponents_is_magnitude_correlation() {
        let y: Vec<f64> = (0..200).map(|i| (i as f64 * 0.3).sin() * 2.0).collect();
        let g = glscf(&y, 1.0, 1.0, Lag::Fixed(3)).unwrap();
        let a: Vec<f64> = y[..197].iter().map(|v| v.abs()).collect();
        let b: Vec<f64> = y[3..].iter().map(|v| v.abs()).collect();
        assert_relative_eq!(g, crate::utils::stats::pearson(&a, &b), epsilon = 1e-10);
    }

    #[test]
    fn glscf_rejects_zero_exponent() {
        let y = [1.0, -2.0, 3.0, 0.5];
        assert!(matches!(
            glscf(&y, 0.0, 1.0, Lag::Fixed(1)),
            Err(HctsaError::InvalidParameter(_))
        ));
        assert!(fzcglscf(&y, 1.0, 0.0, None).is_err());
    }

    #[test]
    fn glscf_of_constant_magnitudes_is_nan() {
        let y: Vec<f64> = (0..40).map(|i| if i % 3 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(glscf(&y, 1.0, 2.0, Lag::Fixed(1)).unwrap().is_nan());
    }

    #[test]
    fn fzcglscf_interpolates_the_first_sign_change() {
        // magnitudes |sin| have period 25 in t, so correlation turns negative
        // before a quarter period
        let y: Vec<f64> = (0..500)
            .map(|i| (std::f64::consts::PI * i as f64 / 25.0).sin())
            .collect();
        let crossing = fzcglscf(&y, 1.0, 1.0, None).unwrap();
        assert!(crossing > 1.0 && crossing < 12.5, "crossing = {crossing}");

        let g: Vec<f64> = (1..=20).map(|t| glscf_at(&y, 1.0, 1.0, t)).collect();
        let tau = g.windows(2).position(|w| w[0] * w[1] < 0.0).unwrap() + 2;
        let (cur, prev) = (g[tau - 1], g[tau - 2]);
        assert_relative_eq!(crossing, (tau - 1) as f64 + cur / (cur - prev), epsilon = 1e-12);
    }

    #[test]
    fn fzcglscf_without_crossing_returns_max_tau() {
        let y: Vec<f64> = (1..=30).map(f64::from).collect();
        assert_eq!(fzcglscf(&y, 1.0, 1.0, Some(4)).unwrap(), 4.0);
    }

    #[test]
    fn nonlinear_autocorr_products() {
        let y = [1.0, -2.0, 3.0, 0.5, -1.0];
        // [2]: y_t·y_{t-2} for t = 2..5, no absolute value for one lag
        let two = nonlinear_autocorr(&y, &[2], None).unwrap();
        assert_relative_eq!(two, (3.0 * 1.0 + 0.5 * -2.0 + -1.0 * 3.0) / 3.0);
        // [1, 2]: odd product, absolute values by default
        let three = nonlinear_autocorr(&y, &[1, 2], None).unwrap();
        assert_relative_eq!(three, (6.0 + 3.0 + 1.5) / 3.0);
        let signed = nonlinear_autocorr(&y, &[1, 2], Some(false)).unwrap();
        assert_relative_eq!(signed, (-6.0 - 3.0 - 1.5) / 3.0);
        // [0, 0, 1]: y_t³·y_{t-1}
        let cubic = nonlinear_autocorr(&[1.0, 2.0, 3.0], &[0, 0, 1], None).unwrap();
        assert_relative_eq!(cubic, (8.0 * 1.0 + 27.0 * 2.0) / 2.0);
    }

    #[test]
    fn nonlinear_autocorr_edge_cases() {
        assert!(nonlinear_autocorr(&[1.0, 2.0], &[], None).is_err());
        assert!(nonlinear_autocorr(&[1.0, 2.0], &[2], None).unwrap().is_nan());
    }

    #[test]
    fn stop_when_parses() {
        assert_eq!("posDrown".parse::<StopWhen>().unwrap(), StopWhen::PosDrown);
        assert_eq!("12".parse::<StopWhen>().unwrap(), StopWhen::Lag(12));
        assert!("sideways".parse::<StopWhen>().is_err());
    }

    #[test]
    fn pos_drown_keeps_positive_decay() {
        let y = ar1(2000, 0.8, 5);
        let rec = autocorr_shape(&y, StopWhen::PosDrown);
        assert!(!rec.contains_key("meanabsacf"));
        assert!(rec["Nac"] >= 5.0);
        // exp(-b τ) with b ≈ -ln 0.8
        let expected = -1.0 / 0.8f64.ln();
        assert!((rec["decayTimescale"] - expected).abs() < 2.0);
        assert!(rec["fexpacf_r2"] > 0.8);
    }

    #[test]
    fn fixed_lag_has_absolute_stats() {
        let y: Vec<f64> = (0..200).map(|i| (i as f64 * 0.2).sin()).collect();
        let rec = autocorr_shape(&y, StopWhen::Lag(60));
        assert_eq!(rec["Nac"], 60.0);
        assert!(rec["meanabsacf"] >= rec["meanacf"].abs());
        assert!(rec["nextrema"] >= 2.0);
        assert!(rec["decayTimescale"].is_nan());
    }

    #[test]
    fn constant_series_is_nan() {
        let rec = autocorr_shape(&[3.0; 30], StopWhen::Drown);
        assert!(rec.all_nan());
        assert!(rec.contains_key("sumabsacf"));
    }
}
