//! The series as a forcing term on a particle in a potential well.

use std::str::FromStr;

use crate::core::FeatureRecord;
use crate::correlation::{autocorr, first_crossing, AcfLags, AcfMethod};
use crate::error::{HctsaError, Result};
use crate::utils::stats::{max, mean, median, min, std_dev};

/// Trajectories larger than this are treated as diverged.
const BLOWUP: f64 = 1e10;

/// Potential the particle moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Potential {
    /// `V(x) = x⁴/4 - α²x²/2`, wells at `±α`.
    #[default]
    DoubleWell,
    /// `V(x) = -cos(x/α)`.
    Sine,
}

impl FromStr for Potential {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dblwell" => Ok(Potential::DoubleWell),
            "sine" => Ok(Potential::Sine),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown potential function '{other}'"
            ))),
        }
    }
}

/// Simulation parameters: potential scale, friction and time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    pub alpha: f64,
    pub kappa: f64,
    pub deltat: f64,
}

impl Potential {
    /// Default parameters for the potential.
    pub fn default_params(&self) -> ForceParams {
        match self {
            Potential::DoubleWell => ForceParams {
                alpha: 2.0,
                kappa: 0.1,
                deltat: 0.1,
            },
            Potential::Sine => ForceParams {
                alpha: 1.0,
                kappa: 1.0,
                deltat: 1.0,
            },
        }
    }

    fn force(&self, x: f64, alpha: f64) -> f64 {
        match self {
            Potential::DoubleWell => -x.powi(3) + alpha * alpha * x,
            Potential::Sine => (x / alpha).sin() / alpha,
        }
    }

    fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec![
            "mean", "median", "std", "range", "proppos", "pcross", "ac1", "ac10", "ac50", "tau",
            "finaldev",
        ];
        if *self == Potential::DoubleWell {
            keys.extend(["pcrossup", "pcrossdown"]);
        }
        keys
    }
}

/// Proportion of consecutive pairs on opposite sides of `level`.
fn crossing_rate(x: &[f64], level: f64) -> f64 {
    let crossings = x
        .windows(2)
        .filter(|w| (w[0] - level) * (w[1] - level) < 0.0)
        .count();
    crossings as f64 / (x.len() as f64 - 1.0)
}

/// `PH_ForcePotential`: drive a damped particle in `potential` with the
/// series as external force and summarise its trajectory.
///
/// Keys `mean, median, std, range, proppos, pcross, ac1, ac10, ac50, tau,
/// finaldev`, plus `pcrossup` / `pcrossdown` (crossings of the wells at
/// `±α`) for the double well. Autocorrelations are absolute values; `tau`
/// is the continuous first zero crossing. A trajectory that diverges gives
/// an all-NaN record.
///
/// # Arguments
/// * `y` - forcing series
/// * `potential` - potential well
/// * `params` - simulation parameters; per-potential defaults when `None`
pub fn force_potential(
    y: &[f64],
    potential: Potential,
    params: Option<ForceParams>,
) -> FeatureRecord {
    let ForceParams {
        alpha,
        kappa,
        deltat,
    } = params.unwrap_or_else(|| potential.default_params());
    let keys = potential.keys();
    let n = y.len();
    if n < 2 {
        log::warn!("force potential: series of length {} is too short", n);
        return FeatureRecord::nan_filled(&keys);
    }

    let mut x = vec![0.0; n];
    let mut v = vec![0.0; n];
    for i in 1..n {
        let accel = potential.force(x[i - 1], alpha) + y[i - 1] - kappa * v[i - 1];
        x[i] = x[i - 1] + v[i - 1] * deltat + accel * deltat * deltat;
        v[i] = v[i - 1] + accel * deltat;
    }

    let last = x[n - 1];
    if last.is_nan() || last.abs() > BLOWUP {
        log::warn!("force potential: trajectory diverged");
        return FeatureRecord::nan_filled(&keys);
    }

    let ac = autocorr(&x, &AcfLags::List(vec![1, 10, 50]), AcfMethod::Fourier);
    let mut out = FeatureRecord::with_capacity(keys.len());
    out.insert("mean", mean(&x));
    out.insert("median", median(&x));
    out.insert("std", std_dev(&x));
    out.insert("range", max(&x) - min(&x));
    out.insert("proppos", x.iter().filter(|&&v| v > 0.0).count() as f64 / n as f64);
    out.insert("pcross", crossing_rate(&x, 0.0));
    out.insert("ac1", ac[0].abs());
    out.insert("ac10", ac[1].abs());
    out.insert("ac50", ac[2].abs());
    out.insert(
        "tau",
        first_crossing(&x, 0.0).map_or(f64::NAN, |c| c.continuous),
    );
    out.insert("finaldev", last.abs());
    if potential == Potential::DoubleWell {
        out.insert("pcrossup", crossing_rate(&x, alpha));
        out.insert("pcrossdown", crossing_rate(&x, -alpha));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unforced_particle_stays_at_rest() {
        let rec = force_potential(&[0.0; 100], Potential::DoubleWell, None);
        assert_relative_eq!(rec["mean"], 0.0);
        assert_relative_eq!(rec["finaldev"], 0.0);
        assert_relative_eq!(rec["pcross"], 0.0);
        // zero trajectory has no autocorrelation
        assert!(rec["ac1"].is_nan());
    }

    #[test]
    fn constant_push_settles_in_a_well() {
        let rec = force_potential(&[0.5; 2000], Potential::DoubleWell, None);
        // equilibrium of -x³ + 4x + 0.5 = 0 near x = 2.06
        assert!((rec["finaldev"] - 2.06).abs() < 0.05, "{}", rec["finaldev"]);
        assert!(rec["proppos"] > 0.99);
        assert!(rec.contains_key("pcrossup"));
    }

    #[test]
    fn sine_potential_has_no_well_keys() {
        let y: Vec<f64> = (0..300).map(|i| (i as f64 * 0.1).sin()).collect();
        let rec = force_potential(&y, Potential::Sine, None);
        assert!(!rec.contains_key("pcrossup"));
        assert_eq!(rec.len(), 11);
    }

    #[test]
    fn divergence_gives_nan() {
        let params = ForceParams {
            alpha: 1.0,
            kappa: 0.0,
            deltat: 5.0,
        };
        let rec = force_potential(&[10.0; 200], Potential::DoubleWell, Some(params));
        assert!(rec.all_nan());
    }

    #[test]
    fn potential_names_parse() {
        assert_eq!("sine".parse::<Potential>().unwrap(), Potential::Sine);
        assert!("harmonic".parse::<Potential>().is_err());
    }
}
