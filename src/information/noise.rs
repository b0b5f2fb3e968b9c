//! Robustness of automutual information to additive noise.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use super::ami::{auto_mutual_info, histogram_ami_at, AmiLags, AmiMethod};
use crate::binning::AmiBinning;
use crate::core::{FeatureRecord, Lag};
use crate::correlation::{autocorr, AcfLags, AcfMethod};
use crate::error::{HctsaError, Result};
use crate::transform::warn_if_not_zscored;
use crate::utils::ols::linear_fit;
use crate::utils::optimization::curve_fit;
use crate::utils::stats::{diff, linspace, mean};

/// Noise amplitudes compared, evenly spaced over `[0, 3]`.
const NOISE_LEVELS: usize = 50;
const MAX_NOISE: f64 = 3.0;

const ADD_NOISE_KEYS: [&str; 20] = [
    "pdec",
    "meanch",
    "ac1",
    "ac2",
    "firstUnder75",
    "firstUnder50",
    "firstUnder25",
    "ami_at_5",
    "ami_at_10",
    "ami_at_15",
    "ami_at_20",
    "pcrossmean",
    "fitexpa",
    "fitexpb",
    "fitexpr2",
    "fitexpadjr2",
    "fitexprmse",
    "fitlina",
    "fitlinb",
    "linfit_mse",
];

/// Automutual information estimator used by [`add_noise`].
#[derive(Debug, Clone, Copy)]
pub enum NoiseAmi<'a> {
    /// Histogram AMI on edges recomputed for each noisy copy.
    Histogram { binning: AmiBinning, num_bins: usize },
    /// Gaussian or external estimator as in [`auto_mutual_info`].
    Estimator(AmiMethod<'a>),
}

impl Default for NoiseAmi<'_> {
    fn default() -> Self {
        NoiseAmi::Histogram {
            binning: AmiBinning::Even,
            num_bins: 10,
        }
    }
}

impl NoiseAmi<'_> {
    fn at(&self, y: &[f64], tau: usize) -> Result<f64> {
        match self {
            NoiseAmi::Histogram { binning, num_bins } => {
                Ok(histogram_ami_at(y, tau, *binning, *num_bins))
            }
            NoiseAmi::Estimator(method) => {
                let v = auto_mutual_info(y, &AmiLags::Single(Lag::Fixed(tau)), method)?;
                Ok(v.as_scalar().unwrap_or(f64::NAN))
            }
        }
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// `CO_AddNoise`: how the automutual information at `tau` decays as white
/// noise of growing amplitude is added.
///
/// One standard-normal noise vector, drawn from an RNG seeded with `seed`,
/// is scaled by 50 amplitudes over `[0, 3]` and added to the z-scored
/// series. Of the resulting AMI curve the record holds the proportion of
/// decreases and mean change, its lag 1 and 2 autocorrelations, the first
/// amplitude at which it falls under 75, 50 and 25% of its noise-free value
/// (3 when it never does), its value at amplitudes 0.5 to 2 (`ami_at_5`
/// is amplitude 0.5), the proportion of mean crossings, and exponential
/// `a·exp(b·x)` and linear fits.
///
/// An unresolvable lag or an undefined AMI at any amplitude gives an
/// all-NaN record.
///
/// # Errors
/// `InvalidParameter` for zero histogram bins; failures of an external
/// estimator.
pub fn add_noise(y: &[f64], tau: Lag, method: &NoiseAmi<'_>, seed: u64) -> Result<FeatureRecord> {
    if let NoiseAmi::Histogram { num_bins: 0, .. } = method {
        return Err(HctsaError::InvalidParameter(
            "number of bins must be positive".into(),
        ));
    }
    warn_if_not_zscored(y, "add_noise");
    let Some(tau) = tau.resolve(y) else {
        log::warn!("add_noise: could not resolve lag {}", tau);
        return Ok(FeatureRecord::nan_filled(&ADD_NOISE_KEYS));
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let noise: Vec<f64> = (0..y.len()).map(|_| StandardNormal.sample(&mut rng)).collect();
    let levels = linspace(0.0, MAX_NOISE, NOISE_LEVELS);

    let mut amis = Vec::with_capacity(NOISE_LEVELS);
    for &level in &levels {
        let noisy: Vec<f64> = y.iter().zip(&noise).map(|(v, e)| v + level * e).collect();
        amis.push(method.at(&noisy, tau)?);
    }
    if amis.iter().any(|v| v.is_nan()) {
        log::warn!(
            "add_noise: automutual information undefined at lag {} for a series of length {}",
            tau,
            y.len()
        );
        return Ok(FeatureRecord::nan_filled(&ADD_NOISE_KEYS));
    }

    let steps = (NOISE_LEVELS - 1) as f64;
    let changes = diff(&amis);
    let mut out = FeatureRecord::with_capacity(ADD_NOISE_KEYS.len());
    out.insert("pdec", changes.iter().filter(|&&c| c < 0.0).count() as f64 / steps);
    out.insert("meanch", mean(&changes));
    let ac = autocorr(&amis, &AcfLags::List(vec![1, 2]), AcfMethod::Fourier);
    out.insert("ac1", ac[0]);
    out.insert("ac2", ac[1]);

    let fractions = [
        ("firstUnder75", 0.75),
        ("firstUnder50", 0.5),
        ("firstUnder25", 0.25),
    ];
    for (key, fraction) in fractions {
        let threshold = fraction * amis[0];
        let level = levels
            .iter()
            .zip(&amis)
            .find(|&(_, &a)| a < threshold)
            .map_or(MAX_NOISE, |(&l, _)| l);
        out.insert(key, level);
    }
    let amplitudes = [
        ("ami_at_5", 0.5),
        ("ami_at_10", 1.0),
        ("ami_at_15", 1.5),
        ("ami_at_20", 2.0),
    ];
    for (key, amplitude) in amplitudes {
        let i = levels.iter().position(|&l| l >= amplitude).unwrap_or(NOISE_LEVELS - 1);
        out.insert(key, amis[i]);
    }

    let centre = mean(&amis);
    let crossings = amis
        .windows(2)
        .filter(|w| sign(w[0] - centre) != sign(w[1] - centre))
        .count();
    out.insert("pcrossmean", crossings as f64 / steps);

    match curve_fit(|x, p| p[0] * (p[1] * x).exp(), &levels, &amis, &[amis[0], -1.0]) {
        Some(fit) => {
            let n = NOISE_LEVELS as f64;
            out.insert("fitexpa", fit.params[0]);
            out.insert("fitexpb", fit.params[1]);
            out.insert("fitexpr2", fit.r_squared);
            out.insert("fitexpadjr2", 1.0 - (1.0 - fit.r_squared) * (n - 1.0) / (n - 3.0));
            out.insert("fitexprmse", fit.rmse());
        }
        None => {
            log::warn!("add_noise: exponential fit failed");
            for key in ["fitexpa", "fitexpb", "fitexpr2", "fitexpadjr2", "fitexprmse"] {
                out.insert(key, f64::NAN);
            }
        }
    }

    let (intercept, slope) = linear_fit(&levels, &amis).unwrap_or((f64::NAN, f64::NAN));
    out.insert("fitlina", slope);
    out.insert("fitlinb", intercept);
    let mse = levels
        .iter()
        .zip(&amis)
        .map(|(&x, &a)| (intercept + slope * x - a).powi(2))
        .sum::<f64>()
        / NOISE_LEVELS as f64;
    out.insert("linfit_mse", mse);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::information::gaussian_ami;
    use crate::transform::zscore;

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = 0.0;
        let raw: Vec<f64> = (0..n)
            .map(|_| {
                let e: f64 = StandardNormal.sample(&mut rng);
                x = phi * x + e;
                x
            })
            .collect();
        zscore(&raw).unwrap()
    }

    #[test]
    fn ami_decays_with_noise() {
        let y = ar1(1000, 0.9, 3);
        let rec = add_noise(&y, Lag::Fixed(1), &NoiseAmi::default(), 0).unwrap();
        assert_eq!(rec.keys().collect::<Vec<_>>(), ADD_NOISE_KEYS.to_vec());
        assert!(rec["pdec"] > 0.5, "pdec = {}", rec["pdec"]);
        assert!(rec["meanch"] < 0.0);
        assert!(rec["firstUnder50"] > 0.0 && rec["firstUnder50"] <= 3.0);
        assert!(rec["firstUnder75"] <= rec["firstUnder50"]);
        assert!(rec["firstUnder50"] <= rec["firstUnder25"]);
        assert!(rec["ami_at_5"] > rec["ami_at_20"]);
        assert!(rec["fitexpb"] < 0.0);
        assert!(rec["fitlina"] < 0.0);
        assert!(rec["linfit_mse"] >= 0.0);
    }

    #[test]
    fn gaussian_estimator_starts_from_the_clean_series() {
        let y = ar1(500, 0.7, 5);
        let method = NoiseAmi::Estimator(AmiMethod::Gaussian);
        let rec = add_noise(&y, Lag::Fixed(2), &method, 1).unwrap();
        let clean = gaussian_ami(&y, 2);
        // the fitted line passes near the noise-free value
        assert!((rec["fitlinb"] - clean).abs() < clean);
        assert!(rec["ami_at_10"] < clean);
    }

    #[test]
    fn same_seed_same_record() {
        let y = ar1(300, 0.5, 9);
        let a = add_noise(&y, Lag::Fixed(1), &NoiseAmi::default(), 4).unwrap();
        let b = add_noise(&y, Lag::Fixed(1), &NoiseAmi::default(), 4).unwrap();
        for key in ADD_NOISE_KEYS {
            assert!(a[key] == b[key] || (a[key].is_nan() && b[key].is_nan()), "{key}");
        }
    }

    #[test]
    fn signs_of_deviations() {
        assert_eq!(sign(0.0), 0);
        assert_eq!(sign(-2.0), -1);
        assert_eq!(sign(3.0), 1);
    }

    #[test]
    fn degenerate_inputs() {
        let rec = add_noise(&[1.0; 40], Lag::FirstZeroCrossing, &NoiseAmi::default(), 0).unwrap();
        assert!(rec.all_nan());
        let method = NoiseAmi::Histogram {
            binning: AmiBinning::Even,
            num_bins: 0,
        };
        assert!(add_noise(&[1.0, 2.0, 3.0], Lag::Fixed(1), &method, 0).is_err());
    }
}
