//! Distribution-level operations: histogram shape, burstiness and fits.

use std::str::FromStr;

use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::fitting::{DistributionFit, Family};
use crate::binning::{auto_edges, histogram, Binner};
use crate::core::FeatureRecord;
use crate::error::{HctsaError, Result};
use crate::transform::warn_if_not_zscored;
use crate::utils::stats::{linspace, max, mean, min, sorted, std_dev, std_pop};

/// Number of histogram bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinCount {
    Fixed(usize),
    /// Data-driven edges, see [`auto_edges`].
    Auto,
}

impl Default for BinCount {
    fn default() -> Self {
        BinCount::Fixed(10)
    }
}

fn bin_centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}

/// Mean center of the bins whose value equals the maximum.
fn mode_center(values: &[f64], centers: &[f64]) -> f64 {
    let top = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let at_top: Vec<f64> = values
        .iter()
        .zip(centers)
        .filter(|&(&v, _)| v == top)
        .map(|(_, &c)| c)
        .collect();
    mean(&at_top)
}

/// `DN_HistogramMode`: center of the most populated histogram bin.
///
/// Ties average the centers of all modal bins. An empty series gives NaN.
pub fn histogram_mode(y: &[f64], bins: BinCount, binner: Binner) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    let (counts, edges) = match bins {
        BinCount::Fixed(n) => binner.bin(y, n),
        BinCount::Auto => {
            let edges = auto_edges(y);
            (histogram(y, &edges), edges)
        }
    };
    let counts: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    mode_center(&counts, &bin_centers(&edges))
}

/// `DN_HistogramAsymmetry`: compare histograms of the positive and negative
/// values of a z-scored series.
///
/// Probabilities are normalised by the number of non-zero values. Keys
/// `densityDiff, modeProbPos, modeProbNeg, modeDiff, posMode, negMode,
/// modeAsymmetry`.
pub fn histogram_asymmetry(y: &[f64], num_bins: usize, binner: Binner) -> FeatureRecord {
    warn_if_not_zscored(y, "histogram asymmetry");
    let positive: Vec<f64> = y.iter().copied().filter(|&v| v > 0.0).collect();
    let negative: Vec<f64> = y.iter().copied().filter(|&v| v < 0.0).collect();
    let non_zero = (positive.len() + negative.len()) as f64;

    let side = |values: &[f64]| -> (f64, f64) {
        let (counts, edges) = binner.bin(values, num_bins);
        let p: Vec<f64> = counts.iter().map(|&c| c as f64 / non_zero).collect();
        let top = p.iter().copied().fold(f64::NAN, f64::max);
        (top, mode_center(&p, &bin_centers(&edges)))
    };
    let (prob_pos, pos_mode) = side(&positive);
    let (prob_neg, neg_mode) = side(&negative);

    let mut out = FeatureRecord::with_capacity(7);
    out.insert("densityDiff", positive.len() as f64 - negative.len() as f64);
    out.insert("modeProbPos", prob_pos);
    out.insert("modeProbNeg", prob_neg);
    out.insert("modeDiff", prob_pos - prob_neg);
    out.insert("posMode", pos_mode);
    out.insert("negMode", neg_mode);
    out.insert("modeAsymmetry", pos_mode + neg_mode);
    out
}

/// `DN_Burstiness`: Goh–Barabási burstiness `B = (r - 1)/(r + 1)` of the
/// coefficient of variation `r`, and the finite-size corrected `B_Kim`.
pub fn burstiness(y: &[f64]) -> FeatureRecord {
    let r = std_pop(y) / mean(y);
    let n = y.len() as f64;
    let p1 = (n + 1.0).sqrt() * r - (n - 1.0).sqrt();
    let p2 = ((n + 1.0).sqrt() - 2.0) * r + (n - 1.0).sqrt();

    let mut out = FeatureRecord::with_capacity(2);
    out.insert("B", (r - 1.0) / (r + 1.0));
    out.insert("B_Kim", p1 / p2);
    out
}

/// Family for [`fit_mle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MleFit {
    #[default]
    Gaussian,
    Uniform,
    Geometric,
}

impl FromStr for MleFit {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gaussian" => Ok(MleFit::Gaussian),
            "uniform" => Ok(MleFit::Uniform),
            "geometric" => Ok(MleFit::Geometric),
            other => Err(HctsaError::InvalidParameter(format!(
                "invalid fit specifier '{other}'"
            ))),
        }
    }
}

/// `DN_Fit_mle`: maximum-likelihood parameters.
///
/// Keys `mean, std` (Gaussian), `a, b` (uniform) or `p` (geometric,
/// `1/(1 + mean)`).
pub fn fit_mle(y: &[f64], what: MleFit) -> FeatureRecord {
    let mut out = FeatureRecord::with_capacity(2);
    match what {
        MleFit::Gaussian => {
            out.insert("mean", mean(y));
            out.insert("std", std_pop(y));
        }
        MleFit::Uniform => {
            out.insert("a", if y.is_empty() { f64::NAN } else { min(y) });
            out.insert("b", if y.is_empty() { f64::NAN } else { max(y) });
        }
        MleFit::Geometric => out.insert("p", 1.0 / (1.0 + mean(y))),
    }
    out
}

/// Goodness-of-fit test for [`distribution_test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GofTest {
    /// Binned χ² test (`"chi2gof"`).
    ChiSquare,
    /// Kolmogorov–Smirnov test against the fitted distribution (`"ks"`).
    KolmogorovSmirnov,
    /// Lilliefors test of normality (`"lillie"`).
    Lilliefors,
}

impl FromStr for GofTest {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chi2gof" => Ok(GofTest::ChiSquare),
            "ks" => Ok(GofTest::KolmogorovSmirnov),
            "lillie" => Ok(GofTest::Lilliefors),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown hypothesis test '{other}'"
            ))),
        }
    }
}

const MIN_EXPECTED: f64 = 5.0;

fn ks_statistic(x: &[f64], fit: &dyn DistributionFit) -> f64 {
    let xs = sorted(x);
    let n = xs.len() as f64;
    xs.iter()
        .enumerate()
        .map(|(i, &v)| {
            let f = fit.cdf(v);
            ((i + 1) as f64 / n - f).max(f - i as f64 / n)
        })
        .fold(0.0, f64::max)
}

/// Asymptotic Kolmogorov tail probability with Stephens' small-sample
/// correction.
fn kolmogorov_pvalue(d: f64, n: usize) -> f64 {
    let sn = (n as f64).sqrt();
    let lambda = (sn + 0.12 + 0.11 / sn) * d;
    // Q(lambda) is 1 to within 1e-6 here
    if lambda < 0.2 {
        return 1.0;
    }
    let mut sum = 0.0;
    for k in 1..=100 {
        let kf = k as f64;
        let term = (-2.0 * kf * kf * lambda * lambda).exp();
        sum += if k % 2 == 1 { term } else { -term };
        if term < 1e-12 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Dallal–Wilkinson approximation to the Lilliefors p-value, limited to the
/// tabulated range `[0.001, 0.5]`.
fn lilliefors_pvalue(d: f64, n: usize) -> f64 {
    let (mut d, mut nn) = (d, n as f64);
    if n > 100 {
        d *= (nn / 100.0).powf(0.49);
        nn = 100.0;
    }
    let p = (-7.01256 * d * d * (nn + 2.78019) + 2.99587 * d * (nn + 2.78019).sqrt() - 0.122119
        + 0.974598 / nn.sqrt()
        + 1.67997 / nn)
        .exp();
    p.clamp(0.001, 0.5)
}

fn chi_square_pvalue(x: &[f64], fit: &dyn DistributionFit, num_bins: usize) -> f64 {
    let n = x.len() as f64;
    let edges = linspace(min(x), max(x), num_bins + 1);
    let observed = histogram(x, &edges);
    let mut cdfs: Vec<f64> = edges.iter().map(|&e| fit.cdf(e)).collect();
    // outer bins extend to the whole real line
    cdfs[0] = 0.0;
    cdfs[num_bins] = 1.0;

    // Pool adjacent bins until each expected count reaches the minimum
    let mut groups: Vec<(f64, f64)> = Vec::new();
    let (mut obs, mut exp) = (0.0, 0.0);
    for (i, &o) in observed.iter().enumerate() {
        obs += o as f64;
        exp += n * (cdfs[i + 1] - cdfs[i]);
        if exp >= MIN_EXPECTED {
            groups.push((obs, exp));
            obs = 0.0;
            exp = 0.0;
        }
    }
    match groups.last_mut() {
        Some(last) => {
            last.0 += obs;
            last.1 += exp;
        }
        None => groups.push((obs, exp)),
    }

    let df = groups.len() as f64 - 1.0 - fit.num_params() as f64;
    if df < 1.0 {
        log::warn!(
            "chi-square test: {} pooled bins leave no degrees of freedom",
            groups.len()
        );
        return f64::NAN;
    }
    let stat: f64 = groups.iter().map(|(o, e)| (o - e).powi(2) / e).sum();
    ChiSquared::new(df).map_or(f64::NAN, |chi| 1.0 - chi.cdf(stat))
}

/// `HT_DistributionTest`: p-value of a goodness-of-fit test of `x` against
/// a maximum-likelihood fit of `family`.
///
/// For the beta family the data are first mapped into `(0, 1)`. A fit that
/// fails (data outside the support, zero spread) gives NaN with a warning.
///
/// # Errors
/// `InvalidParameter` for zero bins in the χ² test, or the Lilliefors test
/// with a family other than normal.
pub fn distribution_test(x: &[f64], test: GofTest, family: Family, num_bins: usize) -> Result<f64> {
    if test == GofTest::ChiSquare && num_bins == 0 {
        return Err(HctsaError::InvalidParameter(
            "chi-square test needs at least one bin".into(),
        ));
    }
    if test == GofTest::Lilliefors && family != Family::Normal {
        return Err(HctsaError::InvalidParameter(format!(
            "Lilliefors test is only defined for the normal family, got '{family}'"
        )));
    }

    let data: Vec<f64> = if family == Family::Beta && x.len() > 1 {
        let pad = 0.01 * std_dev(x);
        let (lo, hi) = (min(x), max(x));
        x.iter().map(|v| (v - lo + pad) / (hi - lo + 2.0 * pad)).collect()
    } else {
        x.to_vec()
    };

    let Some(fit) = family.fit(&data) else {
        log::warn!("distribution test: could not fit the '{}' family", family);
        return Ok(f64::NAN);
    };

    Ok(match test {
        GofTest::ChiSquare => chi_square_pvalue(&data, fit.as_ref(), num_bins),
        GofTest::KolmogorovSmirnov => {
            kolmogorov_pvalue(ks_statistic(&data, fit.as_ref()), data.len())
        }
        GofTest::Lilliefors => lilliefors_pvalue(ks_statistic(&data, fit.as_ref()), data.len()),
    })
}
