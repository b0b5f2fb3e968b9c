//! Automutual information at one or more lags.

use super::estimator::{
    gaussian_mi_from_correlation, EstimatorProvider, MiMethod, MutualInfoEstimator,
    DEFAULT_K_NEIGHBORS,
};
use crate::binning::{ami_bin_edges, bin_index, AmiBinning};
use crate::core::{FeatureRecord, FeatureValue, Lag};
use crate::error::Result;
use crate::transform::sign_change_indices;
use crate::utils::stats::{max, mean, median, min, mode, pearson, std_dev, std_pop};

/// Smallest number of lagged pairs an estimate is computed from.
const MIN_SAMPLES: usize = 5;

/// Lags requested from an AMI operation.
#[derive(Debug, Clone, PartialEq)]
pub enum AmiLags {
    /// A single, possibly symbolic, lag. Gives a scalar.
    Single(Lag),
    /// Several lags. Gives a record.
    List(Vec<usize>),
}

impl From<usize> for AmiLags {
    fn from(lag: usize) -> Self {
        AmiLags::Single(Lag::Fixed(lag))
    }
}

impl From<Vec<usize>> for AmiLags {
    fn from(lags: Vec<usize>) -> Self {
        AmiLags::List(lags)
    }
}

/// Estimator behind [`auto_mutual_info`].
#[derive(Clone, Copy, Default)]
pub enum AmiMethod<'a> {
    /// Closed-form Gaussian estimate, `-½·ln(1 - r²)`.
    #[default]
    Gaussian,
    /// Estimator created by an external provider.
    External {
        provider: &'a dyn EstimatorProvider,
        method: MiMethod,
    },
}

impl std::fmt::Debug for AmiMethod<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmiMethod::Gaussian => f.write_str("Gaussian"),
            AmiMethod::External { method, .. } => {
                f.debug_struct("External").field("method", method).finish()
            }
        }
    }
}

/// Gaussian automutual information of `y` at `lag`.
///
/// NaN when fewer than two pairs remain or the lagged vectors have no
/// variance.
pub fn gaussian_ami(y: &[f64], lag: usize) -> f64 {
    let n = y.len();
    if lag >= n || n - lag < 2 {
        return f64::NAN;
    }
    gaussian_mi_from_correlation(pearson(&y[..n - lag], &y[lag..]))
}

fn is_constant(y: &[f64]) -> bool {
    y.windows(2).all(|w| w[0] == w[1])
}

/// Histogram AMI of `y` at `lag` on precomputed edges.
fn histogram_ami_on_edges(y: &[f64], lag: usize, edges: &[f64]) -> f64 {
    let n = y.len();
    let nbins = edges.len().saturating_sub(1);
    if lag >= n || n - lag < 2 || nbins == 0 {
        return f64::NAN;
    }
    let y1 = &y[..n - lag];
    let y2 = &y[lag..];

    let mut joint = vec![vec![0usize; nbins]; nbins];
    let mut total = 0usize;
    for (&a, &b) in y1.iter().zip(y2.iter()) {
        if let (Some(i), Some(j)) = (bin_index(a, edges), bin_index(b, edges)) {
            joint[i][j] += 1;
            total += 1;
        }
    }
    if total == 0 {
        log::warn!("histogram AMI: no pairs fell inside the bin edges");
        return f64::NAN;
    }

    let total = total as f64;
    let row: Vec<f64> = joint
        .iter()
        .map(|r| r.iter().sum::<usize>() as f64 / total)
        .collect();
    let col: Vec<f64> = (0..nbins)
        .map(|j| joint.iter().map(|r| r[j]).sum::<usize>() as f64 / total)
        .collect();

    let mut ami = 0.0;
    for i in 0..nbins {
        for j in 0..nbins {
            if joint[i][j] > 0 {
                let p = joint[i][j] as f64 / total;
                ami += p * (p / (row[i] * col[j])).ln();
            }
        }
    }
    ami
}

/// Histogram automutual information of `y` at a single lag.
///
/// Edges are computed from the whole series under `policy`, then the joint
/// histogram of `(y[..N-lag], y[lag..])` is normalised to probabilities.
pub fn histogram_ami_at(y: &[f64], lag: usize, policy: AmiBinning, num_bins: usize) -> f64 {
    if y.len() < 2 || is_constant(y) {
        return f64::NAN;
    }
    let edges = ami_bin_edges(y, policy, num_bins);
    histogram_ami_on_edges(y, lag, &edges)
}

/// `CO_HistogramAMI`: histogram automutual information.
///
/// A single lag gives a scalar. A list gives a record keyed `ami1..amiK`
/// by list position.
///
/// # Arguments
/// * `y` - input series
/// * `lags` - lag or lags to evaluate
/// * `policy` - how the bin edges are chosen
/// * `num_bins` - number of bins for the edge policy
pub fn histogram_ami(
    y: &[f64],
    lags: &AmiLags,
    policy: AmiBinning,
    num_bins: usize,
) -> Result<FeatureValue> {
    if num_bins == 0 {
        return Err(crate::error::HctsaError::InvalidParameter(
            "number of bins must be positive".into(),
        ));
    }
    let constant = y.len() < 2 || is_constant(y);
    if constant {
        log::warn!(
            "histogram AMI: series of length {} is constant or too short",
            y.len()
        );
    }
    let edges = if constant {
        Vec::new()
    } else {
        ami_bin_edges(y, policy, num_bins)
    };
    let at = |lag: usize| {
        if constant {
            f64::NAN
        } else {
            histogram_ami_on_edges(y, lag, &edges)
        }
    };

    match lags {
        AmiLags::Single(lag) => match lag.resolve(y) {
            Some(tau) => Ok(FeatureValue::Scalar(at(tau))),
            None => {
                log::warn!("histogram AMI: could not resolve lag {}", lag);
                Ok(FeatureValue::Scalar(f64::NAN))
            }
        },
        AmiLags::List(taus) => {
            let n = y.len();
            let short: Vec<usize> = taus
                .iter()
                .copied()
                .filter(|&tau| tau >= n || n - tau < 2)
                .collect();
            if !constant && !short.is_empty() {
                log::warn!(
                    "histogram AMI: lags {:?} leave fewer than 2 pairs in a series of length {} and are NaN",
                    short,
                    n
                );
            }
            Ok(FeatureValue::Record(
                taus.iter()
                    .enumerate()
                    .map(|(i, &tau)| (format!("ami{}", i + 1), at(tau)))
                    .collect(),
            ))
        }
    }
}

/// Evaluates one estimator over a run of delays.
struct DelayEstimator<'a> {
    y: &'a [f64],
    external: Option<Box<dyn MutualInfoEstimator>>,
}

impl<'a> DelayEstimator<'a> {
    fn new(y: &'a [f64], method: &AmiMethod<'_>) -> Result<Self> {
        let external = match method {
            AmiMethod::Gaussian => None,
            AmiMethod::External { provider, method } => {
                Some(provider.initialize(*method, DEFAULT_K_NEIGHBORS, false)?)
            }
        };
        Ok(Self { y, external })
    }

    fn at(&mut self, delay: usize) -> Result<f64> {
        let n = self.y.len();
        match self.external.as_mut() {
            None => Ok(gaussian_ami(self.y, delay)),
            Some(estimator) => {
                estimator.set_observations(&self.y[..n - delay], &self.y[delay..])?;
                estimator.compute()
            }
        }
    }
}

/// AMI at each of `delays` (sorted ascending). Delays leaving fewer than
/// five pairs stay NaN, with one warning for the whole batch.
fn ami_over_delays(y: &[f64], delays: &[usize], method: &AmiMethod<'_>) -> Result<Vec<f64>> {
    let n = y.len();
    let mut out = vec![f64::NAN; delays.len()];
    let mut estimator = DelayEstimator::new(y, method)?;
    let mut truncated = false;
    for (slot, &delay) in out.iter_mut().zip(delays.iter()) {
        if n < MIN_SAMPLES || delay > n - MIN_SAMPLES {
            truncated = true;
            break;
        }
        *slot = estimator.at(delay)?;
    }
    if truncated {
        log::warn!(
            "automutual information: delays above {} leave fewer than {} samples and are NaN",
            n.saturating_sub(MIN_SAMPLES),
            MIN_SAMPLES
        );
    }
    Ok(out)
}

/// `IN_AutoMutualInfo`: automutual information at one or several delays.
///
/// A single delay gives a scalar. A list is sorted and gives a record keyed
/// `ami{delay}`.
///
/// # Errors
/// Only failures of an external estimator.
pub fn auto_mutual_info(y: &[f64], delays: &AmiLags, method: &AmiMethod<'_>) -> Result<FeatureValue> {
    match delays {
        AmiLags::Single(lag) => {
            let Some(tau) = lag.resolve(y) else {
                log::warn!("automutual information: could not resolve lag {}", lag);
                return Ok(FeatureValue::Scalar(f64::NAN));
            };
            let v = ami_over_delays(y, &[tau], method)?;
            Ok(FeatureValue::Scalar(v[0]))
        }
        AmiLags::List(list) => {
            let mut sorted = list.clone();
            sorted.sort_unstable();
            let values = ami_over_delays(y, &sorted, method)?;
            Ok(FeatureValue::Record(
                sorted
                    .iter()
                    .zip(values)
                    .map(|(d, v)| (format!("ami{d}"), v))
                    .collect(),
            ))
        }
    }
}

/// `IN_AutoMutualInfoStats`: statistics of the AMI function over delays
/// `1..=max_tau`.
///
/// `max_tau` defaults to `ceil(N/4)` and is capped at `ceil(N/2)`. Keys
/// `ami1..amiT` cover the requested range with NaN beyond the cap, then
/// `mami`, `stdami`, `pextrema` and `fmmi`.
pub fn auto_mutual_info_stats(
    y: &[f64],
    max_tau: Option<usize>,
    method: &AmiMethod<'_>,
) -> Result<FeatureRecord> {
    let n = y.len();
    let requested = max_tau.unwrap_or_else(|| n.div_ceil(4));
    let max_tau = requested.min(n.div_ceil(2));

    let delays: Vec<usize> = (1..=max_tau).collect();
    let ami = ami_over_delays(y, &delays, method)?;

    let mut out = FeatureRecord::with_capacity(requested + 4);
    for k in 1..=requested {
        out.insert(format!("ami{k}"), ami.get(k - 1).copied().unwrap_or(f64::NAN));
    }

    out.insert("mami", mean(&ami));
    out.insert("stdami", std_pop(&ami));

    let lami = ami.len();
    let dami: Vec<f64> = ami.windows(2).map(|w| w[1] - w[0]).collect();
    let extrema: Vec<usize> = (0..dami.len().saturating_sub(1))
        .filter(|&i| dami[i] * dami[i + 1] < 0.0)
        .collect();
    out.insert("pextrema", extrema.len() as f64 / (lami as f64 - 1.0));
    out.insert(
        "fmmi",
        extrema.first().map_or(lami as f64, |&i| (i + 1) as f64),
    );
    Ok(out)
}

/// `CO_CompareMinAMI`: variability of the first AMI minimum across bin
/// counts.
///
/// For every bin count the histogram AMI is evaluated at lags
/// `0..=ceil(N/2)` and the lag of its first local extremum is taken (the
/// last lag when there is none). The record summarises those lags:
/// `min, max, range, median, mean, std, nunique, mode, modef, conv4,
/// nlocmax`.
pub fn compare_min_ami(y: &[f64], policy: AmiBinning, num_bins: &[usize]) -> Result<FeatureRecord> {
    if num_bins.is_empty() || num_bins.contains(&0) {
        return Err(crate::error::HctsaError::InvalidParameter(
            "bin counts must be a non-empty list of positive integers".into(),
        ));
    }
    let n = y.len();
    let max_lag = n.div_ceil(2);
    let constant = n < 2 || is_constant(y);

    let mins: Vec<f64> = num_bins
        .iter()
        .map(|&bins| {
            if constant {
                return f64::NAN;
            }
            let edges = ami_bin_edges(y, policy, bins);
            let ami: Vec<f64> = (0..=max_lag)
                .map(|lag| histogram_ami_on_edges(y, lag, &edges))
                .collect();
            (2..ami.len())
                .find(|&j| (ami[j] - ami[j - 1]) * (ami[j - 1] - ami[j - 2]) < 0.0)
                .map_or(max_lag as f64, |j| (j - 1) as f64)
        })
        .collect();

    let mut out = FeatureRecord::with_capacity(11);
    let lo = min(&mins);
    let hi = max(&mins);
    let mu = mean(&mins);
    let sigma = std_dev(&mins);
    out.insert("min", lo);
    out.insert("max", hi);
    out.insert("range", hi - lo);
    out.insert("median", median(&mins));
    out.insert("mean", mu);
    out.insert("std", sigma);

    let mut unique = mins.clone();
    unique.sort_by(|a, b| a.total_cmp(b));
    unique.dedup();
    out.insert("nunique", unique.len() as f64);

    let (mode_value, mode_count) = mode(&mins);
    out.insert("mode", mode_value);
    out.insert("modef", mode_count as f64 / mins.len() as f64);

    let tail = &mins[mins.len().saturating_sub(5)..];
    out.insert("conv4", mean(tail));

    let d: Vec<f64> = mins[..mins.len().saturating_sub(1)]
        .windows(2)
        .map(|w| w[1] - w[0])
        .collect();
    let crossings = sign_change_indices(&d);
    let nlocmax = (0..d.len())
        .filter(|&i| d[i] > 0.0 && crossings.contains(&i))
        .map(|i| i + 1)
        .filter(|&i| mins[i] > mu + sigma)
        .count();
    out.insert("nlocmax", nlocmax as f64);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    fn sine(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.2).sin()).collect()
    }

    #[test]
    fn lag_zero_is_marginal_entropy() {
        let y = noise(500, 3);
        let edges = ami_bin_edges(&y, AmiBinning::Even, 10);
        let counts = crate::binning::histogram(&y, &edges);
        let entropy: f64 = counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / y.len() as f64;
                -p * p.ln()
            })
            .sum();
        assert_relative_eq!(
            histogram_ami_at(&y, 0, AmiBinning::Even, 10),
            entropy,
            epsilon = 1e-10
        );
    }

    #[test]
    fn shuffled_series_has_little_ami() {
        let mut y = sine(2000);
        let mut rng = StdRng::seed_from_u64(11);
        y.shuffle(&mut rng);
        let ami = histogram_ami_at(&y, 1, AmiBinning::Even, 5);
        assert!(ami >= 0.0);
        assert!(ami < 0.05, "ami = {ami}");
    }

    #[test]
    fn constant_series_is_nan() {
        let y = vec![2.0; 50];
        assert!(histogram_ami_at(&y, 1, AmiBinning::Even, 10).is_nan());
        let rec = histogram_ami(&y, &AmiLags::List(vec![1, 2]), AmiBinning::Even, 10).unwrap();
        assert!(rec.is_nan());
    }

    #[test]
    fn list_keys_follow_position() {
        let y = sine(200);
        let rec = histogram_ami(&y, &AmiLags::List(vec![3, 1]), AmiBinning::Quantiles, 8).unwrap();
        let rec = rec.as_record().unwrap();
        let keys: Vec<&str> = rec.keys().collect();
        assert_eq!(keys, vec!["ami1", "ami2"]);
        assert_relative_eq!(
            rec["ami1"],
            histogram_ami_at(&y, 3, AmiBinning::Quantiles, 8),
            epsilon = 1e-12
        );
    }

    #[test]
    fn list_with_lags_beyond_series_is_partly_nan() {
        let y = sine(20);
        let rec = histogram_ami(&y, &AmiLags::List(vec![1, 19, 25]), AmiBinning::Even, 4).unwrap();
        let rec = rec.as_record().unwrap();
        assert!(rec["ami1"].is_finite());
        assert!(rec["ami2"].is_nan());
        assert!(rec["ami3"].is_nan());
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn lag_beyond_series_is_nan() {
        let y = sine(20);
        let v = histogram_ami(&y, &AmiLags::from(25), AmiBinning::Even, 4).unwrap();
        assert!(v.as_scalar().unwrap().is_nan());
    }

    #[test]
    fn gaussian_ami_matches_correlation() {
        let y = sine(100);
        let r = pearson(&y[..99], &y[1..]);
        assert_relative_eq!(gaussian_ami(&y, 1), -0.5 * (1.0 - r * r).ln(), epsilon = 1e-12);
        assert!(gaussian_ami(&y, 100).is_nan());
    }

    #[test]
    fn auto_mutual_info_sorts_and_truncates() {
        let y = noise(12, 5);
        let out = auto_mutual_info(&y, &AmiLags::List(vec![8, 2, 6]), &AmiMethod::Gaussian).unwrap();
        let rec = out.as_record().unwrap();
        let keys: Vec<&str> = rec.keys().collect();
        assert_eq!(keys, vec!["ami2", "ami6", "ami8"]);
        assert!(rec["ami2"].is_finite());
        assert!(rec["ami6"].is_finite());
        assert!(rec["ami8"].is_nan());
    }

    #[test]
    fn auto_mutual_info_symbolic_lag() {
        let y = sine(300);
        let tau = Lag::FirstZeroCrossing.resolve(&y).unwrap();
        let out = auto_mutual_info(&y, &AmiLags::Single(Lag::FirstZeroCrossing), &AmiMethod::Gaussian)
            .unwrap();
        assert_relative_eq!(out.as_scalar().unwrap(), gaussian_ami(&y, tau), epsilon = 1e-12);
    }

    #[test]
    fn external_method_failure_propagates() {
        let y = sine(50);
        let method = AmiMethod::External {
            provider: &crate::information::NativeProvider,
            method: MiMethod::Kernel,
        };
        assert!(auto_mutual_info(&y, &AmiLags::from(1), &method).is_err());
    }

    #[test]
    fn stats_keys_and_caps() {
        let y = sine(40);
        let rec = auto_mutual_info_stats(&y, Some(30), &AmiMethod::Gaussian).unwrap();
        assert!(rec.contains_key("ami30"));
        assert!(rec["ami20"].is_finite());
        assert!(rec["ami21"].is_nan());
        for key in ["mami", "stdami", "pextrema", "fmmi"] {
            assert!(rec.contains_key(key));
        }
        assert_eq!(rec.len(), 34);
    }

    #[test]
    fn stats_default_range() {
        let y = sine(100);
        let rec = auto_mutual_info_stats(&y, None, &AmiMethod::Gaussian).unwrap();
        assert_eq!(rec.len(), 25 + 4);
        assert!(rec["mami"] > 0.0);
        assert!(rec["fmmi"] >= 1.0 && rec["fmmi"] <= 25.0);
    }

    #[test]
    fn compare_min_ami_summary() {
        let y = sine(300);
        let rec = compare_min_ami(&y, AmiBinning::Even, &[2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
        assert_eq!(rec.len(), 11);
        assert!(rec["min"] <= rec["median"] && rec["median"] <= rec["max"]);
        assert_relative_eq!(rec["range"], rec["max"] - rec["min"]);
        assert!(rec["modef"] > 0.0 && rec["modef"] <= 1.0);
        assert!(rec["nunique"] >= 1.0);
    }

    #[test]
    fn compare_min_ami_rejects_empty_bins() {
        assert!(compare_min_ami(&sine(50), AmiBinning::Even, &[]).is_err());
    }
}
