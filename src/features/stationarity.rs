//! Stationarity measures: derivative spreads, segment means and local
//! segment statistics.

use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::FeatureRecord;
use crate::correlation::{autocorr, autocorr_at, first_crossing, AcfLags, AcfMethod};
use crate::entropy::{sampenc, sample_entropy};
use crate::error::{HctsaError, Result};
use crate::transform::{buffer_means, warn_if_not_zscored};
use crate::utils::optimization::curve_fit;
use crate::utils::stats::{diff, iqr, kurtosis, linspace, mean, median, skewness, std_dev};

/// `SY_StdNthDer`: sample standard deviation of the `n`-th difference.
///
/// # Errors
/// `InsufficientData` when `n` differences leave nothing.
pub fn std_nth_der(y: &[f64], n: usize) -> Result<f64> {
    if y.len() <= n {
        return Err(HctsaError::InsufficientData {
            needed: n + 1,
            got: y.len(),
        });
    }
    let mut d = y.to_vec();
    for _ in 0..n {
        d = diff(&d);
    }
    Ok(std_dev(&d))
}

/// `SY_StdNthDerChange`: exponential fit `a·exp(b·n)` to
/// [`std_nth_der`] over orders `n = 1..=maxd`.
///
/// Keys `fexp_a, fexp_b, fexp_r2, fexp_adjr2, fexp_rmse`; the adjusted R²
/// and RMSE use `maxd - 2` degrees of freedom. A failed fit gives NaN.
///
/// # Errors
/// `InvalidParameter` when `maxd < 3`, `InsufficientData` when the series
/// cannot be differenced `maxd` times.
pub fn std_nth_der_change(y: &[f64], maxd: usize) -> Result<FeatureRecord> {
    if maxd < 3 {
        return Err(HctsaError::InvalidParameter(format!(
            "need at least 3 derivative orders for a two-parameter fit, got {maxd}"
        )));
    }
    let ms = (1..=maxd)
        .map(|n| std_nth_der(y, n))
        .collect::<Result<Vec<f64>>>()?;
    let orders: Vec<f64> = (1..=maxd).map(|n| n as f64).collect();

    let keys = ["fexp_a", "fexp_b", "fexp_r2", "fexp_adjr2", "fexp_rmse"];
    let b0 = 0.5 * (ms[maxd - 1] - ms[0]).signum();
    let Some(fit) = curve_fit(|x, p| p[0] * (p[1] * x).exp(), &orders, &ms, &[1.0, b0]) else {
        log::warn!("nth derivative change: exponential fit failed");
        return Ok(FeatureRecord::nan_filled(&keys));
    };

    let dof = (maxd - 2) as f64;
    let ssr: f64 = fit.residuals.iter().map(|r| r * r).sum();
    let r2 = fit.r_squared;
    let mut out = FeatureRecord::with_capacity(keys.len());
    out.insert("fexp_a", fit.params[0]);
    out.insert("fexp_b", fit.params[1]);
    out.insert("fexp_r2", r2);
    out.insert("fexp_adjr2", 1.0 - (1.0 - r2) * (maxd - 1) as f64 / dof);
    out.insert("fexp_rmse", (ssr / dof).sqrt());
    Ok(out)
}

/// Length of the local segments in [`spread_random_local`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentLength {
    Fixed(usize),
    /// A multiple of the first zero crossing of the autocorrelation
    /// (`"ac2"`, `"ac5"`).
    AcMultiple(usize),
}

impl Default for SegmentLength {
    fn default() -> Self {
        SegmentLength::Fixed(100)
    }
}

impl FromStr for SegmentLength {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ac2" => Ok(SegmentLength::AcMultiple(2)),
            "ac5" => Ok(SegmentLength::AcMultiple(5)),
            other => other.parse::<usize>().map(SegmentLength::Fixed).map_err(|_| {
                HctsaError::InvalidParameter(format!("unknown segment length '{other}'"))
            }),
        }
    }
}

const LOCAL_STATS: [&str; 8] = [
    "mean",
    "std",
    "skew",
    "kurt",
    "sampen1_015",
    "ac1",
    "ac2",
    "taul",
];

fn local_stats(segment: &[f64]) -> [f64; 8] {
    let ac = autocorr(segment, &AcfLags::List(vec![1, 2]), AcfMethod::Fourier);
    let sampen = sample_entropy(segment, 1, Some(0.15), None);
    [
        mean(segment),
        std_dev(segment),
        skewness(segment),
        kurtosis(segment),
        sampen.get("quadSampEn1").unwrap_or(f64::NAN),
        ac[0],
        ac[1],
        first_crossing(segment, 0.0).map_or(f64::NAN, |c| c.continuous),
    ]
}

fn spread_keys() -> Vec<String> {
    let mut keys: Vec<String> = LOCAL_STATS.iter().map(|s| format!("mean{s}")).collect();
    keys.extend(LOCAL_STATS.iter().map(|s| format!("std{s}")));
    keys
}

/// `SY_SpreadRandomLocal`: statistics of `num_segs` randomly placed local
/// segments.
///
/// In each segment the mean, standard deviation, skewness, excess kurtosis,
/// `quadSampEn1` at `r = 0.15`, lag 1 and 2 autocorrelations and the
/// continuous first zero crossing are computed. The record holds their
/// NaN-ignoring means (`mean*`) and standard deviations (`std*`). Segment
/// starts are drawn from an RNG seeded with `seed`.
///
/// A segment longer than 90% of the series, or an autocorrelation-based
/// length that cannot be resolved, gives an all-NaN record.
///
/// # Errors
/// `InvalidParameter` for a zero segment length or zero segments.
pub fn spread_random_local(
    y: &[f64],
    length: SegmentLength,
    num_segs: usize,
    seed: u64,
) -> Result<FeatureRecord> {
    if num_segs == 0 {
        return Err(HctsaError::InvalidParameter(
            "number of segments must be positive".into(),
        ));
    }
    let keys = spread_keys();
    let l = match length {
        SegmentLength::Fixed(0) | SegmentLength::AcMultiple(0) => {
            return Err(HctsaError::InvalidParameter(
                "segment length must be positive".into(),
            ))
        }
        SegmentLength::Fixed(l) => l,
        SegmentLength::AcMultiple(k) => match first_crossing(y, 0.0) {
            Some(c) => {
                let l = k * c.discrete;
                if l < 5 {
                    log::warn!(
                        "spread random local: very short correlation length, segments of {} points",
                        l
                    );
                }
                l
            }
            None => {
                log::warn!("spread random local: autocorrelation undefined");
                return Ok(FeatureRecord::nan_filled(&keys));
            }
        },
    };

    let n = y.len();
    if l as f64 > 0.9 * n as f64 || l >= n {
        log::warn!(
            "spread random local: series of length {} is too short for segments of {}",
            n,
            l
        );
        return Ok(FeatureRecord::nan_filled(&keys));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<[f64; 8]> = (0..num_segs)
        .map(|_| {
            let start = rng.gen_range(0..n - l);
            local_stats(&y[start..start + l])
        })
        .collect();

    let column = |j: usize| -> Vec<f64> {
        rows.iter()
            .map(|row| row[j])
            .filter(|v| !v.is_nan())
            .collect()
    };
    let mut out = FeatureRecord::with_capacity(keys.len());
    for (j, name) in LOCAL_STATS.iter().enumerate() {
        out.insert(format!("mean{name}"), mean(&column(j)));
    }
    for (j, name) in LOCAL_STATS.iter().enumerate() {
        out.insert(format!("std{name}"), std_dev(&column(j)));
    }
    Ok(out)
}

/// How [`stat_av`] cuts the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatAv {
    /// This many equal segments, dropping the remainder (`"seg"`).
    Segments(usize),
    /// Segments of this length (`"len"`).
    Length(usize),
}

impl Default for StatAv {
    fn default() -> Self {
        StatAv::Segments(5)
    }
}

/// `SY_StatAv`: standard deviation of segment means over the standard
/// deviation of the series.
///
/// Near zero for mean-stationary data. Segment lengths need the series to
/// be longer than two segments; otherwise NaN with a warning.
///
/// # Errors
/// `InvalidParameter` for fewer than two segments or a zero length.
pub fn stat_av(y: &[f64], how: StatAv) -> Result<f64> {
    let n = y.len();
    let means = match how {
        StatAv::Segments(k) if k < 2 => {
            return Err(HctsaError::InvalidParameter(format!(
                "need at least 2 segments, got {k}"
            )))
        }
        StatAv::Length(0) => {
            return Err(HctsaError::InvalidParameter(
                "segment length must be positive".into(),
            ))
        }
        StatAv::Segments(k) => {
            let p = n / k;
            if p == 0 {
                log::warn!("stat_av: series of length {} cannot make {} segments", n, k);
                return Ok(f64::NAN);
            }
            let mut means = buffer_means(y, p);
            means.truncate(k);
            means
        }
        StatAv::Length(l) => {
            if n <= 2 * l {
                log::warn!(
                    "stat_av: series of length {} is too short for segments of {}",
                    n,
                    l
                );
                return Ok(f64::NAN);
            }
            buffer_means(y, l)
        }
    };
    Ok(std_dev(&means) / std_dev(y))
}

/// Which points [`local_global`] compares with the whole series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalSubset {
    /// The first `n` points (`"l"`).
    First(usize),
    /// An initial proportion in `(0, 1]` (`"p"`).
    Proportion(f64),
    /// `n` evenly spaced points (`"unicg"`).
    Uniform(usize),
    /// `n` points drawn with replacement (`"randcg"`).
    Random(usize),
}

impl Default for LocalSubset {
    fn default() -> Self {
        LocalSubset::First(100)
    }
}

const LOCAL_GLOBAL_KEYS: [&str; 8] = [
    "absmean",
    "std",
    "median",
    "iqr",
    "skewness",
    "kurtosis",
    "ac1",
    "sampen101",
];

fn subset_indices(n: usize, subset: LocalSubset, seed: u64) -> Result<Vec<usize>> {
    if let LocalSubset::Proportion(p) = subset {
        if !(p > 0.0 && p <= 1.0) {
            return Err(HctsaError::InvalidParameter(format!(
                "subset proportion must be in (0, 1], got {p}"
            )));
        }
    }
    if n == 0 {
        return Ok(Vec::new());
    }
    Ok(match subset {
        LocalSubset::First(k) => (0..k.min(n)).collect(),
        LocalSubset::Proportion(p) => (0..((n as f64 * p).ceil() as usize).min(n)).collect(),
        LocalSubset::Uniform(k) => linspace(1.0, n as f64, k)
            .iter()
            .map(|v| v.round() as usize - 1)
            .collect(),
        LocalSubset::Random(k) => {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..k).map(|_| rng.gen_range(0..n)).collect()
        }
    })
}

/// `SY_LocalGlobal`: statistics of a subset of a z-scored series against the
/// whole.
///
/// `absmean`, `std` and `median` are taken on the subset alone; `iqr`,
/// `skewness`, `kurtosis` (Pearson) and `ac1` are `|1 - subset/whole|`, and
/// `sampen101` is the ratio of sample entropies at `m = 1`, `r = 0.1`.
/// Random subsets draw from an RNG seeded with `seed`. Fewer than five
/// subset points give an all-NaN record.
///
/// # Errors
/// `InvalidParameter` for a proportion outside `(0, 1]`.
pub fn local_global(y: &[f64], subset: LocalSubset, seed: u64) -> Result<FeatureRecord> {
    warn_if_not_zscored(y, "local_global");
    let indices = subset_indices(y.len(), subset, seed)?;
    if indices.len() < 5 {
        log::warn!(
            "local_global: subset of {} points from a series of length {} is too small",
            indices.len(),
            y.len()
        );
        return Ok(FeatureRecord::nan_filled(&LOCAL_GLOBAL_KEYS));
    }
    let local: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
    let relative = |a: f64, b: f64| (1.0 - a / b).abs();
    let sampen = |v: &[f64]| sampenc(v, 1, 0.1).e[0];

    let mut out = FeatureRecord::with_capacity(LOCAL_GLOBAL_KEYS.len());
    out.insert("absmean", mean(&local).abs());
    out.insert("std", std_dev(&local));
    out.insert("median", median(&local));
    out.insert("iqr", relative(iqr(&local), iqr(y)));
    out.insert("skewness", relative(skewness(&local), skewness(y)));
    out.insert(
        "kurtosis",
        relative(kurtosis(&local) + 3.0, kurtosis(y) + 3.0),
    );
    out.insert("ac1", relative(autocorr_at(&local, 1), autocorr_at(y, 1)));
    out.insert("sampen101", sampen(&local) / sampen(y));
    Ok(out)
}
