//! Sample entropy and its multiscale extension.

use crate::core::FeatureRecord;
use crate::error::Result;
use crate::transform::{buffer_means, preprocess, zscore, PreProcess};
use crate::utils::stats::{diff, mean, std_dev};

/// Shortest coarse-grained series a multiscale estimate is computed on.
const MIN_SCALE_LENGTH: usize = 20;

/// Template-match counts and entropies from [`sampenc`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampEnCounts {
    /// Sample entropy for template lengths `0..m_max`.
    pub e: Vec<f64>,
    /// Matching pairs of length `m + 1`.
    pub a: Vec<f64>,
    /// Matching pairs of length `m`, the first being all `N(N-1)/2` pairs.
    pub b: Vec<f64>,
}

/// Sample entropy for template lengths `0..m_max` by run counting.
///
/// Only pairs `j > i` are compared, so self-matches never count. Two points
/// match when `|y_j - y_i| < r`; a run of matches of length `k` contributes
/// to every template length up to `k`. Entropies are `-ln(A/B)`, infinite
/// when no longer template matches and NaN when nothing matched at all.
///
/// # Arguments
/// * `y` - input series
/// * `m_max` - number of template lengths
/// * `r` - match tolerance
pub fn sampenc(y: &[f64], m_max: usize, r: f64) -> SampEnCounts {
    let n = y.len();
    let mut lastrun = vec![0usize; n];
    let mut run = vec![0usize; n];
    let mut a = vec![0.0; m_max];
    let mut b_tail = vec![0.0; m_max];

    for i in 0..n.saturating_sub(1) {
        let nj = n - i - 1;
        let y1 = y[i];
        for jj in 0..nj {
            let j = i + jj + 1;
            if (y[j] - y1).abs() < r {
                run[jj] = lastrun[jj] + 1;
                let m1 = m_max.min(run[jj]);
                for m in 0..m1 {
                    a[m] += 1.0;
                    if j < n - 1 {
                        b_tail[m] += 1.0;
                    }
                }
            } else {
                run[jj] = 0;
            }
        }
        lastrun[..nj].copy_from_slice(&run[..nj]);
    }

    let pairs = (n * n.saturating_sub(1)) as f64 / 2.0;
    let mut b = Vec::with_capacity(m_max);
    if m_max > 0 {
        b.push(pairs);
        b.extend_from_slice(&b_tail[..m_max - 1]);
    }
    let e = a.iter().zip(b.iter()).map(|(&ai, &bi)| -(ai / bi).ln()).collect();
    SampEnCounts { e, a, b }
}

/// `EN_SampEn`: sample entropy for template lengths `0..=m`.
///
/// # Arguments
/// * `y` - input series
/// * `m` - largest embedding dimension
/// * `r` - tolerance; `0.1·std` of `y` when `None`
/// * `pre` - optional pre-processing applied after the tolerance is fixed
///
/// Keys `sampen0..sampenM`, `quadSampEn0..quadSampEnM` (`+ ln 2r`) and,
/// for `m > 1`, `meanchsampen`. A series without variance under the default
/// tolerance gives an all-NaN record.
pub fn sample_entropy(
    y: &[f64],
    m: usize,
    r: Option<f64>,
    pre: Option<PreProcess>,
) -> FeatureRecord {
    let mut keys: Vec<String> = (0..=m).map(|i| format!("sampen{i}")).collect();
    keys.extend((0..=m).map(|i| format!("quadSampEn{i}")));
    if m > 1 {
        keys.push("meanchsampen".to_string());
    }

    let r = match r {
        Some(r) => r,
        None => {
            let sd = std_dev(y);
            if sd.is_nan() || sd <= 0.0 {
                log::warn!("sample entropy: series has no variance, tolerance is undefined");
                return FeatureRecord::nan_filled(&keys);
            }
            0.1 * sd
        }
    };

    let y = preprocess(y, pre);
    let counts = sampenc(&y, m + 1, r);

    let mut out = FeatureRecord::with_capacity(keys.len());
    for (i, &e) in counts.e.iter().enumerate() {
        out.insert(format!("sampen{i}"), e);
    }
    let quad = (2.0 * r).ln();
    for (i, &e) in counts.e.iter().enumerate() {
        out.insert(format!("quadSampEn{i}"), e + quad);
    }
    if m > 1 {
        out.insert("meanchsampen", mean(&diff(&counts.e)));
    }
    out
}

/// `EN_mse`: sample entropy of coarse-grained copies of the series.
///
/// Each scale `s` averages non-overlapping windows of `s` samples and
/// computes `sampen{m}` with the absolute tolerance `r`. Scales leaving fewer
/// than 20 points give NaN. Summaries ignore NaN scales. When every scale is
/// NaN the record is `{out: NaN}`.
///
/// # Errors
/// Only from z-scoring the pre-processed series (empty or NaN input).
pub fn multiscale_entropy(
    y: &[f64],
    scales: &[usize],
    m: usize,
    r: f64,
    pre: Option<PreProcess>,
) -> Result<FeatureRecord> {
    let y = match pre {
        Some(p) => zscore(&p.apply(y))?,
        None => y.to_vec(),
    };

    let key = format!("sampen{m}");
    let samp_ens: Vec<f64> = scales
        .iter()
        .map(|&scale| {
            let coarse = buffer_means(&y, scale);
            if coarse.len() >= MIN_SCALE_LENGTH {
                sample_entropy(&coarse, m, Some(r), None)
                    .get(&key)
                    .unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        })
        .collect();

    if samp_ens.iter().all(|v| v.is_nan()) {
        log::warn!(
            "multiscale entropy: not enough samples ({}) to compute sample entropy at any scale",
            y.len()
        );
        let mut out = FeatureRecord::new();
        out.insert("out", f64::NAN);
        return Ok(out);
    }

    let mut out = FeatureRecord::with_capacity(scales.len() + 8);
    for (&scale, &v) in scales.iter().zip(samp_ens.iter()) {
        out.insert(format!("sampen_s{scale}"), v);
    }

    let finite: Vec<(usize, f64)> = scales
        .iter()
        .copied()
        .zip(samp_ens.iter().copied())
        .filter(|(_, v)| !v.is_nan())
        .collect();
    let (max_scale, max_value) = finite
        .iter()
        .copied()
        .fold((0, f64::NEG_INFINITY), |best, c| if c.1 > best.1 { c } else { best });
    let (min_scale, min_value) = finite
        .iter()
        .copied()
        .fold((0, f64::INFINITY), |best, c| if c.1 < best.1 { c } else { best });
    let values: Vec<f64> = finite.iter().map(|c| c.1).collect();
    let mu = mean(&values);
    let sigma = std_dev(&values);

    out.insert("maxSampEn", max_value);
    out.insert("maxScale", max_scale as f64);
    out.insert("minSampEn", min_value);
    out.insert("minScale", min_scale as f64);
    out.insert("meanSampEn", mu);
    out.insert("stdSampEn", sigma);
    out.insert("cvSampEn", sigma / mu);
    let changes: Vec<f64> = diff(&samp_ens).into_iter().filter(|v| !v.is_nan()).collect();
    out.insert("meanch", mean(&changes));
    Ok(out)
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

    /// Direct pair counting with the same conventions.
    fn brute_force(y: &[f64], m: usize, r: f64) -> (f64, f64) {
        let n = y.len();
        let matches = |len: usize, limit: usize| {
            let mut count = 0.0;
            for i in 0..limit {
                for j in (i + 1)..limit {
                    if (0..len).all(|k| (y[i + k] - y[j + k]).abs() < r) {
                        count += 1.0;
                    }
                }
            }
            count
        };
        // templates of length m that can be extended, and of length m + 1
        (matches(m, n - m), matches(m + 1, n - m))
    }

    #[test]
    fn counts_match_brute_force() {
        let y = noise(120, 8);
        let r = 0.3;
        let counts = sampenc(&y, 3, r);
        for m in 1..3 {
            let (b, a) = brute_force(&y, m, r);
            assert_relative_eq!(counts.b[m], b);
            assert_relative_eq!(counts.a[m], a);
        }
        assert_relative_eq!(counts.b[0], 120.0 * 119.0 / 2.0);
    }

    #[test]
    fn record_keys() {
        let y = noise(200, 1);
        let rec = sample_entropy(&y, 2, None, None);
        let keys: Vec<&str> = rec.keys().collect();
        assert_eq!(
            keys,
            vec![
                "sampen0",
                "sampen1",
                "sampen2",
                "quadSampEn0",
                "quadSampEn1",
                "quadSampEn2",
                "meanchsampen"
            ]
        );
        let r = 0.1 * std_dev(&y);
        assert_relative_eq!(rec["quadSampEn2"], rec["sampen2"] + (2.0 * r).ln());
    }

    #[test]
    fn periodic_is_more_regular_than_noise() {
        let periodic: Vec<f64> = (0..300).map(|i| (i as f64 * 0.3).sin()).collect();
        let random = noise(300, 4);
        let p = sample_entropy(&periodic, 2, Some(0.2), None);
        let w = sample_entropy(&random, 2, Some(0.2), None);
        assert!(p["sampen2"] < w["sampen2"]);
    }

    #[test]
    fn constant_series_is_nan() {
        let rec = sample_entropy(&[3.0; 50], 2, None, None);
        assert!(rec.all_nan());
        assert_eq!(rec.len(), 7);
    }

    #[test]
    fn no_longer_matches_is_infinite() {
        let y: Vec<f64> = (0..30).map(f64::from).collect();
        let counts = sampenc(&y, 2, 0.5);
        assert_eq!(counts.a[0], 0.0);
        assert!(counts.e[0].is_infinite());
    }

    #[test]
    fn multiscale_summary() {
        let y = noise(400, 2);
        let scales: Vec<usize> = (1..=10).collect();
        let rec = multiscale_entropy(&y, &scales, 2, 0.15, None).unwrap();
        assert!(rec["sampen_s1"].is_finite());
        assert!(!rec["sampen_s10"].is_nan());
        assert!(rec["minSampEn"] <= rec["meanSampEn"]);
        assert!(rec["meanSampEn"] <= rec["maxSampEn"]);
        assert!((1.0..=10.0).contains(&rec["maxScale"]));
    }

    #[test]
    fn multiscale_too_short() {
        let y = noise(30, 2);
        let rec = multiscale_entropy(&y, &[2, 3], 2, 0.15, None).unwrap();
        assert_eq!(rec.len(), 1);
        assert!(rec["out"].is_nan());
    }
}
