//! Word statistics of symbolic sequences.

use std::str::FromStr;

use super::coarse_grain::{binarize, coarse_grain, BinarizeMethod, CoarseGrain};
use crate::core::FeatureRecord;
use crate::error::{HctsaError, Result};
use crate::utils::stats::diff;

/// Longest word length counted by the motif operations.
const MAX_WORD: usize = 4;

/// Probability of every word of length `len` over symbols `0..alphabet`.
///
/// Words are ordered lexicographically with the first symbol most
/// significant; probabilities are counts over the `N - len + 1` windows.
pub fn word_probabilities(symbols: &[usize], alphabet: usize, len: usize) -> Vec<f64> {
    let words = alphabet.pow(len as u32);
    let mut counts = vec![0usize; words];
    if len == 0 || symbols.len() < len {
        return vec![f64::NAN; words];
    }
    for window in symbols.windows(len) {
        let code = window.iter().fold(0, |acc, &s| acc * alphabet + s);
        counts[code] += 1;
    }
    let total = (symbols.len() - len + 1) as f64;
    counts.into_iter().map(|c| c as f64 / total).collect()
}

/// Shannon entropy (nats) of probabilities; zero entries contribute nothing.
pub fn entropy(p: &[f64]) -> f64 {
    -p.iter().filter(|&&v| v > 0.0).map(|v| v * v.ln()).sum::<f64>()
}

/// All words of length `len` spelled with `letters`, in code order.
fn word_names(letters: &[char], len: usize) -> Vec<String> {
    let mut names = vec![String::new()];
    for _ in 0..len {
        names = names
            .iter()
            .flat_map(|prefix| {
                letters.iter().map(move |c| {
                    let mut s = prefix.clone();
                    s.push(*c);
                    s
                })
            })
            .collect();
    }
    names
}

fn entropy_key(len: usize) -> String {
    "h".repeat(len)
}

fn motif_keys(letters: &[char]) -> Vec<String> {
    (1..=MAX_WORD)
        .flat_map(|len| {
            let mut keys = word_names(letters, len);
            keys.push(entropy_key(len));
            keys
        })
        .collect()
}

fn motif_record(symbols: &[usize], letters: &[char]) -> FeatureRecord {
    let alphabet = letters.len();
    let mut out = FeatureRecord::new();
    for len in 1..=MAX_WORD {
        let p = word_probabilities(symbols, alphabet, len);
        for (name, &v) in word_names(letters, len).into_iter().zip(p.iter()) {
            out.insert(name, v);
        }
        out.insert(entropy_key(len), entropy(&p));
    }
    out
}

/// `SB_MotifTwo`: word statistics of a binarised series.
///
/// `d` stands for 0 and `u` for 1. Keys `u, d, h` for single letters
/// (listed `u` first), then `dd..uu, hh` up to words of four letters.
/// Sequences shorter than five symbols give an all-NaN record.
pub fn motif_two(y: &[f64], method: BinarizeMethod) -> FeatureRecord {
    let letters = ['d', 'u'];
    let bits = binarize(y, method);
    let mut keys = motif_keys(&letters);
    keys.swap(0, 1);
    if bits.len() < 5 {
        log::warn!(
            "motif two: binary sequence of length {} is too short",
            bits.len()
        );
        return FeatureRecord::nan_filled(&keys);
    }
    let symbols: Vec<usize> = bits.iter().map(|&b| usize::from(b)).collect();
    let full = motif_record(&symbols, &letters);
    keys.iter()
        .map(|k| (k.as_str(), full.get(k).unwrap_or(f64::NAN)))
        .collect()
}

/// Coarse-graining used by [`motif_three`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotifCoarseGrain {
    /// Equiprobable alphabet by value.
    #[default]
    Quantile,
    /// Equiprobable alphabet by increment.
    DiffQuant,
}

impl FromStr for MotifCoarseGrain {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "quantile" => Ok(MotifCoarseGrain::Quantile),
            "diffquant" => Ok(MotifCoarseGrain::DiffQuant),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown coarse-graining method '{other}'"
            ))),
        }
    }
}

/// `SB_MotifThree`: word statistics of a three-letter equiprobable
/// alphabet (`a`, `b`, `c`), words of one to four letters with entropies
/// `h` to `hhhh`.
///
/// # Errors
/// `ComputationError` when one of the three letters never occurs.
pub fn motif_three(y: &[f64], method: MotifCoarseGrain) -> Result<FeatureRecord> {
    let source = match method {
        MotifCoarseGrain::Quantile => y.to_vec(),
        MotifCoarseGrain::DiffQuant => diff(y),
    };
    let symbols = coarse_grain(&source, CoarseGrain::Quantile { groups: 3 })?;
    let zero_based: Vec<usize> = symbols.iter().map(|s| s - 1).collect();
    Ok(motif_record(&zero_based, &['a', 'b', 'c']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn word_counts() {
        let s = [0, 1, 1, 0, 1];
        let p = word_probabilities(&s, 2, 2);
        // 01, 11, 10, 01
        assert_eq!(p, vec![0.0, 0.5, 0.25, 0.25]);
        assert!(word_probabilities(&s, 2, 6).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn entropy_ignores_zeros() {
        assert_relative_eq!(entropy(&[0.5, 0.5, 0.0]), 2f64.ln());
        assert_eq!(entropy(&[1.0]), 0.0);
    }

    #[test]
    fn names_in_code_order() {
        assert_eq!(word_names(&['d', 'u'], 2), vec!["dd", "du", "ud", "uu"]);
    }

    #[test]
    fn motif_two_alternating() {
        let y: Vec<f64> = (0..21).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }).collect();
        let rec = motif_two(&y, BinarizeMethod::Diff);
        let keys: Vec<&str> = rec.keys().take(3).collect();
        assert_eq!(keys, vec!["u", "d", "h"]);
        assert_relative_eq!(rec["u"], 0.5);
        assert_relative_eq!(rec["h"], 2f64.ln());
        assert_eq!(rec["uu"], 0.0);
        assert_eq!(rec["dd"], 0.0);
        assert_relative_eq!(rec["ud"] + rec["du"], 1.0);
        assert_eq!(rec.len(), 2 + 4 + 8 + 16 + 4);
    }

    #[test]
    fn motif_two_short_series() {
        let rec = motif_two(&[1.0, 2.0, 3.0], BinarizeMethod::Diff);
        assert!(rec.all_nan());
        assert!(rec.contains_key("hhhh"));
    }

    #[test]
    fn motif_three_probabilities_sum_to_one() {
        let y: Vec<f64> = (0..90).map(|i| ((i * 37) % 90) as f64).collect();
        let rec = motif_three(&y, MotifCoarseGrain::Quantile).unwrap();
        assert_relative_eq!(rec["a"], 1.0 / 3.0, epsilon = 1e-12);
        let pairs: f64 = word_names(&['a', 'b', 'c'], 2).iter().map(|k| rec[k.as_str()]).sum();
        assert_relative_eq!(pairs, 1.0, epsilon = 1e-12);
        assert_eq!(rec.len(), 3 + 9 + 27 + 81 + 4);
    }
}
