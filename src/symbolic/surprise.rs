//! Surprise of the next symbol given a finite memory.

use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::coarse_grain::{coarse_grain, CoarseGrain};
use crate::core::FeatureRecord;
use crate::error::{HctsaError, Result};
use crate::utils::stats::{max, mean, median, min, quantile_hazen, std_dev};

/// What the memory window is used to estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prior {
    /// Symbol frequencies in the window.
    #[default]
    Dist,
    /// One-step transition frequencies in the window.
    T1,
    /// Two-step transition frequencies in the window.
    T2,
}

impl FromStr for Prior {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dist" => Ok(Prior::Dist),
            "T1" => Ok(Prior::T1),
            "T2" => Ok(Prior::T2),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown prior '{other}'"
            ))),
        }
    }
}

/// Length of the memory window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Memory {
    /// A fixed number of samples.
    Samples(usize),
    /// A proportion of the series length in `(0, 1)`, rounded up.
    Proportion(f64),
}

impl Memory {
    fn samples(&self, n: usize) -> Result<usize> {
        match *self {
            Memory::Samples(m) => Ok(m),
            Memory::Proportion(p) if p > 0.0 && p < 1.0 => Ok((p * n as f64).ceil() as usize),
            Memory::Proportion(p) => Err(HctsaError::InvalidParameter(format!(
                "memory proportion {p} is not in (0, 1)"
            ))),
        }
    }
}

/// Settings for [`surprise`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurpriseConfig {
    pub prior: Prior,
    pub memory: Memory,
    /// Symbolisation; the quantile methods carry the alphabet size.
    pub method: CoarseGrain,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for SurpriseConfig {
    fn default() -> Self {
        Self {
            prior: Prior::Dist,
            memory: Memory::Proportion(0.2),
            method: CoarseGrain::Quantile { groups: 3 },
            iterations: 500,
            seed: 0,
        }
    }
}

impl SurpriseConfig {
    pub fn with_prior(mut self, prior: Prior) -> Self {
        self.prior = prior;
        self
    }

    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.memory = memory;
        self
    }

    /// Set the alphabet size of a quantile or up-down symbolisation.
    pub fn with_groups(mut self, groups: usize) -> Self {
        self.method = match self.method {
            CoarseGrain::Quantile { .. } => CoarseGrain::Quantile { groups },
            CoarseGrain::UpDown { .. } => CoarseGrain::UpDown { groups },
            other => other,
        };
        self
    }

    pub fn with_method(mut self, method: CoarseGrain) -> Self {
        self.method = method;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

fn fraction(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Probability of `symbols[r]` under the prior learned from the window
/// `symbols[r - memory..r]`.
fn prior_probability(symbols: &[usize], r: usize, memory: usize, prior: Prior) -> f64 {
    let window = &symbols[r - memory..r];
    let next = symbols[r];
    match prior {
        Prior::Dist => fraction(window.iter().filter(|&&s| s == next).count(), window.len()),
        Prior::T1 => {
            let prev = symbols[r - 1];
            let followers: Vec<usize> = window
                .windows(2)
                .filter(|w| w[0] == prev)
                .map(|w| w[1])
                .collect();
            fraction(
                followers.iter().filter(|&&s| s == next).count(),
                followers.len(),
            )
        }
        Prior::T2 => {
            let (prev2, prev1) = (symbols[r - 2], symbols[r - 1]);
            let followers: Vec<usize> = window
                .windows(3)
                .filter(|w| w[0] == prev2 && w[1] == prev1)
                .map(|w| w[2])
                .collect();
            fraction(
                followers.iter().filter(|&&s| s == next).count(),
                followers.len(),
            )
        }
    }
}

/// `FC_Surprise`: information gained by each new symbol given the recent
/// past.
///
/// A random subset of at most `iterations` positions past the memory is
/// drawn with the seeded generator and sorted. At each position the
/// information gain `-ln p` of the observed symbol under the prior is
/// recorded, with `p = 0` contributing 0. Returns `min` (of positive
/// gains), `max, mean, sum, median, lq, uq, std` and `tstat`, the
/// t-statistic of the mean against a gain of 1.
///
/// # Errors
/// `InvalidParameter` when the memory is not shorter than the symbol
/// sequence or too short for the prior, plus coarse-graining errors.
pub fn surprise(y: &[f64], config: &SurpriseConfig) -> Result<FeatureRecord> {
    let symbols = coarse_grain(y, config.method)?;
    let n = symbols.len();
    let memory = config.memory.samples(y.len())?;
    let min_memory = match config.prior {
        Prior::Dist => 1,
        Prior::T1 => 2,
        Prior::T2 => 3,
    };
    if memory < min_memory || memory >= n {
        return Err(HctsaError::InvalidParameter(format!(
            "memory of {memory} samples does not fit a sequence of {n} symbols"
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut positions: Vec<usize> = (memory..n).collect();
    positions.shuffle(&mut rng);
    positions.truncate(config.iterations.min(positions.len()));
    positions.sort_unstable();

    let store: Vec<f64> = positions
        .iter()
        .map(|&r| {
            let p = prior_probability(&symbols, r, memory, config.prior);
            if p == 0.0 {
                0.0
            } else {
                -p.ln()
            }
        })
        .collect();

    let positive: Vec<f64> = store.iter().copied().filter(|&v| v > 0.0).collect();
    let mut out = FeatureRecord::with_capacity(9);
    out.insert(
        "min",
        if positive.is_empty() {
            f64::NAN
        } else {
            min(&positive)
        },
    );
    out.insert("max", max(&store));
    let mu = mean(&store);
    out.insert("mean", mu);
    out.insert("sum", store.iter().sum::<f64>());
    out.insert("median", median(&store));
    out.insert("lq", quantile_hazen(&store, 0.25));
    out.insert("uq", quantile_hazen(&store, 0.75));
    let sigma = std_dev(&store);
    out.insert("std", sigma);
    let tstat = if sigma == 0.0 {
        f64::NAN
    } else {
        ((mu - 1.0) / (sigma / (config.iterations as f64).sqrt())).abs()
    };
    out.insert("tstat", tstat);
    Ok(out)
}
