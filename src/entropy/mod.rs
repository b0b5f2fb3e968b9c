//! Entropy estimators.
//!
//! Sample entropy excludes self-matches and uses a strict tolerance;
//! approximate entropy includes them and uses `<=`. The two are therefore
//! not interchangeable on the same `r`.

pub mod approximate;
pub mod permutation;
pub mod sample;

pub use approximate::approximate_entropy;
pub use permutation::{lehmer_code, ordinal_pattern_counts, permutation_entropy};
pub use sample::{multiscale_entropy, sample_entropy, sampenc, SampEnCounts};
