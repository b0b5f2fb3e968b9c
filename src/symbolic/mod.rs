//! Symbolisation of series and statistics of the resulting sequences.
//!
//! # Example
//!
//! ```
//! use anofox_hctsa::symbolic::{coarse_grain, CoarseGrain};
//!
//! let y: Vec<f64> = (1..=10).map(f64::from).collect();
//! let symbols = coarse_grain(&y, CoarseGrain::Quantile { groups: 2 }).unwrap();
//! assert_eq!(symbols, vec![1, 1, 1, 1, 1, 2, 2, 2, 2, 2]);
//! ```

pub mod binary_stats;
pub mod coarse_grain;
pub mod motifs;
pub mod surprise;
pub mod transition;

pub use binary_stats::{binary_stats, binary_stretch, run_lengths, Stretch};
pub use coarse_grain::{binarize, coarse_grain, BinarizeMethod, CoarseGrain};
pub use motifs::{entropy, motif_three, motif_two, word_probabilities, MotifCoarseGrain};
pub use surprise::{surprise, Memory, Prior, SurpriseConfig};
pub use transition::transition_matrix;
