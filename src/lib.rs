//! # anofox-hctsa
//!
//! Time series feature-extraction operations.
//!
//! Every operation takes a univariate `&[f64]` plus typed parameters and
//! returns a scalar or a [`FeatureRecord`](core::FeatureRecord) of named
//! statistics: autocorrelation structure, automutual information, symbolic
//! dynamics, entropy estimates, fluctuation scaling and a set of
//! higher-level operations composed from them.
//!
//! Misuse of an operation (unknown method, impossible parameters) returns
//! an [`HctsaError`]. Data that are merely unsuitable (too short, constant)
//! give NaN values and a `log::warn!` diagnostic.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod binning;
pub mod core;
pub mod correlation;
pub mod entropy;
pub mod error;
pub mod features;
pub mod information;
pub mod scaling;
pub mod symbolic;
pub mod transform;
pub mod utils;

pub use error::{HctsaError, Result};

pub mod prelude {
    pub use crate::core::{FeatureRecord, FeatureValue, Lag};
    pub use crate::correlation::{autocorr, co_first_crossing, first_min, AcfLags, AcfMethod};
    pub use crate::entropy::{approximate_entropy, permutation_entropy, sample_entropy};
    pub use crate::error::{HctsaError, Result};
    pub use crate::information::{auto_mutual_info, histogram_ami, AmiLags, AmiMethod};
    pub use crate::scaling::{fast_dfa, fluct_anal, FluctAnalConfig};
    pub use crate::symbolic::{coarse_grain, CoarseGrain};
    pub use crate::transform::zscore;
}
