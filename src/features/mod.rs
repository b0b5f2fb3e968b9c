//! Higher-level operations composed from the primitives.
//!
//! # Example
//!
//! ```
//! use anofox_hctsa::core::Lag;
//! use anofox_hctsa::features::{cid, trev};
//!
//! let y: Vec<f64> = (0..50).map(|i| (i as f64 * 0.4).sin()).collect();
//!
//! let asymmetry = trev(&y, Lag::Fixed(1)).unwrap();
//! assert!(asymmetry["raw"].abs() < 1.0);
//!
//! let complexity = cid(&y);
//! assert!(complexity["CE1_norm"] >= 1.0);
//! ```

pub mod autocorrelation;
pub mod complexity;
pub mod distribution;
pub mod embedding;
pub mod extremes;
pub mod fitting;
pub mod physics;
pub mod stationarity;

pub use autocorrelation::{
    autocorr_shape, fzcglscf, glscf, nonlinear_autocorr, partial_autocorr, tc3, trev, PacfMethod,
    StopWhen,
};
pub use complexity::cid;
pub use distribution::{
    burstiness, distribution_test, fit_mle, histogram_asymmetry, histogram_mode, BinCount,
    GofTest, MleFit,
};
pub use embedding::{embed2_basic, embed2_dist};
pub use extremes::moving_threshold;
pub use fitting::{DistributionFit, Family};
pub use physics::{force_potential, ForceParams, Potential};
pub use stationarity::{
    local_global, spread_random_local, stat_av, std_nth_der, std_nth_der_change, LocalSubset,
    SegmentLength, StatAv,
};
