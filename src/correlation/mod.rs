//! Autocorrelation engine and the crossing/extremum finder built on it.
//!
//! # Example
//!
//! ```
//! use anofox_hctsa::correlation::{autocorr, first_crossing, AcfLags, AcfMethod};
//!
//! let y: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
//! let r = autocorr(&y, &AcfLags::List(vec![0, 1, 2]), AcfMethod::Fourier);
//! assert_eq!(r[0], 1.0);
//!
//! let crossing = first_crossing(&y, 0.0).unwrap();
//! assert!(crossing.continuous <= crossing.discrete as f64);
//! ```

pub mod autocorr;
pub mod crossing;
pub mod fft;
pub mod partial;

pub use autocorr::{acf, autocorr, autocorr_at, AcfLags, AcfMethod};
pub use crossing::{
    co_first_crossing, first_crossing, first_min, point_of_crossing, CorrelationFn, Crossing,
    CrossingOutput, Extremum, MinStatistic,
};
pub use fft::{autocorr_fft, fft_resample};
pub use partial::{partial_autocorr, PacfMethod};
