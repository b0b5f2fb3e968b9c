//! Scaling analyses of the integrated series.

pub mod dfa;
pub mod fluctuation;

pub use dfa::{dyadic_intervals, fast_dfa};
pub use fluctuation::{fluct_anal, FluctAnalConfig, Fluctuation};
