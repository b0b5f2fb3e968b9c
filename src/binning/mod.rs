//! Histogram and binning utilities.
//!
//! Edges follow fixed conventions: Hazen quantile edges, a round-number bin
//! picker and a right-closed last bin.

pub mod edges;
pub mod histogram;

pub use edges::{
    ami_bin_edges, auto_edges, binpicker, nice_edges, simple_binner, AmiBinning, Binner,
};
pub use histogram::{bin_index, histogram, histogram2d, to_probabilities};
