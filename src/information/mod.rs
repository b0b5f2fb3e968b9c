//! Mutual-information estimators.
//!
//! Histogram, Moddemeijer and Gaussian estimators are native. Kernel and
//! Kraskov estimators are reached through [`EstimatorProvider`].

pub mod ami;
pub mod estimator;
pub mod moddemeijer;
pub mod mutual_info;
pub mod noise;

pub use ami::{
    auto_mutual_info, auto_mutual_info_stats, compare_min_ami, gaussian_ami, histogram_ami,
    histogram_ami_at, AmiLags, AmiMethod,
};
pub use estimator::{
    mutual_info, EstimatorProvider, GaussianEstimator, MiMethod, MutualInfoEstimator,
    NativeProvider, DEFAULT_K_NEIGHBORS,
};
pub use moddemeijer::{rm_ami, rm_information, RmApproach, RmEstimate};
pub use mutual_info::{mutual_information, EdgeRule};
pub use noise::{add_noise, NoiseAmi};
