//! Numerical utilities shared by the operations.

pub mod ols;
pub mod optimization;
pub mod robust;
pub mod spline;
pub mod stats;

pub use ols::{linear_fit, linear_residuals, polyfit, polyfit_residuals, polyval};
pub use optimization::{curve_fit, nelder_mead, CurveFit, NelderMeadConfig, NelderMeadResult};
pub use robust::{robust_linear_fit, RobustLineFit};
pub use spline::spline_not_a_knot;
pub use stats::{mean, median, quantile_hazen, quantiles_hazen, std_dev, variance};
