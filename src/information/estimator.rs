//! Interface to mutual-information estimators that live outside the crate.
//!
//! Kernel and Kraskov estimators are provided by an external toolkit. The
//! operations only talk to it through [`EstimatorProvider`] and
//! [`MutualInfoEstimator`], so the toolkit can be bound through FFI, a
//! subprocess or a native implementation without touching any caller.
//! [`NativeProvider`] implements the Gaussian estimator and reports the
//! others as unavailable.

use std::fmt;
use std::str::FromStr;

use crate::error::{HctsaError, Result};
use crate::utils::stats::pearson;

/// Default number of nearest neighbours for the Kraskov estimators.
pub const DEFAULT_K_NEIGHBORS: usize = 3;

/// Mutual-information estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiMethod {
    Gaussian,
    Kernel,
    Kraskov1,
    Kraskov2,
}

impl FromStr for MiMethod {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gaussian" => Ok(MiMethod::Gaussian),
            "kernel" => Ok(MiMethod::Kernel),
            "kraskov1" => Ok(MiMethod::Kraskov1),
            "kraskov2" => Ok(MiMethod::Kraskov2),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown mutual information estimation method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for MiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MiMethod::Gaussian => "gaussian",
            MiMethod::Kernel => "kernel",
            MiMethod::Kraskov1 => "kraskov1",
            MiMethod::Kraskov2 => "kraskov2",
        };
        f.write_str(name)
    }
}

/// A configured univariate mutual-information calculator.
pub trait MutualInfoEstimator {
    /// Provide paired observations. Replaces any previous observations.
    fn set_observations(&mut self, x: &[f64], y: &[f64]) -> Result<()>;

    /// Average mutual information of the current observations, in nats.
    fn compute(&self) -> Result<f64>;
}

/// Factory for estimators.
pub trait EstimatorProvider {
    /// Create an estimator for `method`.
    ///
    /// `k_neighbors` applies to the Kraskov estimators; `add_noise` controls
    /// whether they jitter the data (off for deterministic results).
    fn initialize(
        &self,
        method: MiMethod,
        k_neighbors: usize,
        add_noise: bool,
    ) -> Result<Box<dyn MutualInfoEstimator>>;
}

/// Provider backed by the in-crate Gaussian estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProvider;

impl EstimatorProvider for NativeProvider {
    fn initialize(
        &self,
        method: MiMethod,
        _k_neighbors: usize,
        _add_noise: bool,
    ) -> Result<Box<dyn MutualInfoEstimator>> {
        match method {
            MiMethod::Gaussian => Ok(Box::new(GaussianEstimator::default())),
            other => Err(HctsaError::ExternalFailure(format!(
                "no '{other}' mutual information estimator is available"
            ))),
        }
    }
}

/// Closed-form mutual information of a bivariate Gaussian.
#[derive(Debug, Clone, Default)]
pub struct GaussianEstimator {
    correlation: Option<f64>,
}

impl MutualInfoEstimator for GaussianEstimator {
    fn set_observations(&mut self, x: &[f64], y: &[f64]) -> Result<()> {
        if x.len() != y.len() {
            return Err(HctsaError::DimensionMismatch {
                expected: x.len(),
                got: y.len(),
            });
        }
        self.correlation = Some(pearson(x, y));
        Ok(())
    }

    fn compute(&self) -> Result<f64> {
        let r = self.correlation.ok_or_else(|| {
            HctsaError::InvalidParameter("observations must be set before computing".into())
        })?;
        Ok(gaussian_mi_from_correlation(r))
    }
}

/// `-½·ln(1 - r²)`.
pub fn gaussian_mi_from_correlation(r: f64) -> f64 {
    -0.5 * (1.0 - r * r).ln()
}

/// Mutual information of two vectors through a provider.
pub fn mutual_info(
    y1: &[f64],
    y2: &[f64],
    method: MiMethod,
    provider: &dyn EstimatorProvider,
) -> Result<f64> {
    let mut estimator = provider.initialize(method, DEFAULT_K_NEIGHBORS, false)?;
    estimator.set_observations(y1, y2)?;
    estimator.compute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn native_gaussian_estimator() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.2, 1.9, 3.3, 3.8, 5.1];
        let r = pearson(&x, &y);
        let mi = mutual_info(&x, &y, MiMethod::Gaussian, &NativeProvider).unwrap();
        assert_relative_eq!(mi, -0.5 * (1.0 - r * r).ln(), epsilon = 1e-12);
    }

    #[test]
    fn native_provider_reports_missing_estimators() {
        let err = NativeProvider
            .initialize(MiMethod::Kraskov1, 3, false)
            .err()
            .unwrap();
        assert!(matches!(err, HctsaError::ExternalFailure(_)));
    }

    #[test]
    fn compute_before_observations_fails() {
        let est = GaussianEstimator::default();
        assert!(est.compute().is_err());
    }

    #[test]
    fn mismatched_observations() {
        let mut est = GaussianEstimator::default();
        assert!(est.set_observations(&[1.0, 2.0], &[1.0]).is_err());
    }

    struct ConstantEstimator(f64);

    impl MutualInfoEstimator for ConstantEstimator {
        fn set_observations(&mut self, _x: &[f64], _y: &[f64]) -> Result<()> {
            Ok(())
        }
        fn compute(&self) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct FixedProvider;

    impl EstimatorProvider for FixedProvider {
        fn initialize(
            &self,
            method: MiMethod,
            k_neighbors: usize,
            _add_noise: bool,
        ) -> Result<Box<dyn MutualInfoEstimator>> {
            assert_eq!(method, MiMethod::Kraskov2);
            Ok(Box::new(ConstantEstimator(k_neighbors as f64)))
        }
    }

    #[test]
    fn external_provider_is_called_with_defaults() {
        let mi = mutual_info(&[1.0, 2.0], &[2.0, 1.0], MiMethod::Kraskov2, &FixedProvider).unwrap();
        assert_eq!(mi, 3.0);
    }

    #[test]
    fn parse_methods() {
        assert_eq!("kernel".parse::<MiMethod>().unwrap(), MiMethod::Kernel);
        assert!("ksg".parse::<MiMethod>().is_err());
    }
}
