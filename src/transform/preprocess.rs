//! Optional pre-processing applied before some entropy estimates.

use std::str::FromStr;

use super::window::buffer_means;
use crate::correlation::first_crossing;
use crate::error::{HctsaError, Result};
use crate::utils::stats::diff;

/// A pre-processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreProcess {
    /// First difference.
    Diff1,
    /// Average non-overlapping windows as long as the first zero crossing
    /// of the autocorrelation function.
    RescaleTau,
}

impl PreProcess {
    pub fn apply(&self, y: &[f64]) -> Vec<f64> {
        match self {
            PreProcess::Diff1 => diff(y),
            PreProcess::RescaleTau => match first_crossing(y, 0.0) {
                Some(c) if c.discrete > 0 => buffer_means(y, c.discrete),
                _ => {
                    log::warn!("rescale_tau: autocorrelation is undefined, series left unchanged");
                    y.to_vec()
                }
            },
        }
    }
}

impl FromStr for PreProcess {
    type Err = HctsaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "diff1" => Ok(PreProcess::Diff1),
            "rescale_tau" => Ok(PreProcess::RescaleTau),
            other => Err(HctsaError::InvalidParameter(format!(
                "unknown preprocessing setting '{other}'"
            ))),
        }
    }
}

/// Apply an optional pre-processing step.
pub fn preprocess(y: &[f64], how: Option<PreProcess>) -> Vec<f64> {
    match how {
        Some(p) => p.apply(y),
        None => y.to_vec(),
    }
}
