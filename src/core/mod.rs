//! Core data structures shared by all operations.

mod lag;
mod record;

pub use lag::Lag;
pub use record::{FeatureRecord, FeatureValue};
