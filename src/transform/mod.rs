//! Series transformations used ahead of the operations.
//!
//! # Example
//!
//! ```
//! use anofox_hctsa::transform::{is_zscored, make_buffer, zscore};
//!
//! let series = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let z = zscore(&series).unwrap();
//! assert!(is_zscored(&z));
//!
//! let buffers = make_buffer(&series, 4);
//! assert_eq!(buffers.len(), 1);
//! ```

pub mod preprocess;
pub mod scale;
pub mod window;

pub use preprocess::{preprocess, PreProcess};
pub use scale::{is_zscored, zscore};
pub(crate) use scale::warn_if_not_zscored;
pub use window::{buffer_means, make_buffer, sign_change, sign_change_indices};
