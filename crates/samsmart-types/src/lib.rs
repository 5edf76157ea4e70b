//! Value types for SamSmart PD box sensor data.
//!
//! This crate provides the shared vocabulary used by the reconciliation
//! engine (samsmart-core) and any tool built on top of it.
//!
//! # Features
//!
//! - Source boxes and validated location tags
//! - Deployment timeframes and households
//! - Fixed-length bin widths for downsampling
//! - Wire types for records returned by the remote measurement API
//!
//! # Example
//!
//! ```
//! use samsmart_types::{BinWidth, Source, Tag};
//!
//! let tag: Tag = "ssh7".parse().unwrap();
//! let width: BinWidth = "10s".parse().unwrap();
//! assert_eq!(Source::Koffer1.to_string(), "koffer1");
//! # let _ = (tag, width);
//! ```

pub mod duration;
pub mod error;
#[cfg(feature = "serde")]
pub mod record;
pub mod types;

pub use duration::BinWidth;
pub use error::{ParseError, ParseResult};
#[cfg(feature = "serde")]
pub use record::{Scalar, SensorRecord, ValueRecord, ValueTypeRecord};
pub use types::{Household, SensorRole, Source, Tag, Timeframe};
