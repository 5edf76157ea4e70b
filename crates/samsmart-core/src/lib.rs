//! Time-series merge and reconciliation engine for SamSmart PD box sensor data.
//!
//! This crate turns irregularly sampled, per-sensor series fetched from the
//! SamSmart measurement API into analysis-ready tables on a shared timeline.
//!
//! # Features
//!
//! - **Timestamp indexing**: collapse same-timestamp readings of one sensor with an explicit rule
//! - **Outer join**: combine many sensors into one sparse, timestamp-keyed table
//! - **Merging**: index and join raw two-column tables with per-sensor rules
//! - **Downsampling**: rebin a table onto a fixed-width, epoch-aligned grid
//! - **Timeframe checks**: reject configurations deploying one box at two places at once
//! - **Fetching**: an HTTP client for the measurement API and concurrent per-timeframe collection
//!
//! # Data Flow
//!
//! | Step | Function | Output |
//! |------|----------|--------|
//! | De-duplicate one sensor | [`index_by_timestamp`] | [`IndexedSeries`] |
//! | Join sensors | [`outer_join_by_timestamp`] | [`WideTable`] |
//! | Both of the above on raw tables | [`merge`] | [`WideTable`] |
//! | Rebin | [`downsample`] | [`WideTable`] |
//!
//! # Quick Start
//!
//! ```
//! use samsmart_core::{Aggregation, AggregationMap, RawTable, downsample, merge};
//! use time::macros::datetime;
//!
//! let gas = RawTable::new(
//!     &["timestamp", "Gas"],
//!     vec![
//!         (datetime!(2024-01-01 0:00:30 UTC), 1.0),
//!         (datetime!(2024-01-01 0:00:30 UTC), 3.0),
//!         (datetime!(2024-01-01 0:01:10 UTC), 4.0),
//!     ],
//! )?;
//! let licht = RawTable::new(&["timestamp", "Licht"], vec![(datetime!(2024-01-01 0:00:45 UTC), 200.0)])?;
//!
//! let aggregations = AggregationMap::from([("Gas".to_string(), Aggregation::Mean)]);
//! let table = merge([gas, licht], &aggregations)?;
//! assert_eq!(table.len(), 3);
//!
//! let per_minute = downsample(&table, "1min".parse()?, &Aggregation::Sum)?;
//! assert_eq!(per_minute.get(datetime!(2024-01-01 0:00 UTC), "Gas"), Some(2.0));
//! assert_eq!(per_minute.get(datetime!(2024-01-01 0:01 UTC), "Licht"), None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aggregation;
#[cfg(feature = "http-client")]
pub mod client;
pub mod collect;
pub mod config;
pub mod downsample;
pub mod error;
pub mod index;
pub mod join;
pub mod merge;
pub mod mock;
pub mod registry;
pub mod series;
pub mod source;
pub mod table;
pub mod timeframes;

// Re-export the value types
pub use samsmart_types::{BinWidth, Household, SensorRole, Source, Tag, Timeframe};

pub use aggregation::{Aggregation, CustomAggregation};
#[cfg(feature = "http-client")]
pub use client::ApiClient;
pub use collect::{household_records, timeframe_records};
pub use config::{
    Config, ConfigError, Deployment, Households, ValidationError, default_config_path,
};
pub use downsample::{bin_start, downsample};
pub use error::{Error, Result, UpstreamError};
pub use index::index_by_timestamp;
pub use join::outer_join_by_timestamp;
pub use merge::{AggregationMap, merge};
pub use mock::MockSource;
pub use registry::{SensorCapability, SensorRegistry};
pub use series::{IndexedSeries, RawTable, Sample, SingleSensorSeries, TIMESTAMP_COLUMN};
pub use source::SensorSource;
pub use table::WideTable;
pub use timeframes::{check_households, timeframes_by_source};
