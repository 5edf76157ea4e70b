//! Timestamp indexing: collapse one sensor's duplicate timestamps.

use std::collections::BTreeMap;

use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use crate::aggregation::Aggregation;
use crate::error::{Error, Result};
use crate::series::{IndexedSeries, Sample, SingleSensorSeries};

/// Index a single sensor's samples by timestamp.
///
/// Samples sharing an instant are reduced with `aggregation`, in their
/// original order. Timestamps are normalised to UTC first, so the same
/// instant written with two offsets counts as a duplicate. A group whose
/// values are all missing yields a missing entry.
///
/// An empty series yields an empty [`IndexedSeries`].
///
/// # Errors
///
/// Returns [`Error::Integrity`] if the resulting key set is not strictly
/// ascending. This never happens for correct grouping.
///
/// # Examples
///
/// ```
/// use samsmart_core::{Aggregation, Sample, SingleSensorSeries, index_by_timestamp};
/// use time::macros::datetime;
///
/// let t = datetime!(2024-01-01 12:00 UTC);
/// let series = SingleSensorSeries::new("Gas", vec![Sample::new(t, 1.0), Sample::new(t, 3.0)]);
///
/// let indexed = index_by_timestamp(&series, &Aggregation::Mean)?;
/// assert_eq!(indexed.len(), 1);
/// assert_eq!(indexed.get(t), Some(2.0));
/// # Ok::<(), samsmart_core::Error>(())
/// ```
pub fn index_by_timestamp(
    series: &SingleSensorSeries,
    aggregation: &Aggregation,
) -> Result<IndexedSeries> {
    let mut samples: Vec<Sample> = series
        .samples()
        .iter()
        .map(|s| Sample::new(s.timestamp.to_offset(UtcOffset::UTC), s.value))
        .collect();
    // Stable, so duplicates keep their source order for first/last.
    samples.sort_by_key(|s| s.timestamp);

    let mut entries: Vec<(OffsetDateTime, Option<f64>)> = Vec::with_capacity(samples.len());
    for group in samples.chunk_by(|a, b| a.timestamp == b.timestamp) {
        let values: Vec<f64> = group.iter().map(|s| s.value).collect();
        entries.push((group[0].timestamp, aggregation.apply(&values)));
    }

    if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 >= pair[1].0) {
        return Err(Error::Integrity(format!(
            "index of '{}' is not unique after de-duplication: {} followed by {}",
            series.label(),
            pair[0].0,
            pair[1].0
        )));
    }

    let removed = series.len() - entries.len();
    if removed > 0 {
        info!(
            "Removed {} duplicate timestamps from '{}' using '{}'",
            removed,
            series.label(),
            aggregation
        );
    } else {
        debug!("'{}' has {} unique timestamps", series.label(), entries.len());
    }

    let values: BTreeMap<OffsetDateTime, Option<f64>> = entries.into_iter().collect();
    Ok(IndexedSeries::from_entries(series.label().to_string(), values))
}
