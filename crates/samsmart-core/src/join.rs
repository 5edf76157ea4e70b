//! Outer join of indexed single-sensor series.

use std::collections::{BTreeMap, HashSet};

use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::series::IndexedSeries;
use crate::table::WideTable;

/// Full outer join on the timestamp key.
///
/// The result holds one column per input series, in input order, and one
/// row per timestamp found in any series. A series without an entry at a
/// row's timestamp holds a missing cell. No input yields an empty table.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if two series share a label.
///
/// # Examples
///
/// ```
/// use samsmart_core::{Aggregation, Sample, SingleSensorSeries, index_by_timestamp, outer_join_by_timestamp};
/// use time::macros::datetime;
///
/// let (t1, t2, t3) = (
///     datetime!(2024-01-01 0:01 UTC),
///     datetime!(2024-01-01 0:02 UTC),
///     datetime!(2024-01-01 0:03 UTC),
/// );
/// let a = SingleSensorSeries::new("A", vec![Sample::new(t1, 1.0), Sample::new(t2, 2.0)]);
/// let b = SingleSensorSeries::new("B", vec![Sample::new(t2, 20.0), Sample::new(t3, 30.0)]);
///
/// let table = outer_join_by_timestamp(vec![
///     index_by_timestamp(&a, &Aggregation::First)?,
///     index_by_timestamp(&b, &Aggregation::First)?,
/// ])?;
/// assert_eq!(table.len(), 3);
/// assert_eq!(table.get(t1, "B"), None);
/// assert_eq!(table.get(t2, "B"), Some(20.0));
/// # Ok::<(), samsmart_core::Error>(())
/// ```
pub fn outer_join_by_timestamp(series: Vec<IndexedSeries>) -> Result<WideTable> {
    let mut seen = HashSet::new();
    for s in &series {
        if !seen.insert(s.label()) {
            return Err(Error::InvalidArgument(format!(
                "column '{}' appears in more than one series",
                s.label()
            )));
        }
    }

    let columns: Vec<String> = series.iter().map(|s| s.label().to_string()).collect();
    let width = columns.len();

    let mut rows: BTreeMap<OffsetDateTime, Vec<Option<f64>>> = BTreeMap::new();
    for (col, s) in series.iter().enumerate() {
        for (ts, value) in s.iter() {
            rows.entry(ts).or_insert_with(|| vec![None; width])[col] = value;
        }
    }

    Ok(WideTable::from_parts(columns, rows))
}
