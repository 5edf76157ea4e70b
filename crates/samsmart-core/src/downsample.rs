//! Rebinning of wide tables onto a fixed-width time grid.

use std::collections::BTreeMap;

use samsmart_types::BinWidth;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::aggregation::Aggregation;
use crate::error::{Error, Result};
use crate::table::WideTable;

/// Left edge of the bin of width `width` that contains `timestamp`.
///
/// Bins are aligned to the Unix epoch; the result is a UTC instant.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the edge is not representable.
pub fn bin_start(timestamp: OffsetDateTime, width: BinWidth) -> Result<OffsetDateTime> {
    let nanos = timestamp.unix_timestamp_nanos();
    let w = width.whole_nanoseconds();
    let edge = nanos.div_euclid(w) * w;
    OffsetDateTime::from_unix_timestamp_nanos(edge)
        .map(|t| t.to_offset(UtcOffset::UTC))
        .map_err(|e| Error::InvalidArgument(format!("bin edge out of range for {timestamp}: {e}")))
}

/// Aggregate all rows falling into the same bin.
///
/// Every column is reduced with the same `aggregation`; missing cells are
/// skipped and a bin whose cells of a column are all missing holds a missing
/// cell. Bins without rows are not emitted. Columns are kept, so an empty
/// table downsamples to an empty table with the same columns.
///
/// # Examples
///
/// ```
/// use samsmart_core::{Aggregation, AggregationMap, RawTable, downsample, merge};
/// use time::macros::datetime;
///
/// let raw = RawTable::new(
///     &["timestamp", "Gas"],
///     vec![(datetime!(2024-01-01 0:00:30 UTC), 1.0), (datetime!(2024-01-01 0:01:10 UTC), 2.0)],
/// )?;
/// let table = merge([raw], &AggregationMap::new())?;
///
/// let hourly = downsample(&table, "1h".parse()?, &Aggregation::Sum)?;
/// assert_eq!(hourly.get(datetime!(2024-01-01 0:00 UTC), "Gas"), Some(3.0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn downsample(
    table: &WideTable,
    width: BinWidth,
    aggregation: &Aggregation,
) -> Result<WideTable> {
    let width_cols = table.columns().len();

    let mut bins: BTreeMap<OffsetDateTime, Vec<Vec<f64>>> = BTreeMap::new();
    for (ts, row) in table.rows() {
        let bin = bin_start(ts, width)?;
        let cells = bins
            .entry(bin)
            .or_insert_with(|| vec![Vec::new(); width_cols]);
        for (col, cell) in row.iter().enumerate() {
            if let Some(v) = cell {
                cells[col].push(*v);
            }
        }
    }

    let rows: BTreeMap<OffsetDateTime, Vec<Option<f64>>> = bins
        .into_iter()
        .map(|(bin, cells)| {
            let reduced = cells.iter().map(|values| aggregation.apply(values)).collect();
            (bin, reduced)
        })
        .collect();

    debug!(
        "Downsampled {} rows into {} bins of {} using '{}'",
        table.len(),
        rows.len(),
        width,
        aggregation
    );
    Ok(WideTable::from_parts(table.columns().to_vec(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn table(rows: Vec<(OffsetDateTime, Vec<Option<f64>>)>) -> WideTable {
        WideTable::from_parts(vec!["A".to_string(), "B".to_string()], rows.into_iter().collect())
    }

    fn width(s: &str) -> BinWidth {
        s.parse().unwrap()
    }

    #[test]
    fn test_bin_start_floors_to_epoch_grid() {
        let ts = datetime!(2024-03-05 13:47:21.5 UTC);
        assert_eq!(bin_start(ts, width("1min")).unwrap(), datetime!(2024-03-05 13:47 UTC));
        assert_eq!(bin_start(ts, width("15min")).unwrap(), datetime!(2024-03-05 13:45 UTC));
        assert_eq!(bin_start(ts, width("1d")).unwrap(), datetime!(2024-03-05 0:00 UTC));
        // 1970-01-01 was a Thursday.
        assert_eq!(bin_start(ts, width("1w")).unwrap(), datetime!(2024-02-29 0:00 UTC));
    }

    #[test]
    fn test_bin_start_before_epoch() {
        let ts = datetime!(1969-12-31 23:59:30 UTC);
        assert_eq!(bin_start(ts, width("1min")).unwrap(), datetime!(1969-12-31 23:59 UTC));
    }

    #[test]
    fn test_bin_start_uses_instant_not_wall_clock() {
        let ts = datetime!(2024-01-01 0:30 +1);
        assert_eq!(bin_start(ts, width("1d")).unwrap(), datetime!(2023-12-31 0:00 UTC));
    }

    #[test]
    fn test_rows_in_one_bin_are_summed() {
        let t1 = datetime!(2024-01-01 0:00:30 UTC);
        let t2 = datetime!(2024-01-01 0:01:10 UTC);
        let input = table(vec![(t1, vec![Some(1.0), None]), (t2, vec![Some(2.0), Some(5.0)])]);

        let out = downsample(&input, width("1min"), &Aggregation::Sum).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.row(datetime!(2024-01-01 0:00 UTC)), Some(&[Some(1.0), None][..]));
        assert_eq!(out.row(datetime!(2024-01-01 0:01 UTC)), Some(&[Some(2.0), Some(5.0)][..]));

        let out = downsample(&input, width("2min"), &Aggregation::Sum).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.row(datetime!(2024-01-01 0:00 UTC)), Some(&[Some(3.0), Some(5.0)][..]));
    }

    #[test]
    fn test_sparse_ranges_stay_sparse() {
        let t1 = datetime!(2024-01-01 0:00 UTC);
        let t2 = datetime!(2024-01-05 0:00 UTC);
        let input = table(vec![(t1, vec![Some(1.0), None]), (t2, vec![None, Some(2.0)])]);
        let out = downsample(&input, width("1d"), &Aggregation::Mean).unwrap();
        assert_eq!(out.timestamps().collect::<Vec<_>>(), vec![t1, t2]);
    }

    #[test]
    fn test_empty_table() {
        let out = downsample(&table(Vec::new()), width("1h"), &Aggregation::Sum).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.columns(), ["A", "B"]);
        assert!(downsample(&WideTable::new(), width("1h"), &Aggregation::Sum).unwrap().is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_row_lands_in_its_bin(
                secs in prop::collection::vec(-100_000i64..100_000, 0..100),
                minutes in 1i64..120,
            ) {
                let base = datetime!(2024-01-01 0:00 UTC);
                let w = BinWidth::from_duration(time::Duration::minutes(minutes)).unwrap();
                let rows = secs
                    .iter()
                    .map(|&s| (base + time::Duration::seconds(s), vec![Some(1.0), None]))
                    .collect();
                let input = table(rows);

                let out = downsample(&input, w, &Aggregation::Sum).unwrap();
                let total: f64 = out.column("A").unwrap().iter().filter_map(|(_, v)| *v).sum();
                prop_assert_eq!(total as usize, input.len());
                for ts in out.timestamps() {
                    prop_assert_eq!(bin_start(ts, w).unwrap(), ts);
                }
                for ts in input.timestamps() {
                    let edge = bin_start(ts, w).unwrap();
                    prop_assert!(edge <= ts && ts < edge + w.as_duration());
                }
            }
        }
    }
}
