//! Merge raw per-sensor tables into one wide table.

use std::collections::HashMap;

use tracing::debug;

use crate::aggregation::Aggregation;
use crate::error::Result;
use crate::index::index_by_timestamp;
use crate::join::outer_join_by_timestamp;
use crate::series::RawTable;
use crate::table::WideTable;

/// Per-sensor de-duplication rules, keyed by column label.
pub type AggregationMap = HashMap<String, Aggregation>;

/// Index every raw table and outer-join the results.
///
/// Each table is de-duplicated with the rule stored under its label in
/// `aggregations`. A label without a rule is indexed with
/// [`Aggregation::First`]. Columns follow the iteration order of `tables`.
///
/// # Errors
///
/// Propagates [`index_by_timestamp`] and [`outer_join_by_timestamp`]
/// failures; in particular two tables with the same label are rejected.
///
/// # Examples
///
/// ```
/// use samsmart_core::{AggregationMap, RawTable, merge};
/// use time::macros::datetime;
///
/// let t = datetime!(2024-01-01 0:00 UTC);
/// let raw = RawTable::new(&["timestamp", "Unbekannt"], vec![(t, 1.0), (t, 2.0)])?;
///
/// let table = merge([raw], &AggregationMap::new())?;
/// assert_eq!(table.get(t, "Unbekannt"), Some(1.0));
/// # Ok::<(), samsmart_core::Error>(())
/// ```
pub fn merge<I>(tables: I, aggregations: &AggregationMap) -> Result<WideTable>
where
    I: IntoIterator<Item = RawTable>,
{
    let default = Aggregation::default();
    let mut indexed = Vec::new();
    for table in tables {
        let aggregation = match aggregations.get(table.label()) {
            Some(aggregation) => aggregation,
            None => {
                debug!("No aggregation configured for '{}', using '{}'", table.label(), default);
                &default
            }
        };
        indexed.push(index_by_timestamp(&table.into_series(), aggregation)?);
    }
    outer_join_by_timestamp(indexed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_unconfigured_sensor_uses_first() {
        let t = datetime!(2024-01-01 0:00 UTC);
        let raw = RawTable::new(&["timestamp", "Gas"], vec![(t, 3.0), (t, 5.0)]).unwrap();
        let table = merge([raw], &AggregationMap::new()).unwrap();
        assert_eq!(table.get(t, "Gas"), Some(3.0));
    }

    #[test]
    fn test_configured_rule_is_used_per_label() {
        let t = datetime!(2024-01-01 0:00 UTC);
        let gas = RawTable::new(&["timestamp", "Gas"], vec![(t, 3.0), (t, 5.0)]).unwrap();
        let licht = RawTable::new(&["timestamp", "Licht"], vec![(t, 3.0), (t, 5.0)]).unwrap();
        let aggregations = AggregationMap::from([("Gas".to_string(), Aggregation::Sum)]);

        let table = merge([gas, licht], &aggregations).unwrap();
        assert_eq!(table.columns(), ["Gas", "Licht"]);
        assert_eq!(table.get(t, "Gas"), Some(8.0));
        assert_eq!(table.get(t, "Licht"), Some(3.0));
    }

    #[test]
    fn test_nothing_to_merge() {
        let table = merge(Vec::new(), &AggregationMap::new()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_same_label_twice_is_rejected() {
        let t = datetime!(2024-01-01 0:00 UTC);
        let a = RawTable::new(&["timestamp", "Gas"], vec![(t, 1.0)]).unwrap();
        let b = RawTable::new(&["timestamp", "Gas"], vec![(t, 2.0)]).unwrap();
        assert!(merge([a, b], &AggregationMap::new()).unwrap_err().is_invalid_argument());
    }
}
