//! Fetch-and-merge orchestration over timeframes and households.

use futures::future::join_all;
use samsmart_types::{Household, Timeframe};
use tracing::{info, warn};

use crate::error::Result;
use crate::merge::merge;
use crate::registry::SensorRegistry;
use crate::source::SensorSource;
use crate::table::WideTable;

/// Fetch every registered sensor for one timeframe and merge the results.
///
/// Fetches run concurrently against the shared `source`. A sensor whose
/// fetch fails with [`Error::Upstream`](crate::Error::Upstream) or
/// [`Error::InvalidArgument`](crate::Error::InvalidArgument) is logged and
/// left out; any other failure aborts the call. Duplicates are collapsed
/// with each sensor's registered aggregation.
pub async fn timeframe_records<S>(
    source: &S,
    registry: &SensorRegistry,
    timeframe: &Timeframe,
) -> Result<WideTable>
where
    S: SensorSource + ?Sized,
{
    let ids: Vec<&str> = registry.ids().collect();
    let fetches = ids.iter().map(|id| {
        source.fetch_range(
            id,
            timeframe.source(),
            timeframe.oldest_record(),
            timeframe.newest_record(),
            Some(timeframe.tag()),
        )
    });
    let results = join_all(fetches).await;

    let mut tables = Vec::with_capacity(results.len());
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(table) => tables.push(table),
            Err(e) if e.is_upstream() || e.is_invalid_argument() => {
                warn!("Omitting sensor {} for {}: {}", id, timeframe, e);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Merging {} of {} sensors for {}",
        tables.len(),
        ids.len(),
        timeframe
    );
    merge(tables, &registry.aggregations())
}

/// Records of every timeframe of a household, stacked into one table.
///
/// See [`WideTable::concat`] for how tables of different timeframes are
/// combined.
pub async fn household_records<S>(
    source: &S,
    registry: &SensorRegistry,
    household: &Household,
) -> Result<WideTable>
where
    S: SensorSource + ?Sized,
{
    let mut tables = Vec::with_capacity(household.timeframes.len());
    for timeframe in &household.timeframes {
        tables.push(timeframe_records(source, registry, timeframe).await?);
    }
    Ok(WideTable::concat(tables))
}
