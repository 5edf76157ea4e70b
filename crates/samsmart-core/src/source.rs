//! Trait abstraction over providers of raw sensor tables.
//!
//! [`SensorSource`] is implemented by the HTTP [`ApiClient`](crate::ApiClient)
//! and by the in-memory [`MockSource`](crate::MockSource) used in tests.

use async_trait::async_trait;
use samsmart_types::{Source, Tag};
use time::{Duration, OffsetDateTime};

use crate::error::{Error, Result};
use crate::series::RawTable;

/// Provider of raw two-column tables for one sensor of one box.
///
/// `tag` selects the location the box was deployed at; `None` means the
/// box's own label.
///
/// # Example
///
/// ```
/// use samsmart_core::{MockSource, SensorSource};
/// use samsmart_types::Source;
/// use time::macros::datetime;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = MockSource::new();
/// source
///     .add_samples("Gas", Source::Koffer1, vec![(datetime!(2024-01-01 0:00 UTC), 1.0)])
///     .await;
///
/// async fn count<S: SensorSource>(s: &S) -> usize {
///     let oldest = datetime!(2024-01-01 0:00 UTC);
///     let newest = datetime!(2024-01-02 0:00 UTC);
///     s.fetch_range("Gas", Source::Koffer1, oldest, newest, None)
///         .await
///         .map(|t| t.len())
///         .unwrap_or(0)
/// }
/// assert_eq!(count(&source).await, 1);
/// # }
/// ```
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Every sample of `sensor_id` with a timestamp in `[oldest, newest]`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) for an
    /// unknown sensor id, [`Error::Upstream`](crate::Error::Upstream) when
    /// no data could be obtained.
    async fn fetch_range(
        &self,
        sensor_id: &str,
        source: Source,
        oldest: OffsetDateTime,
        newest: OffsetDateTime,
        tag: Option<&Tag>,
    ) -> Result<RawTable>;

    /// At most the `n` latest samples of `sensor_id` as of `at`.
    async fn fetch_latest(
        &self,
        sensor_id: &str,
        source: Source,
        n: usize,
        tag: Option<&Tag>,
        at: OffsetDateTime,
    ) -> Result<RawTable>;

    /// The samples of the last `lookback` before `now`.
    ///
    /// Fails with [`Error::InvalidArgument`] if `now - lookback` is not a
    /// representable instant.
    async fn fetch_past(
        &self,
        sensor_id: &str,
        source: Source,
        lookback: Duration,
        tag: Option<&Tag>,
        now: OffsetDateTime,
    ) -> Result<RawTable> {
        let oldest = now.checked_sub(lookback).ok_or_else(|| {
            Error::InvalidArgument(format!("lookback {lookback} before {now} is out of range"))
        })?;
        self.fetch_range(sensor_id, source, oldest, now, tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockSource;
    use time::macros::datetime;

    #[tokio::test]
    async fn test_fetch_past_covers_lookback() {
        let source = MockSource::new();
        source
            .add_samples(
                "Gas",
                Source::Koffer1,
                [
                    (datetime!(2024-01-01 10:00 UTC), 1.0),
                    (datetime!(2024-01-01 11:30 UTC), 2.0),
                ],
            )
            .await;

        let table = source
            .fetch_past(
                "Gas",
                Source::Koffer1,
                Duration::hours(1),
                None,
                datetime!(2024-01-01 12:00 UTC),
            )
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].1, 2.0);
    }

    #[tokio::test]
    async fn test_fetch_past_out_of_range_lookback() {
        let source = MockSource::new();
        let err = source
            .fetch_past(
                "Gas",
                Source::Koffer1,
                Duration::MAX,
                None,
                datetime!(2024-01-01 12:00 UTC),
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(source.fetch_count(), 0);
    }
}
