//! Deployment timeframe checks.
//!
//! A box cannot be at two places at once: the timeframes of one
//! [`Source`] must not overlap, across all households.

use std::collections::BTreeMap;

use samsmart_types::{Household, Source, Timeframe};
use tracing::debug;

use crate::error::{Error, Result};

/// Group every timeframe of every household by its source.
///
/// Both sources are always present, possibly with no timeframes. Within a
/// source, timeframes keep household then configuration order.
pub fn timeframes_by_source<'a, I>(households: I) -> BTreeMap<Source, Vec<&'a Timeframe>>
where
    I: IntoIterator<Item = &'a Household>,
{
    let mut by_source: BTreeMap<Source, Vec<&Timeframe>> =
        Source::ALL.iter().map(|&s| (s, Vec::new())).collect();
    for household in households {
        for timeframe in &household.timeframes {
            by_source.entry(timeframe.source()).or_default().push(timeframe);
        }
    }
    by_source
}

/// Check that no two timeframes of the same source overlap.
///
/// Timeframes of one source are sorted by `newest_record` and adjacent pairs
/// compared; the first overlapping pair aborts the check. Timeframes that
/// only touch at a boundary instant are accepted.
///
/// # Errors
///
/// Returns [`Error::OverlapViolation`] naming the offending pair.
///
/// # Examples
///
/// ```
/// use samsmart_core::check_households;
/// use samsmart_types::{Household, Source, Timeframe};
/// use time::macros::datetime;
///
/// let now = datetime!(2024-06-01 0:00 UTC);
/// let tf = |src, a, b| Timeframe::new("ssh1".parse().unwrap(), src, a, Some(b), now).unwrap();
///
/// let day = |d| datetime!(2024-01-01 0:00 UTC) + time::Duration::days(d);
/// let a = Household::new(vec![tf(Source::Koffer1, day(1), day(3))]);
/// let b = Household::new(vec![tf(Source::Koffer1, day(2), day(4))]);
/// assert!(check_households([&a, &b]).is_err());
///
/// let c = Household::new(vec![tf(Source::Koffer2, day(2), day(4))]);
/// assert!(check_households([&a, &c]).is_ok());
/// ```
pub fn check_households<'a, I>(households: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Household>,
{
    for (source, mut timeframes) in timeframes_by_source(households) {
        timeframes.sort_by_key(|tf| (tf.newest_record(), tf.oldest_record()));
        if let Some(pair) = timeframes.windows(2).find(|pair| pair[0].overlaps_next(pair[1])) {
            return Err(Error::OverlapViolation {
                first: Box::new(pair[0].clone()),
                second: Box::new(pair[1].clone()),
            });
        }
        debug!("{} timeframes of {} do not overlap", timeframes.len(), source);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    fn day(n: i64) -> OffsetDateTime {
        datetime!(2024-01-01 0:00 UTC) + Duration::days(n)
    }

    fn tf(source: Source, oldest: i64, newest: i64) -> Timeframe {
        Timeframe::new(source.into(), source, day(oldest), Some(day(newest)), day(100)).unwrap()
    }

    #[test]
    fn test_grouping_initialises_both_sources() {
        let groups = timeframes_by_source(std::iter::empty());
        assert_eq!(groups.len(), 2);
        assert!(groups.values().all(Vec::is_empty));

        let h = Household::new(vec![tf(Source::Koffer2, 1, 2), tf(Source::Koffer2, 3, 4)]);
        let groups = timeframes_by_source([&h]);
        assert!(groups[&Source::Koffer1].is_empty());
        assert_eq!(groups[&Source::Koffer2].len(), 2);
    }

    #[test]
    fn test_overlap_same_source_fails() {
        let h1 = Household::new(vec![tf(Source::Koffer1, 1, 3)]);
        let h2 = Household::new(vec![tf(Source::Koffer1, 2, 4)]);
        let err = check_households([&h1, &h2]).unwrap_err();
        match err {
            Error::OverlapViolation { first, second } => {
                assert_eq!(first.newest_record(), day(3));
                assert_eq!(second.oldest_record(), day(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overlap_within_one_household_fails() {
        let h = Household::new(vec![tf(Source::Koffer2, 5, 9), tf(Source::Koffer2, 1, 6)]);
        assert!(check_households([&h]).is_err());
    }

    #[test]
    fn test_different_sources_never_conflict() {
        let h1 = Household::new(vec![tf(Source::Koffer1, 1, 3)]);
        let h2 = Household::new(vec![tf(Source::Koffer2, 2, 4)]);
        assert!(check_households([&h1, &h2]).is_ok());
    }

    #[test]
    fn test_touching_bounds_are_not_overlap() {
        let h = Household::new(vec![tf(Source::Koffer1, 2, 3), tf(Source::Koffer1, 1, 2)]);
        assert!(check_households([&h]).is_ok());
    }

    #[test]
    fn test_shared_end_verdict_ignores_config_order() {
        let span = tf(Source::Koffer1, 1, 5);
        let point = tf(Source::Koffer1, 5, 5);

        let h = Household::new(vec![span.clone(), point.clone()]);
        assert!(check_households([&h]).is_ok());
        let h = Household::new(vec![point, span]);
        assert!(check_households([&h]).is_ok());

        let inner = tf(Source::Koffer1, 3, 5);
        let h = Household::new(vec![inner.clone(), tf(Source::Koffer1, 1, 5)]);
        assert!(check_households([&h]).is_err());
        let h = Household::new(vec![tf(Source::Koffer1, 1, 5), inner]);
        assert!(check_households([&h]).is_err());
    }

    #[test]
    fn test_one_instant_past_the_boundary_is_overlap() {
        let a = tf(Source::Koffer1, 1, 2);
        let b = Timeframe::new(
            Source::Koffer1.into(),
            Source::Koffer1,
            day(2) - Duration::nanoseconds(1),
            Some(day(3)),
            day(100),
        )
        .unwrap();
        let h = Household::new(vec![a, b]);
        assert!(check_households([&h]).is_err());
    }

    #[test]
    fn test_error_message_names_both_timeframes() {
        let h = Household::new(vec![tf(Source::Koffer1, 1, 3), tf(Source::Koffer1, 2, 4)]);
        let message = check_households([&h]).unwrap_err().to_string();
        assert!(message.starts_with("Sanity check failed: Timeframes Timeframe(tag=koffer1"));
        assert!(message.ends_with("overlap"));
    }
}
