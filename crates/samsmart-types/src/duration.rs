//! Fixed-length bin widths for downsampling.
//!
//! Widths are written the way analysts type them (`"1d"`, `"3min"`,
//! `"10s"`) and always resolve to an exact number of nanoseconds. A day is
//! 24 hours and a week is 7 days; there is no calendar or DST adjustment,
//! so binning stays integer arithmetic on epoch offsets.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::error::ParseError;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Unit aliases and their length in nanoseconds.
const UNITS: &[(&[&str], i128)] = &[
    (&["w", "W", "week", "weeks"], 7 * 86_400 * NANOS_PER_SECOND),
    (&["d", "D", "day", "days"], 86_400 * NANOS_PER_SECOND),
    (&["h", "H", "hr", "hour", "hours"], 3_600 * NANOS_PER_SECOND),
    (&["min", "m", "T", "minute", "minutes"], 60 * NANOS_PER_SECOND),
    (&["s", "S", "sec", "second", "seconds"], NANOS_PER_SECOND),
    (&["ms", "L", "milli", "millis", "millisecond", "milliseconds"], 1_000_000),
    (&["us", "U", "micro", "micros", "microsecond", "microseconds"], 1_000),
    (&["ns", "N", "nano", "nanos", "nanosecond", "nanoseconds"], 1),
];

/// Units used by `Display`, largest first.
const DISPLAY_UNITS: &[(&str, i128)] = &[
    ("d", 86_400 * NANOS_PER_SECOND),
    ("h", 3_600 * NANOS_PER_SECOND),
    ("min", 60 * NANOS_PER_SECOND),
    ("s", NANOS_PER_SECOND),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
];

/// A strictly positive, fixed-length bin width.
///
/// # Examples
///
/// ```
/// use samsmart_types::BinWidth;
/// use time::Duration;
///
/// let day: BinWidth = "1d".parse()?;
/// assert_eq!(day.as_duration(), Duration::hours(24));
///
/// let three: BinWidth = "3min".parse()?;
/// assert_eq!(three.whole_nanoseconds(), 180_000_000_000);
/// assert_eq!(three.to_string(), "3min");
///
/// assert!("0s".parse::<BinWidth>().is_err());
/// assert!("1 fortnight".parse::<BinWidth>().is_err());
/// # Ok::<(), samsmart_types::ParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct BinWidth {
    nanos: i128,
}

impl BinWidth {
    /// Create a bin width from a duration.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidDuration`] if `duration` is zero or negative.
    pub fn from_duration(duration: Duration) -> Result<Self, ParseError> {
        let nanos = duration.whole_nanoseconds();
        if nanos <= 0 {
            return Err(ParseError::InvalidDuration {
                input: format!("{duration:?}"),
                reason: "bin width must be positive".to_string(),
            });
        }
        Ok(Self { nanos })
    }

    /// Length of one bin in nanoseconds.
    #[must_use]
    pub fn whole_nanoseconds(&self) -> i128 {
        self.nanos
    }

    /// Length of one bin.
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        // Parsing caps widths well inside the i64 seconds range.
        let secs = (self.nanos / NANOS_PER_SECOND) as i64;
        let subsec = (self.nanos % NANOS_PER_SECOND) as i32;
        Duration::new(secs, subsec)
    }

    fn parse_str(input: &str) -> Result<Self, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidDuration {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty string"));
        }

        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(digits_end);
        let unit = unit.trim_start();

        let count: i128 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid("count is too large"))?
        };
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }

        let unit_nanos = UNITS
            .iter()
            .find(|(aliases, _)| aliases.contains(&unit))
            .map(|(_, nanos)| *nanos)
            .ok_or_else(|| invalid(&format!("unknown unit '{unit}'")))?;

        let nanos = count
            .checked_mul(unit_nanos)
            .filter(|n| *n <= i128::from(i64::MAX))
            .ok_or_else(|| invalid("width is too large"))?;
        if nanos == 0 {
            return Err(invalid("bin width must be positive"));
        }

        Ok(Self { nanos })
    }
}

impl fmt::Display for BinWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (unit, size) = DISPLAY_UNITS
            .iter()
            .find(|(_, size)| self.nanos % size == 0)
            .copied()
            .unwrap_or(("ns", 1));
        write!(f, "{}{}", self.nanos / size, unit)
    }
}

impl FromStr for BinWidth {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl TryFrom<String> for BinWidth {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_str(&value)
    }
}

impl From<BinWidth> for String {
    fn from(width: BinWidth) -> Self {
        width.to_string()
    }
}

impl TryFrom<Duration> for BinWidth {
    type Error = ParseError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::from_duration(value)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any count of any unit resolves to exactly count * unit nanoseconds.
        #[test]
        fn width_is_count_times_unit(count in 1u32..10_000, unit_idx in 0usize..UNITS.len()) {
            let (aliases, unit_nanos) = UNITS[unit_idx];
            let width: BinWidth = format!("{count}{}", aliases[0]).parse().unwrap();
            prop_assert_eq!(width.whole_nanoseconds(), i128::from(count) * unit_nanos);
        }

        /// Parsing arbitrary text never panics.
        #[test]
        fn parse_never_panics(input in ".{0,16}") {
            let _ = input.parse::<BinWidth>();
        }
    }
}
