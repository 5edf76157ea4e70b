//! Core types for SamSmart deployment metadata.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::error::ParseError;

/// Physical sensing box a reading originates from.
///
/// The two boxes are interchangeable hardware; which household they were
/// deployed at, and when, is described by [`Timeframe`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Source {
    /// The first box.
    Koffer1,
    /// The second box.
    Koffer2,
}

impl Source {
    /// All known sources, in ascending order.
    pub const ALL: [Source; 2] = [Source::Koffer1, Source::Koffer2];

    /// The label used by the remote API for this source.
    ///
    /// ```
    /// use samsmart_types::Source;
    ///
    /// assert_eq!(Source::Koffer2.as_str(), "koffer2");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Koffer1 => "koffer1",
            Source::Koffer2 => "koffer2",
        }
    }

    /// Prefix the remote API puts in front of sensor ids of this source.
    #[must_use]
    pub fn sensor_prefix(&self) -> String {
        format!("{}.sensor.", self.as_str())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "koffer1" => Ok(Source::Koffer1),
            "koffer2" => Ok(Source::Koffer2),
            other => Err(ParseError::UnknownSource(other.to_string())),
        }
    }
}

/// Location label a source was deployed under.
///
/// A tag is either one of the two box labels (`koffer1`, `koffer2`) or a
/// numbered location: `ssh<N>`, `haushalt<N>` or `household<N>`.
///
/// # Examples
///
/// ```
/// use samsmart_types::Tag;
///
/// assert!("ssh12".parse::<Tag>().is_ok());
/// assert!("haushalt3".parse::<Tag>().is_ok());
/// assert!("household3".parse::<Tag>().is_ok());
/// assert!("ssh".parse::<Tag>().is_err());
/// assert!("garage1".parse::<Tag>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Tag(String);

const NUMBERED_TAG_PREFIXES: [&str; 3] = ["ssh", "haushalt", "household"];

impl Tag {
    /// The tag a source carries when it is not deployed anywhere else.
    #[must_use]
    pub fn for_source(source: Source) -> Self {
        Tag(source.as_str().to_string())
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(tag: &str) -> bool {
        if tag.parse::<Source>().is_ok() {
            return true;
        }
        NUMBERED_TAG_PREFIXES.iter().any(|prefix| {
            tag.strip_prefix(prefix)
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Tag::is_valid(s) {
            Ok(Tag(s.to_string()))
        } else {
            Err(ParseError::InvalidTag(s.to_string()))
        }
    }
}

impl TryFrom<String> for Tag {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Tag::is_valid(&value) {
            Ok(Tag(value))
        } else {
            Err(ParseError::InvalidTag(value))
        }
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl From<Source> for Tag {
    fn from(source: Source) -> Self {
        Tag::for_source(source)
    }
}

/// Measurement scale of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SensorRole {
    /// Categorical readings (door open, motion detected, ...).
    Nominal,
    /// Quantitative readings (temperature, humidity, ...).
    Cardinal,
}

impl fmt::Display for SensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorRole::Nominal => write!(f, "nominal"),
            SensorRole::Cardinal => write!(f, "cardinal"),
        }
    }
}

impl FromStr for SensorRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nominal" => Ok(SensorRole::Nominal),
            "cardinal" => Ok(SensorRole::Cardinal),
            other => Err(ParseError::UnknownRole(other.to_string())),
        }
    }
}

/// A window during which a source was deployed at a tagged location.
///
/// Both bounds are inclusive and stored in UTC. The upper bound is always
/// known: when the deployment is still ongoing, the caller passes the
/// instant to treat as "now" explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Timeframe {
    tag: Tag,
    source: Source,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    oldest_record: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    newest_record: OffsetDateTime,
}

impl Timeframe {
    /// Create a timeframe.
    ///
    /// `newest_record` falls back to `now` when it is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::ReversedTimeframe`] if the resolved upper bound
    /// lies before `oldest_record`.
    ///
    /// # Examples
    ///
    /// ```
    /// use samsmart_types::{Source, Tag, Timeframe};
    /// use time::macros::datetime;
    ///
    /// let now = datetime!(2024-03-01 00:00 UTC);
    /// let tf = Timeframe::new(
    ///     "haushalt1".parse()?,
    ///     Source::Koffer1,
    ///     datetime!(2024-02-01 00:00 UTC),
    ///     None,
    ///     now,
    /// )?;
    /// assert_eq!(tf.newest_record(), now);
    /// # Ok::<(), samsmart_types::ParseError>(())
    /// ```
    pub fn new(
        tag: Tag,
        source: Source,
        oldest_record: OffsetDateTime,
        newest_record: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Result<Self, ParseError> {
        let oldest = oldest_record.to_offset(UtcOffset::UTC);
        let newest = newest_record.unwrap_or(now).to_offset(UtcOffset::UTC);
        if oldest > newest {
            return Err(ParseError::ReversedTimeframe { oldest, newest });
        }
        Ok(Self {
            tag,
            source,
            oldest_record: oldest,
            newest_record: newest,
        })
    }

    /// Location tag of the deployment.
    #[must_use]
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// The deployed box.
    #[must_use]
    pub fn source(&self) -> Source {
        self.source
    }

    /// Inclusive lower bound.
    #[must_use]
    pub fn oldest_record(&self) -> OffsetDateTime {
        self.oldest_record
    }

    /// Inclusive upper bound.
    #[must_use]
    pub fn newest_record(&self) -> OffsetDateTime {
        self.newest_record
    }

    /// Whether `later` starts before this timeframe ends.
    ///
    /// Touching bounds (`self.newest_record == later.oldest_record`) do not
    /// count as overlap.
    #[must_use]
    pub fn overlaps_next(&self, later: &Timeframe) -> bool {
        self.newest_record > later.oldest_record
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timeframe(tag={}, source={}, oldest_record={}, newest_record={})",
            self.tag, self.source, self.oldest_record, self.newest_record
        )
    }
}

/// A household and the deployments recorded for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Household {
    /// Deployments at this household, in configuration order.
    pub timeframes: Vec<Timeframe>,
}

impl Household {
    /// Create a household from its timeframes.
    #[must_use]
    pub fn new(timeframes: Vec<Timeframe>) -> Self {
        Self { timeframes }
    }
}
