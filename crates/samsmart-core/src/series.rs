//! Single-sensor series: raw tables, raw samples and indexed series.

use std::collections::BTreeMap;
use std::io;

use samsmart_types::SensorRecord;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};

/// Name of the timestamp column of every raw table.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// One measured value. `NaN` marks a missing reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Measurement instant.
    pub timestamp: OffsetDateTime,
    /// Measured value.
    pub value: f64,
}

impl Sample {
    /// Create a sample.
    pub fn new(timestamp: OffsetDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Samples of exactly one sensor, in any order, possibly with repeated
/// timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSensorSeries {
    label: String,
    samples: Vec<Sample>,
}

impl SingleSensorSeries {
    /// Create a series labelled with the sensor's column name.
    pub fn new(label: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            label: label.into(),
            samples,
        }
    }

    /// Column name of the sensor.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The raw samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples, duplicates included.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One sensor's values keyed by unique timestamp.
///
/// Only [`index_by_timestamp`](crate::index::index_by_timestamp) builds
/// these, so the key set is unique by construction. Keys are UTC instants;
/// `None` marks a timestamp whose readings were all missing.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedSeries {
    label: String,
    values: BTreeMap<OffsetDateTime, Option<f64>>,
}

impl IndexedSeries {
    pub(crate) fn from_entries(
        label: String,
        values: BTreeMap<OffsetDateTime, Option<f64>>,
    ) -> Self {
        Self { label, values }
    }

    /// Column name of the sensor.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of distinct timestamps.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no timestamps.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `timestamp`, if present and not missing.
    pub fn get(&self, timestamp: OffsetDateTime) -> Option<f64> {
        self.values.get(&timestamp).copied().flatten()
    }

    /// Whether `timestamp` is a key of the series.
    pub fn contains(&self, timestamp: OffsetDateTime) -> bool {
        self.values.contains_key(&timestamp)
    }

    /// Entries in ascending timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = (OffsetDateTime, Option<f64>)> + '_ {
        self.values.iter().map(|(ts, v)| (*ts, *v))
    }

    /// Timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = OffsetDateTime> + '_ {
        self.values.keys().copied()
    }

    /// Turn the series back into raw samples, missing values as `NaN`.
    pub fn to_series(&self) -> SingleSensorSeries {
        let samples = self
            .iter()
            .map(|(ts, v)| Sample::new(ts, v.unwrap_or(f64::NAN)))
            .collect();
        SingleSensorSeries::new(self.label.clone(), samples)
    }
}

/// A raw two-column table: `timestamp` plus one value column named after the
/// sensor.
///
/// The shape is enforced on construction: a header that is not exactly
/// `["timestamp", <label>]` is rejected with [`Error::InvalidArgument`].
///
/// # Examples
///
/// ```
/// use samsmart_core::RawTable;
/// use time::macros::datetime;
///
/// let table = RawTable::new(&["timestamp", "Gas"], vec![(datetime!(2024-01-01 0:00 UTC), 1.0)])?;
/// assert_eq!(table.label(), "Gas");
///
/// assert!(RawTable::new(&["Gas", "timestamp"], vec![]).is_err());
/// assert!(RawTable::new(&["timestamp", "Gas", "Licht"], vec![]).is_err());
/// # Ok::<(), samsmart_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    label: String,
    rows: Vec<(OffsetDateTime, f64)>,
}

impl RawTable {
    /// Build a raw table from its header and rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `header` does not have exactly
    /// two columns, the first named `timestamp`.
    pub fn new<S: AsRef<str>>(header: &[S], rows: Vec<(OffsetDateTime, f64)>) -> Result<Self> {
        let label = check_header(header)?;
        Ok(Self { label, rows })
    }

    /// Flatten an API record into a raw table.
    ///
    /// Every scalar of a list-valued sample becomes its own row, so such
    /// samples yield repeated timestamps. Scalars without a numeric
    /// interpretation become missing values.
    pub fn from_record(record: &SensorRecord) -> Self {
        let rows = record
            .values
            .iter()
            .flat_map(|sample| {
                sample
                    .value
                    .iter()
                    .map(move |scalar| (sample.date, scalar.as_f64().unwrap_or(f64::NAN)))
            })
            .collect();
        Self {
            label: record.simple_id().to_string(),
            rows,
        }
    }

    /// Read a raw table from CSV with a `timestamp,<label>` header.
    ///
    /// Timestamps must be RFC 3339; an empty value cell is a missing value.
    pub fn from_csv<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let label = check_header(&header)?;

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let line = i + 2;
            let (Some(ts), Some(value), 2) = (record.get(0), record.get(1), record.len()) else {
                return Err(Error::InvalidArgument(format!(
                    "line {line}: expected 2 fields, got {}",
                    record.len()
                )));
            };
            let timestamp = OffsetDateTime::parse(ts.trim(), &Rfc3339).map_err(|e| {
                Error::InvalidArgument(format!("line {line}: invalid timestamp '{ts}': {e}"))
            })?;
            let value = match value.trim() {
                "" => f64::NAN,
                text => text.parse().map_err(|_| {
                    Error::InvalidArgument(format!("line {line}: invalid value '{text}'"))
                })?,
            };
            rows.push((timestamp, value));
        }

        Ok(Self { label, rows })
    }

    /// The column names.
    pub fn header(&self) -> [&str; 2] {
        [TIMESTAMP_COLUMN, &self.label]
    }

    /// Name of the value column.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The rows in source order.
    pub fn rows(&self) -> &[(OffsetDateTime, f64)] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep at most the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// View the value column as a single-sensor series.
    pub fn into_series(self) -> SingleSensorSeries {
        let samples = self
            .rows
            .into_iter()
            .map(|(ts, v)| Sample::new(ts, v))
            .collect();
        SingleSensorSeries::new(self.label, samples)
    }
}

fn check_header<S: AsRef<str>>(header: &[S]) -> Result<String> {
    match header {
        [first, label] if first.as_ref() == TIMESTAMP_COLUMN => Ok(label.as_ref().to_string()),
        [_, _] => Err(Error::InvalidArgument(format!(
            "first column of a raw table must be '{TIMESTAMP_COLUMN}', got '{}'",
            header[0].as_ref()
        ))),
        _ => Err(Error::InvalidArgument(format!(
            "raw table must have exactly 2 columns, got {}",
            header.len()
        ))),
    }
}
