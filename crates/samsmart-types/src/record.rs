//! Wire types for sensor records returned by the remote measurement API.
//!
//! A record carries one sensor's samples. Each sample holds a *list* of
//! scalars for a single timestamp; most sensors report exactly one value,
//! multi-value sensors report several.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::Source;

/// One sensor's data as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Fully qualified sensor id, e.g. `koffer1.sensor.Gas`.
    pub id: String,
    /// The box the sensor belongs to.
    pub source: String,
    /// Samples in API order.
    pub values: Vec<ValueRecord>,
    /// Descriptions of the scalars inside each sample.
    #[serde(rename = "valueTypes", default)]
    pub value_types: Vec<ValueTypeRecord>,
}

impl SensorRecord {
    /// The sensor id with any `koffer<N>.sensor.` prefix removed.
    ///
    /// ```
    /// use samsmart_types::SensorRecord;
    ///
    /// let record = SensorRecord {
    ///     id: "koffer2.sensor.Temperatur".to_string(),
    ///     source: "koffer2".to_string(),
    ///     values: vec![],
    ///     value_types: vec![],
    /// };
    /// assert_eq!(record.simple_id(), "Temperatur");
    /// ```
    #[must_use]
    pub fn simple_id(&self) -> &str {
        Source::ALL
            .iter()
            .find_map(|source| self.id.strip_prefix(&source.sensor_prefix()))
            .unwrap_or(&self.id)
    }

    /// Total number of scalars across all samples.
    #[must_use]
    pub fn scalar_count(&self) -> usize {
        self.values.iter().map(|v| v.value.len()).sum()
    }
}

/// A single timestamped sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    /// Measurement instant.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The scalars measured at `date`.
    pub value: Vec<Scalar>,
}

/// A scalar as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Numeric reading.
    Number(f64),
    /// Boolean reading (contact and motion sensors).
    Bool(bool),
    /// Textual reading; numeric text is accepted.
    Text(String),
}

impl Scalar {
    /// Numeric interpretation of the scalar, if it has one.
    ///
    /// Booleans map to `0.0` and `1.0`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Describes one scalar position inside a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTypeRecord {
    /// Data type name as reported by the API.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable name.
    pub name: String,
    /// Unit of measurement.
    pub unit: String,
}
