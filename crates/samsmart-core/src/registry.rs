//! Registry of known sensors and their capabilities.

use std::collections::BTreeMap;

use samsmart_types::SensorRole;
use serde::{Deserialize, Serialize};

use crate::aggregation::Aggregation;
use crate::error::{Error, Result};
use crate::merge::AggregationMap;
use crate::table::WideTable;

/// What the engine knows about one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CapabilityEntry")]
pub struct SensorCapability {
    /// Measurement scale of the sensor.
    pub role: SensorRole,
    /// Rule for collapsing same-timestamp readings.
    pub aggregation: Aggregation,
}

impl SensorCapability {
    /// A capability with the default aggregation.
    pub fn new(role: SensorRole) -> Self {
        Self {
            role,
            aggregation: Aggregation::default(),
        }
    }

    /// Replace the aggregation rule.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }
}

/// Accepted configuration shapes: `Gas = "cardinal"` or
/// `Gas = { role = "cardinal", aggregation = "mean" }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CapabilityEntry {
    Role(SensorRole),
    Full {
        role: SensorRole,
        #[serde(default)]
        aggregation: Aggregation,
    },
}

impl From<CapabilityEntry> for SensorCapability {
    fn from(entry: CapabilityEntry) -> Self {
        match entry {
            CapabilityEntry::Role(role) => SensorCapability::new(role),
            CapabilityEntry::Full { role, aggregation } => SensorCapability { role, aggregation },
        }
    }
}

/// The closed set of sensor ids a deployment may query.
///
/// # Examples
///
/// ```
/// use samsmart_core::{Aggregation, SensorCapability, SensorRegistry};
/// use samsmart_types::SensorRole;
///
/// let registry = SensorRegistry::from_iter([
///     ("Gas".to_string(), SensorCapability::new(SensorRole::Cardinal)),
///     (
///         "Bewegung".to_string(),
///         SensorCapability::new(SensorRole::Nominal).with_aggregation(Aggregation::Max),
///     ),
/// ]);
///
/// assert!(registry.check_sensor_id("Gas").is_ok());
/// assert!(registry.check_sensor_id("Radon").is_err());
/// assert_eq!(registry.aggregations()["Bewegung"], Aggregation::Max);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorRegistry {
    sensors: BTreeMap<String, SensorCapability>,
}

impl SensorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a sensor.
    pub fn insert(&mut self, id: impl Into<String>, capability: SensorCapability) {
        self.sensors.insert(id.into(), capability);
    }

    /// Whether `id` is a known sensor.
    pub fn contains(&self, id: &str) -> bool {
        self.sensors.contains_key(id)
    }

    /// Reject unknown sensor ids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `id` is not registered.
    pub fn check_sensor_id(&self, id: &str) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "{id} is not a valid sensor id. Valid sensor ids are: {}",
                self.ids().collect::<Vec<_>>().join(", ")
            )))
        }
    }

    /// Capability of a sensor.
    pub fn capability(&self, id: &str) -> Option<&SensorCapability> {
        self.sensors.get(id)
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.sensors.keys().map(String::as_str)
    }

    /// Number of registered sensors.
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// Whether no sensor is registered.
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// De-duplication rule of every sensor, for [`merge`](crate::merge::merge).
    pub fn aggregations(&self) -> AggregationMap {
        self.sensors
            .iter()
            .map(|(id, cap)| (id.clone(), cap.aggregation.clone()))
            .collect()
    }

    /// Columns of `table` whose sensor has `role`, in table order.
    ///
    /// Unregistered columns are never returned.
    pub fn columns_with_role(&self, table: &WideTable, role: SensorRole) -> Vec<String> {
        table
            .columns()
            .iter()
            .filter(|c| self.capability(c).is_some_and(|cap| cap.role == role))
            .cloned()
            .collect()
    }

    /// Split `table` into its nominal and its cardinal columns.
    ///
    /// Unregistered columns appear in neither part.
    pub fn nominals_cardinals(&self, table: &WideTable) -> Result<(WideTable, WideTable)> {
        let nominals = table.select(&self.columns_with_role(table, SensorRole::Nominal))?;
        let cardinals = table.select(&self.columns_with_role(table, SensorRole::Cardinal))?;
        Ok((nominals, cardinals))
    }
}

impl FromIterator<(String, SensorCapability)> for SensorRegistry {
    fn from_iter<I: IntoIterator<Item = (String, SensorCapability)>>(iter: I) -> Self {
        Self {
            sensors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::outer_join_by_timestamp;
    use crate::merge::merge;
    use crate::series::RawTable;
    use time::macros::datetime;

    fn registry() -> SensorRegistry {
        toml::from_str(
            r#"
            Gas = "cardinal"
            Licht = { role = "cardinal", aggregation = "mean" }
            Bewegung = { role = "nominal", aggregation = "max" }
            Tuer = { role = "nominal" }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_deserialize_both_shapes() {
        let r = registry();
        assert_eq!(r.len(), 4);
        assert_eq!(r.capability("Gas"), Some(&SensorCapability::new(SensorRole::Cardinal)));
        assert_eq!(r.capability("Licht").unwrap().aggregation, Aggregation::Mean);
        assert_eq!(r.capability("Tuer").unwrap().aggregation, Aggregation::First);
        assert_eq!(r.capability("Bewegung").unwrap().role, SensorRole::Nominal);
    }

    #[test]
    fn test_deserialize_rejects_unknown_role_or_rule() {
        assert!(toml::from_str::<SensorRegistry>(r#"Gas = "ordinal""#).is_err());
        let unknown_rule = r#"Gas = { role = "cardinal", aggregation = "mode" }"#;
        assert!(toml::from_str::<SensorRegistry>(unknown_rule).is_err());
    }

    #[test]
    fn test_check_sensor_id() {
        let r = registry();
        assert!(r.check_sensor_id("Licht").is_ok());
        let err = r.check_sensor_id("Radon").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("Bewegung, Gas, Licht, Tuer"));
    }

    #[test]
    fn test_aggregations() {
        let aggs = registry().aggregations();
        assert_eq!(aggs.len(), 4);
        assert_eq!(aggs["Bewegung"], Aggregation::Max);
        assert_eq!(aggs["Gas"], Aggregation::First);
    }

    #[test]
    fn test_nominals_cardinals() {
        let t = datetime!(2024-01-01 0:00 UTC);
        let tables = ["Tuer", "Gas", "Radon", "Bewegung"]
            .map(|label| RawTable::new(&["timestamp", label], vec![(t, 1.0)]).unwrap());
        let wide = merge(tables, &AggregationMap::new()).unwrap();

        let r = registry();
        assert_eq!(r.columns_with_role(&wide, SensorRole::Nominal), ["Tuer", "Bewegung"]);
        let (nominals, cardinals) = r.nominals_cardinals(&wide).unwrap();
        assert_eq!(nominals.columns(), ["Tuer", "Bewegung"]);
        assert_eq!(cardinals.columns(), ["Gas"]);
        assert_eq!(cardinals.len(), 1);
    }

    #[test]
    fn test_nominals_cardinals_of_empty_table() {
        let (n, c) = registry()
            .nominals_cardinals(&outer_join_by_timestamp(Vec::new()).unwrap())
            .unwrap();
        assert!(n.columns().is_empty() && c.columns().is_empty());
    }
}
