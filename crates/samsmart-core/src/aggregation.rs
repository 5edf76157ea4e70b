//! Named reduction rules.
//!
//! An [`Aggregation`] collapses several values into one. It is used by the
//! timestamp indexer (same-timestamp duplicates of one sensor) and by the
//! downsampler (all samples of one column inside one bin).
//!
//! Every rule is defined over a non-empty collection and must return the
//! value itself for a single-element collection (`f({x}) == x`). The
//! built-in rules satisfy this by construction; custom rules can be checked
//! with [`Aggregation::is_idempotent_on`].
//!
//! Missing values (`NaN`) are skipped before reducing. If nothing is left,
//! the result is missing as well.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Reduction function signature for custom rules.
pub type ReduceFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// A reduction rule over a non-empty collection of values.
///
/// # Examples
///
/// ```
/// use samsmart_core::Aggregation;
///
/// assert_eq!(Aggregation::Mean.apply(&[1.0, 2.0, 6.0]), Some(3.0));
/// assert_eq!(Aggregation::First.apply(&[f64::NAN, 4.0]), Some(4.0));
/// assert_eq!(Aggregation::Sum.apply(&[]), None);
///
/// let agg: Aggregation = "max".parse().unwrap();
/// assert_eq!(agg, Aggregation::Max);
/// ```
#[derive(Clone, Default)]
pub enum Aggregation {
    /// The first present value.
    #[default]
    First,
    /// The last present value.
    Last,
    /// Arithmetic mean.
    Mean,
    /// Sum.
    Sum,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Median; the mean of the two middle values for even counts.
    Median,
    /// A caller-supplied reduction.
    Custom(CustomAggregation),
}

/// A named, caller-supplied reduction.
#[derive(Clone)]
pub struct CustomAggregation {
    name: String,
    func: Arc<ReduceFn>,
}

impl CustomAggregation {
    /// The rule's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAggregation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Aggregation {
    /// Wrap a reduction function as a named rule.
    ///
    /// The function is only ever called with a non-empty slice free of `NaN`.
    ///
    /// ```
    /// use samsmart_core::Aggregation;
    ///
    /// let range = Aggregation::custom("range", |v| {
    ///     let max = v.iter().copied().fold(f64::MIN, f64::max);
    ///     let min = v.iter().copied().fold(f64::MAX, f64::min);
    ///     max - min
    /// });
    /// assert_eq!(range.apply(&[3.0, 7.0, 5.0]), Some(4.0));
    /// // Not a valid rule: a single value does not reduce to itself.
    /// assert!(!range.is_idempotent_on(5.0));
    /// ```
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Aggregation::Custom(CustomAggregation {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    /// The rule's name, as accepted by [`FromStr`] for built-in rules.
    pub fn name(&self) -> &str {
        match self {
            Aggregation::First => "first",
            Aggregation::Last => "last",
            Aggregation::Mean => "mean",
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Median => "median",
            Aggregation::Custom(custom) => custom.name(),
        }
    }

    /// Reduce `values` to a single value.
    ///
    /// `NaN` entries are treated as missing and skipped. Returns `None` if no
    /// value is left.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            return None;
        }

        let reduced = match self {
            Aggregation::First => present[0],
            Aggregation::Last => present[present.len() - 1],
            Aggregation::Mean => present.iter().sum::<f64>() / present.len() as f64,
            Aggregation::Sum => present.iter().sum(),
            Aggregation::Min => present.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Median => median(present),
            Aggregation::Custom(custom) => (custom.func)(&present),
        };
        Some(reduced)
    }

    /// Whether the rule reduces the single-element collection `{x}` to `x`.
    pub fn is_idempotent_on(&self, x: f64) -> bool {
        match self.apply(&[x]) {
            Some(y) => y == x || (y.is_nan() && x.is_nan()),
            None => x.is_nan(),
        }
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

impl PartialEq for Aggregation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Aggregation::Custom(a), Aggregation::Custom(b)) => {
                a.name == b.name && Arc::ptr_eq(&a.func, &b.func)
            }
            (Aggregation::Custom(_), _) | (_, Aggregation::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Custom(custom) => f.debug_tuple("Custom").field(custom).finish(),
            builtin => write!(f, "{}", builtin_debug_name(builtin)),
        }
    }
}

fn builtin_debug_name(aggregation: &Aggregation) -> &'static str {
    match aggregation {
        Aggregation::First => "First",
        Aggregation::Last => "Last",
        Aggregation::Mean => "Mean",
        Aggregation::Sum => "Sum",
        Aggregation::Min => "Min",
        Aggregation::Max => "Max",
        Aggregation::Median => "Median",
        Aggregation::Custom(_) => "Custom",
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Aggregation::First),
            "last" => Ok(Aggregation::Last),
            "mean" | "average" | "avg" => Ok(Aggregation::Mean),
            "sum" => Ok(Aggregation::Sum),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "median" => Ok(Aggregation::Median),
            _ => Err(Error::InvalidArgument(format!(
                "unknown aggregation '{s}' (expected first, last, mean, sum, min, max or median)"
            ))),
        }
    }
}

impl Serialize for Aggregation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Aggregation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
