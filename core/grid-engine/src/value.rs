//! FILENAME: core/grid-engine/src/value.rs
//! Field Values - The normalized, hashable view of one field of a record.
//!
//! Grouping, sorting and filtering never look at caller records directly.
//! They read a `FieldValue` through the `GridRecord` trait and work on that:
//! - Grouping uses the stringified group key (`group_key`)
//! - Sorting uses the total order defined by `compare`
//! - Filtering matches against the variant

use std::cmp::Ordering;
use std::fmt;
use serde::{Deserialize, Serialize};

/// Group key used for null and missing values.
pub const NULL_GROUP_KEY: &str = "null";

// ============================================================================
// ORDERED FLOAT
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash so values can key hash maps.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash equal
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

// ============================================================================
// FIELD VALUE
// ============================================================================

/// A single field read from a caller record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FieldValue {
    /// Null, undefined, or explicitly empty.
    #[default]
    Null,
    Bool(bool),
    Number(OrderedFloat),
    Text(String),
}

impl FieldValue {
    pub fn number(n: f64) -> Self {
        FieldValue::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Stringified key used to partition rows into groups.
    /// Null becomes the `"null"` sentinel so missing values form their own group.
    pub fn group_key(&self) -> String {
        match self {
            FieldValue::Null => NULL_GROUP_KEY.to_string(),
            other => other.to_string(),
        }
    }

    /// Total order used by the sort stage.
    /// Null < Number < Text < Bool; NaN compares equal to every number.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,

            (FieldValue::Number(a), FieldValue::Number(b)) => {
                a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Number(_), _) => Ordering::Less,
            (_, FieldValue::Number(_)) => Ordering::Greater,

            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Text(_), _) => Ordering::Less,
            (_, FieldValue::Text(_)) => Ordering::Greater,

            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
        }
    }
}

/// Formats a number the way a dynamic-language `String(n)` would:
/// integral values drop the fractional part.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Display text for a cell. Null renders as an empty string.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => f.write_str(&format_number(n.0)),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::number(value as f64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::number),
            Value::String(s) => FieldValue::Text(s.clone()),
            // Nested structures group by their JSON text
            Value::Array(_) | Value::Object(_) => FieldValue::Text(value.to_string()),
        }
    }
}
