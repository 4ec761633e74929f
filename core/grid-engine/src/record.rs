//! FILENAME: core/grid-engine/src/record.rs
//! Record access - How the pipeline reads caller-owned rows.
//!
//! The grid never copies or mutates caller data. It only asks a record for
//! the value of a named field. `None` means the field is not part of the
//! record's shape at all; `Some(FieldValue::Null)` means present but null.
//! That distinction is what lets configuration validation reject a grouping
//! field no row has, while still grouping missing values under `"null"`.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

use crate::value::FieldValue;

/// A caller record addressable by field name.
pub trait GridRecord {
    /// Reads one field. Returns `None` when the record has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl GridRecord for serde_json::Map<String, serde_json::Value> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).map(FieldValue::from)
    }
}

impl GridRecord for serde_json::Value {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            serde_json::Value::Object(map) => map.field(name),
            _ => None,
        }
    }
}

impl<S: BuildHasher> GridRecord for HashMap<String, FieldValue, S> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

impl GridRecord for BTreeMap<String, FieldValue> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

impl<R: GridRecord + ?Sized> GridRecord for &R {
    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }
}

impl<R: GridRecord + ?Sized> GridRecord for Box<R> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }
}

impl<R: GridRecord + ?Sized> GridRecord for Arc<R> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }
}

/// Reads a field, treating an absent field like an explicit null.
pub(crate) fn field_or_null<T: GridRecord + ?Sized>(record: &T, name: &str) -> FieldValue {
    record.field(name).unwrap_or(FieldValue::Null)
}
