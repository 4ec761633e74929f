//! FILENAME: core/grid-engine/src/definition.rs
//! Grid Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a grid's derived
//! row sequence. These structures are designed to be:
//! - Serializable (so a caller can persist or transmit them)
//! - Validated as a whole before a rebuild
//! - Immutable snapshots of user intent
//!
//! Column descriptors carry caller callbacks and live in `column` instead.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::record::GridRecord;
use crate::value::FieldValue;

/// Unique identifier for a grid instance within a host.
pub type GridId = u32;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: u32 = 50;

/// Default header height in pixels.
pub const DEFAULT_HEADER_HEIGHT: u32 = 50;

// ============================================================================
// SORTING
// ============================================================================

/// Sort direction for a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One key of the sort stage. Multiple specs sort lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field (column id) to sort by.
    pub field: String,

    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        SortSpec {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// A predicate on one field. All filters of a definition must pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Field (column id) the condition reads.
    pub field: String,

    pub condition: FilterCondition,
}

impl FilterSpec {
    pub fn new(field: impl Into<String>, condition: FilterCondition) -> Self {
        FilterSpec {
            field: field.into(),
            condition,
        }
    }
}

/// Types of filter conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Include only these specific values.
    ValueList(Vec<FieldValue>),

    /// Comparison filter for numbers. Non-numeric values never match.
    NumberFilter {
        operator: ComparisonOperator,
        value: f64,
        /// Second bound for Between/NotBetween.
        #[serde(default)]
        value2: Option<f64>,
    },

    /// Text filter against the value's display text.
    TextFilter {
        operator: TextOperator,
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },

    /// Boolean equality. Non-boolean values never match.
    BooleanFilter(bool),

    /// Null or missing values.
    Blank,

    /// Anything but null or missing values.
    NotBlank,
}

/// Comparison operators for number filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    NotBetween,
}

/// Text filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    BeginsWith,
    EndsWith,
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Fixed pixel dimensions used by windowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    #[serde(default = "default_row_height")]
    pub row_height: u32,

    #[serde(default = "default_header_height")]
    pub header_height: u32,
}

fn default_row_height() -> u32 {
    DEFAULT_ROW_HEIGHT
}

fn default_header_height() -> u32 {
    DEFAULT_HEADER_HEIGHT
}

impl Default for GridLayout {
    fn default() -> Self {
        GridLayout {
            row_height: DEFAULT_ROW_HEIGHT,
            header_height: DEFAULT_HEADER_HEIGHT,
        }
    }
}

impl GridLayout {
    pub fn validate(&self) -> GridResult<()> {
        if self.row_height == 0 {
            return Err(GridError::InvalidDimension {
                name: "row height",
                value: self.row_height,
            });
        }
        if self.header_height == 0 {
            return Err(GridError::InvalidDimension {
                name: "header height",
                value: self.header_height,
            });
        }
        Ok(())
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete, serializable definition of a grid's row pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridDefinition {
    /// Grouping fields, ordered from outer to inner.
    #[serde(default)]
    pub group_by: Vec<String>,

    /// Sort keys applied to data rows before grouping.
    #[serde(default)]
    pub sort: Vec<SortSpec>,

    /// Filters applied to data rows before grouping.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,

    #[serde(default)]
    pub layout: GridLayout,

    /// Bumped on every accepted change.
    #[serde(default)]
    pub version: u64,
}

impl GridDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group_by<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_filters(mut self, filters: Vec<FilterSpec>) -> Self {
        self.filters = filters;
        self
    }

    /// Increments the version (for change detection by hosts).
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Checks everything that can be checked without looking at rows.
    pub fn validate(&self) -> GridResult<()> {
        self.layout.validate()?;

        let mut seen = FxHashSet::default();
        for field in &self.group_by {
            if field.trim().is_empty() {
                return Err(GridError::InvalidGroupingField(field.clone()));
            }
            if !seen.insert(field.as_str()) {
                return Err(GridError::DuplicateGroupingField(field.clone()));
            }
        }

        for spec in &self.sort {
            if spec.field.trim().is_empty() {
                return Err(GridError::InvalidSortField(spec.field.clone()));
            }
        }

        for spec in &self.filters {
            if spec.field.trim().is_empty() {
                return Err(GridError::InvalidFilterField(spec.field.clone()));
            }
        }

        Ok(())
    }

    /// Validates the definition against a concrete row collection.
    pub fn validate_for_rows<T: GridRecord>(&self, rows: &[T]) -> GridResult<()> {
        self.validate()?;
        validate_grouping_fields(rows, &self.group_by)
    }
}

/// Rejects grouping fields that are absent from every row's shape.
///
/// Missing values on some rows are fine (they form the `"null"` group);
/// a field no row has is a configuration error. An empty collection cannot
/// contradict any field and always passes.
pub fn validate_grouping_fields<T: GridRecord>(rows: &[T], group_by: &[String]) -> GridResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    for field in group_by {
        if !rows.iter().any(|row| row.field(field).is_some()) {
            return Err(GridError::InvalidGroupingField(field.clone()));
        }
    }
    Ok(())
}
