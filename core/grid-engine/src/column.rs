//! FILENAME: core/grid-engine/src/column.rs
//! Column Descriptors - What a renderer needs to draw and address a column.
//!
//! Callbacks are opaque to the pipeline: it stores them, hands them the
//! value and the record, and passes their output through untouched.

use std::fmt;
use std::sync::Arc;

use crate::flatten::TreeRow;
use crate::record::{field_or_null, GridRecord};
use crate::row::RowNode;
use crate::value::FieldValue;

/// Width used when a column does not declare one.
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// Computes a cell value from the record instead of reading `field`.
pub type ValueGetter<T> = Arc<dyn Fn(&T) -> FieldValue + Send + Sync>;

/// Turns a cell value into display text. `None` data means a group row.
pub type ValueFormatter<T> = Arc<dyn Fn(&FieldValue, Option<&T>) -> String + Send + Sync>;

/// Produces renderer markup for a data cell.
pub type CellRenderer<T> = Arc<dyn Fn(&FieldValue, &T) -> String + Send + Sync>;

/// CSS class source for a cell.
pub enum CellClass<T> {
    Static(String),
    Dynamic(Arc<dyn Fn(&FieldValue, Option<&T>) -> String + Send + Sync>),
}

impl<T> Clone for CellClass<T> {
    fn clone(&self) -> Self {
        match self {
            CellClass::Static(class) => CellClass::Static(class.clone()),
            CellClass::Dynamic(callback) => CellClass::Dynamic(Arc::clone(callback)),
        }
    }
}

impl<T> fmt::Debug for CellClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellClass::Static(class) => f.debug_tuple("Static").field(class).finish(),
            CellClass::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

// ============================================================================
// COLUMN DEFINITION
// ============================================================================

/// One column of the grid. The column id is its `field`.
pub struct ColumnDef<T> {
    /// Record field this column reads (also the column id).
    pub field: String,

    /// Header text; the field name when absent.
    pub header_name: Option<String>,

    /// Fixed width in pixels.
    pub width: Option<u32>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,

    pub sortable: bool,
    pub filterable: bool,
    pub resizable: bool,

    pub value_getter: Option<ValueGetter<T>>,
    pub value_formatter: Option<ValueFormatter<T>>,
    pub cell_renderer: Option<CellRenderer<T>>,
    pub cell_class: Option<CellClass<T>>,
    pub header_class: Option<String>,
}

impl<T> ColumnDef<T> {
    pub fn new(field: impl Into<String>) -> Self {
        ColumnDef {
            field: field.into(),
            header_name: None,
            width: None,
            min_width: None,
            max_width: None,
            sortable: false,
            filterable: false,
            resizable: false,
            value_getter: None,
            value_formatter: None,
            cell_renderer: None,
            cell_class: None,
            header_class: None,
        }
    }

    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn width_bounds(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_width = min;
        self.max_width = max;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn value_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.value_getter = Some(Arc::new(getter));
        self
    }

    pub fn value_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&FieldValue, Option<&T>) -> String + Send + Sync + 'static,
    {
        self.value_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn cell_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&FieldValue, &T) -> String + Send + Sync + 'static,
    {
        self.cell_renderer = Some(Arc::new(renderer));
        self
    }

    pub fn cell_class(mut self, class: impl Into<String>) -> Self {
        self.cell_class = Some(CellClass::Static(class.into()));
        self
    }

    pub fn cell_class_with<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FieldValue, Option<&T>) -> String + Send + Sync + 'static,
    {
        self.cell_class = Some(CellClass::Dynamic(Arc::new(callback)));
        self
    }

    pub fn header_class(mut self, class: impl Into<String>) -> Self {
        self.header_class = Some(class.into());
        self
    }

    pub fn col_id(&self) -> &str {
        &self.field
    }

    pub fn display_name(&self) -> &str {
        self.header_name.as_deref().unwrap_or(&self.field)
    }

    /// Width the renderer should use.
    pub fn effective_width(&self) -> u32 {
        self.clamp_width(self.width.unwrap_or(DEFAULT_COLUMN_WIDTH))
    }

    /// Clamps a requested width into `[min_width, max_width]`.
    pub fn clamp_width(&self, width: u32) -> u32 {
        let mut width = width;
        if let Some(min) = self.min_width {
            width = width.max(min);
        }
        if let Some(max) = self.max_width {
            width = width.min(max);
        }
        width
    }
}

impl<T: GridRecord> ColumnDef<T> {
    /// Value of this column for a data record.
    pub fn value(&self, data: &T) -> FieldValue {
        match &self.value_getter {
            Some(getter) => getter(data),
            None => field_or_null(data, &self.field),
        }
    }

    /// Value of this column for any flattened row.
    /// A group row shows its key only in the column of its grouping field.
    pub fn cell_value(&self, row: &TreeRow, data: Option<&T>) -> FieldValue {
        match (&row.node, data) {
            (RowNode::Leaf(_), Some(data)) => self.value(data),
            (RowNode::Group(group), _) if group.field == self.field => {
                FieldValue::Text(group.key.clone())
            }
            _ => FieldValue::Null,
        }
    }
}

impl<T> ColumnDef<T> {
    /// Display text: empty for null, the formatter's output when set,
    /// otherwise the value's own text.
    pub fn format_value(&self, value: &FieldValue, data: Option<&T>) -> String {
        if value.is_null() {
            return String::new();
        }
        match &self.value_formatter {
            Some(formatter) => formatter(value, data),
            None => value.to_string(),
        }
    }

    /// Renderer output for data cells; group cells and renderer-less
    /// columns fall back to the formatted value.
    pub fn render_cell(&self, value: &FieldValue, data: Option<&T>) -> String {
        match (&self.cell_renderer, data) {
            (Some(renderer), Some(data)) => renderer(value, data),
            _ => self.format_value(value, data),
        }
    }

    pub fn cell_classes(&self, value: &FieldValue, data: Option<&T>) -> Option<String> {
        match &self.cell_class {
            Some(CellClass::Static(class)) => Some(class.clone()),
            Some(CellClass::Dynamic(callback)) => Some(callback(value, data)),
            None => None,
        }
    }
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        ColumnDef {
            field: self.field.clone(),
            header_name: self.header_name.clone(),
            width: self.width,
            min_width: self.min_width,
            max_width: self.max_width,
            sortable: self.sortable,
            filterable: self.filterable,
            resizable: self.resizable,
            value_getter: self.value_getter.clone(),
            value_formatter: self.value_formatter.clone(),
            cell_renderer: self.cell_renderer.clone(),
            cell_class: self.cell_class.clone(),
            header_class: self.header_class.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("field", &self.field)
            .field("header_name", &self.header_name)
            .field("width", &self.width)
            .field("min_width", &self.min_width)
            .field("max_width", &self.max_width)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("resizable", &self.resizable)
            .field("value_getter", &self.value_getter.is_some())
            .field("value_formatter", &self.value_formatter.is_some())
            .field("cell_renderer", &self.cell_renderer.is_some())
            .field("cell_class", &self.cell_class)
            .field("header_class", &self.header_class)
            .finish()
    }
}
