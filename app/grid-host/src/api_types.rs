//! FILENAME: app/grid-host/src/api_types.rs
// PURPOSE: Shared type definitions for renderer communication.
// CONTEXT: All structs use camelCase serialization for JavaScript interoperability.

use grid_engine::{
    ColumnDef, FieldValue, GridDefinition, GridEvent, GridId, GridView, PointerEvent, RowNode,
    TreeRow,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// COLUMNS
// ============================================================================

/// Column descriptor as sent by the renderer. Callbacks cannot cross the
/// boundary, so only a static cell class is supported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub resizable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_class: Option<String>,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>) -> Self {
        ColumnSpec {
            field: field.into(),
            ..Default::default()
        }
    }
}

impl From<ColumnSpec> for ColumnDef<Value> {
    fn from(spec: ColumnSpec) -> Self {
        let mut column = ColumnDef::new(spec.field)
            .sortable(spec.sortable)
            .filterable(spec.filterable)
            .resizable(spec.resizable)
            .width_bounds(spec.min_width, spec.max_width);
        column.header_name = spec.header_name;
        column.width = spec.width;
        column.header_class = spec.header_class;
        if let Some(class) = spec.cell_class {
            column = column.cell_class(class);
        }
        column
    }
}

/// Column metadata returned to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnData {
    pub col_id: String,
    pub header_name: String,
    pub width: u32,
    pub sortable: bool,
    pub filterable: bool,
    pub resizable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_class: Option<String>,
}

impl From<&ColumnDef<Value>> for ColumnData {
    fn from(column: &ColumnDef<Value>) -> Self {
        ColumnData {
            col_id: column.col_id().to_string(),
            header_name: column.display_name().to_string(),
            width: column.effective_width(),
            sortable: column.sortable,
            filterable: column.filterable,
            resizable: column.resizable,
            header_class: column.header_class.clone(),
        }
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

/// Request to create a grid instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGridRequest {
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub definition: GridDefinition,
}

/// Request for the rows covering a viewport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowWindowRequest {
    pub grid_id: GridId,
    pub scroll_offset: f64,
    pub viewport_height: f64,
    /// Extra rows rendered above and below the viewport.
    #[serde(default = "default_overscan")]
    pub overscan: usize,
}

fn default_overscan() -> usize {
    3
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Grid-level summary returned by configuration commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridInfoResponse {
    pub grid_id: GridId,
    pub version: u64,
    pub generation: u64,
    pub source_row_count: usize,
    /// Data rows left after filtering.
    pub leaf_count: usize,
    pub visible_count: usize,
    pub group_by: Vec<String>,
    pub row_height: u32,
    pub header_height: u32,
    pub columns: Vec<ColumnData>,
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub col_id: String,
    pub value: FieldValue,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// One row of the flattened sequence, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowData {
    pub index: usize,
    pub id: String,
    pub is_group: bool,
    pub depth: usize,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    /// Data rows below a group; 0 for leaves.
    pub leaf_count: usize,
    pub cells: Vec<CellData>,
}

impl RowData {
    pub fn from_row(
        index: usize,
        row: &TreeRow,
        view: &GridView<Value>,
        columns: &[ColumnDef<Value>],
    ) -> Self {
        let data = view.data_for(row);
        let cells = columns
            .iter()
            .map(|column| {
                let value = column.cell_value(row, data);
                CellData {
                    col_id: column.col_id().to_string(),
                    display: column.render_cell(&value, data),
                    class: column.cell_classes(&value, data),
                    value,
                }
            })
            .collect();

        let group = row.node.as_group();
        RowData {
            index,
            id: row.id().to_string(),
            is_group: row.is_group(),
            depth: row.depth,
            expanded: row.expanded,
            group_field: group.map(|g| g.field.clone()),
            group_key: group.map(|g| g.key.clone()),
            leaf_count: group.map_or(0, |g| g.leaf_count),
            cells,
        }
    }
}

/// The rows a viewport needs, plus the geometry to place them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowWindowResponse {
    pub grid_id: GridId,
    pub generation: u64,
    pub total_rows: usize,
    pub start: usize,
    pub end: usize,
    pub offset_px: u64,
    pub total_height: u64,
    pub row_height: u32,
    pub rows: Vec<RowData>,
}

// ============================================================================
// EVENTS
// ============================================================================

/// An engine event copied out for delivery over the host's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GridEventData {
    #[serde(rename_all = "camelCase")]
    RowClicked {
        grid_id: GridId,
        row_id: String,
        is_group: bool,
        data: Option<Value>,
        event: PointerEvent,
    },
    #[serde(rename_all = "camelCase")]
    CellClicked {
        grid_id: GridId,
        row_id: String,
        col_id: String,
        value: FieldValue,
        data: Option<Value>,
        event: PointerEvent,
    },
    #[serde(rename_all = "camelCase")]
    GroupToggled {
        grid_id: GridId,
        group_id: String,
        expanded: bool,
        /// Whether the group row is in the sequence after the toggle.
        visible: bool,
    },
    #[serde(rename_all = "camelCase")]
    Ready { grid_id: GridId, visible_count: usize },
}

impl GridEventData {
    pub fn from_event(grid_id: GridId, event: &GridEvent<'_, Value>) -> Self {
        match event {
            GridEvent::RowClicked { row, data, event } => GridEventData::RowClicked {
                grid_id,
                row_id: row.id().to_string(),
                is_group: matches!(row.node, RowNode::Group(_)),
                data: data.cloned(),
                event: *event,
            },
            GridEvent::CellClicked {
                row,
                data,
                column,
                value,
                event,
            } => GridEventData::CellClicked {
                grid_id,
                row_id: row.id().to_string(),
                col_id: column.col_id().to_string(),
                value: value.clone(),
                data: data.cloned(),
                event: *event,
            },
            GridEvent::GroupToggled {
                group_id,
                row,
                expanded,
            } => GridEventData::GroupToggled {
                grid_id,
                group_id: group_id.to_string(),
                expanded: *expanded,
                visible: row.is_some(),
            },
            GridEvent::Ready { api } => GridEventData::Ready {
                grid_id,
                visible_count: api.count_visible(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GridEventData::RowClicked { .. } => "rowClicked",
            GridEventData::CellClicked { .. } => "cellClicked",
            GridEventData::GroupToggled { .. } => "groupToggled",
            GridEventData::Ready { .. } => "ready",
        }
    }
}
