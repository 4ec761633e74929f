//! FILENAME: app/grid-host/src/commands.rs
// PURPOSE: Command handlers the renderer invokes on hosted grids.
// CONTEXT: Every command locks the state for a single operation and maps
// engine errors to strings at this boundary.

use std::sync::mpsc;

use grid_engine::{
    ColumnDef, ExpansionState, FilterSpec, GridDefinition, GridId, PointerEvent, RowId,
    SortDirection, SortSpec,
};
use serde_json::Value;

use crate::api_types::{
    ColumnData, ColumnSpec, CreateGridRequest, GridEventData, GridInfoResponse, RowData,
    RowWindowRequest, RowWindowResponse,
};
use crate::{log_debug, log_enter, log_exit, log_info, log_warn, HostGrid, HostState};

// ============================================================================
// HELPERS
// ============================================================================

/// Runs `f` on one grid with the grid map locked.
fn with_grid<R>(
    state: &HostState,
    grid_id: GridId,
    f: impl FnOnce(&mut HostGrid) -> Result<R, String>,
) -> Result<R, String> {
    let mut grids = state
        .grids
        .lock()
        .map_err(|e| format!("Lock error: {}", e))?;
    let grid = grids
        .get_mut(&grid_id)
        .ok_or_else(|| format!("Grid {} not found", grid_id))?;
    f(grid)
}

fn grid_info(grid_id: GridId, grid: &HostGrid) -> GridInfoResponse {
    let view = grid.view();
    let definition = grid.definition();
    GridInfoResponse {
        grid_id,
        version: definition.version,
        generation: grid.generation(),
        source_row_count: grid.rows().len(),
        leaf_count: view.leaf_count(),
        visible_count: view.count_visible(),
        group_by: definition.group_by.clone(),
        row_height: definition.layout.row_height,
        header_height: definition.layout.header_height,
        columns: grid.columns().iter().map(ColumnData::from).collect(),
    }
}

fn rows_data(grid: &HostGrid, start: usize, end: usize) -> Vec<RowData> {
    let view = grid.view();
    let start = start.min(view.count_visible());
    view.rows_in_range(start, end)
        .iter()
        .enumerate()
        .map(|(offset, row)| RowData::from_row(start + offset, row, &view, grid.columns()))
        .collect()
}

fn columns_from_specs(specs: Vec<ColumnSpec>) -> Vec<ColumnDef<Value>> {
    specs.into_iter().map(ColumnDef::from).collect()
}

fn log_rejected<T>(command: &str, grid_id: GridId, result: Result<T, String>) -> Result<T, String> {
    if let Err(ref e) = result {
        log_warn!("GRID", "{} grid_id={} rejected: {}", command, grid_id, e);
    }
    result
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Creates a grid, wires its event channel and emits `ready`.
pub fn create_grid(state: &HostState, request: CreateGridRequest) -> Result<GridInfoResponse, String> {
    log_enter!(
        "GRID",
        "create_grid",
        "rows={} columns={} group_by={:?}",
        request.rows.len(),
        request.columns.len(),
        request.definition.group_by
    );

    let mut grid = HostGrid::with_data(
        request.rows,
        columns_from_specs(request.columns),
        request.definition,
    )
    .map_err(|e| e.to_string())?;

    let grid_id = {
        let mut next_id = state
            .next_grid_id
            .lock()
            .map_err(|e| format!("Lock error: {}", e))?;
        let id = *next_id;
        *next_id += 1;
        id
    };

    let (sender, receiver) = mpsc::channel();
    grid.subscribe(move |event| {
        // A dropped receiver only means nobody is listening any more
        let _ = sender.send(GridEventData::from_event(grid_id, event));
    });
    grid.ready();

    let info = grid_info(grid_id, &grid);

    state
        .event_receivers
        .lock()
        .map_err(|e| format!("Lock error: {}", e))?
        .insert(grid_id, receiver);
    state
        .grids
        .lock()
        .map_err(|e| format!("Lock error: {}", e))?
        .insert(grid_id, grid);

    log_exit!("GRID", "create_grid", "grid_id={} visible={}", grid_id, info.visible_count);
    Ok(info)
}

pub fn destroy_grid(state: &HostState, grid_id: GridId) -> Result<(), String> {
    log_info!("GRID", "destroy_grid grid_id={}", grid_id);
    state
        .grids
        .lock()
        .map_err(|e| format!("Lock error: {}", e))?
        .remove(&grid_id)
        .ok_or_else(|| format!("Grid {} not found", grid_id))?;
    state
        .event_receivers
        .lock()
        .map_err(|e| format!("Lock error: {}", e))?
        .remove(&grid_id);
    Ok(())
}

pub fn get_grid_info(state: &HostState, grid_id: GridId) -> Result<GridInfoResponse, String> {
    with_grid(state, grid_id, |grid| Ok(grid_info(grid_id, grid)))
}

// ============================================================================
// CONFIGURATION
// ============================================================================

pub fn set_rows(state: &HostState, grid_id: GridId, rows: Vec<Value>) -> Result<GridInfoResponse, String> {
    log_info!("GRID", "set_rows grid_id={} rows={}", grid_id, rows.len());
    let result = with_grid(state, grid_id, |grid| {
        grid.set_rows(rows).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("set_rows", grid_id, result)
}

pub fn set_columns(
    state: &HostState,
    grid_id: GridId,
    columns: Vec<ColumnSpec>,
) -> Result<Vec<ColumnData>, String> {
    log_info!("GRID", "set_columns grid_id={} columns={}", grid_id, columns.len());
    with_grid(state, grid_id, |grid| {
        grid.set_columns(columns_from_specs(columns));
        Ok(grid.columns().iter().map(ColumnData::from).collect())
    })
}

pub fn set_grouping(
    state: &HostState,
    grid_id: GridId,
    group_by: Vec<String>,
) -> Result<GridInfoResponse, String> {
    log_info!("GRID", "set_grouping grid_id={} group_by={:?}", grid_id, group_by);
    let result = with_grid(state, grid_id, |grid| {
        grid.set_grouping_keys(group_by).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("set_grouping", grid_id, result)
}

pub fn set_sort(
    state: &HostState,
    grid_id: GridId,
    sort: Vec<SortSpec>,
) -> Result<GridInfoResponse, String> {
    log_info!("GRID", "set_sort grid_id={} keys={}", grid_id, sort.len());
    let result = with_grid(state, grid_id, |grid| {
        grid.set_sort(sort).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("set_sort", grid_id, result)
}

/// Header-click sorting on one column; `None` clears the sort.
pub fn sort_by_column(
    state: &HostState,
    grid_id: GridId,
    col_id: &str,
    direction: Option<SortDirection>,
) -> Result<GridInfoResponse, String> {
    log_info!("GRID", "sort_by_column grid_id={} col={} dir={:?}", grid_id, col_id, direction);
    let result = with_grid(state, grid_id, |grid| {
        grid.sort_by_column(col_id, direction).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("sort_by_column", grid_id, result)
}

pub fn set_filters(
    state: &HostState,
    grid_id: GridId,
    filters: Vec<FilterSpec>,
) -> Result<GridInfoResponse, String> {
    log_info!("GRID", "set_filters grid_id={} filters={}", grid_id, filters.len());
    let result = with_grid(state, grid_id, |grid| {
        grid.set_filters(filters).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("set_filters", grid_id, result)
}

pub fn apply_definition(
    state: &HostState,
    grid_id: GridId,
    definition: GridDefinition,
) -> Result<GridInfoResponse, String> {
    log_info!("GRID", "apply_definition grid_id={} group_by={:?}", grid_id, definition.group_by);
    let result = with_grid(state, grid_id, |grid| {
        grid.apply_definition(definition).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("apply_definition", grid_id, result)
}

pub fn set_row_height(state: &HostState, grid_id: GridId, px: u32) -> Result<GridInfoResponse, String> {
    log_debug!("GRID", "set_row_height grid_id={} px={}", grid_id, px);
    let result = with_grid(state, grid_id, |grid| {
        grid.set_row_height(px).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("set_row_height", grid_id, result)
}

pub fn set_header_height(state: &HostState, grid_id: GridId, px: u32) -> Result<GridInfoResponse, String> {
    log_debug!("GRID", "set_header_height grid_id={} px={}", grid_id, px);
    let result = with_grid(state, grid_id, |grid| {
        grid.set_header_height(px).map_err(|e| e.to_string())?;
        Ok(grid_info(grid_id, grid))
    });
    log_rejected("set_header_height", grid_id, result)
}

/// Returns the width actually applied after min/max clamping.
pub fn set_column_width(state: &HostState, grid_id: GridId, col_id: &str, width: u32) -> Result<u32, String> {
    log_debug!("GRID", "set_column_width grid_id={} col={} width={}", grid_id, col_id, width);
    with_grid(state, grid_id, |grid| {
        grid.set_column_width(col_id, width).map_err(|e| e.to_string())
    })
}

// ============================================================================
// WINDOWED READS
// ============================================================================

/// The rows covering a viewport, rendered through the column descriptors.
pub fn get_row_window(state: &HostState, request: RowWindowRequest) -> Result<RowWindowResponse, String> {
    with_grid(state, request.grid_id, |grid| {
        let range = grid.visible_range(request.scroll_offset, request.viewport_height, request.overscan);
        let rows = rows_data(grid, range.start, range.end);
        log_debug!(
            "GRID",
            "get_row_window grid_id={} scroll={} rows={}..{} of {}",
            request.grid_id,
            request.scroll_offset,
            range.start,
            range.end,
            grid.count_visible()
        );
        Ok(RowWindowResponse {
            grid_id: request.grid_id,
            generation: grid.generation(),
            total_rows: grid.count_visible(),
            start: range.start,
            end: range.end,
            offset_px: range.offset_px,
            total_height: range.total_height,
            row_height: grid.definition().layout.row_height,
            rows,
        })
    })
}

/// Rows `[start, end)` of the flattened sequence, clamped.
pub fn get_rows_in_range(state: &HostState, grid_id: GridId, start: usize, end: usize) -> Result<Vec<RowData>, String> {
    with_grid(state, grid_id, |grid| Ok(rows_data(grid, start, end)))
}

pub fn get_row_at(state: &HostState, grid_id: GridId, index: i64) -> Result<Option<RowData>, String> {
    with_grid(state, grid_id, |grid| {
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        Ok(rows_data(grid, index, index.saturating_add(1)).into_iter().next())
    })
}

pub fn get_row_count(state: &HostState, grid_id: GridId) -> Result<usize, String> {
    with_grid(state, grid_id, |grid| Ok(grid.count_visible()))
}

/// Position of a row in the flattened sequence, for scroll-to-row.
pub fn find_row_index(state: &HostState, grid_id: GridId, row_id: &str) -> Result<Option<usize>, String> {
    with_grid(state, grid_id, |grid| Ok(grid.index_of(row_id)))
}

/// Data records in post-filter, post-sort order.
pub fn get_sorted_records(state: &HostState, grid_id: GridId) -> Result<Vec<Value>, String> {
    with_grid(state, grid_id, |grid| {
        let mut records = Vec::with_capacity(grid.view().leaf_count());
        grid.for_each_leaf_after_filter_and_sort(|_, record| records.push(record.clone()));
        Ok(records)
    })
}

// ============================================================================
// EXPANSION
// ============================================================================

/// Returns the group's new expansion state.
pub fn toggle_group(state: &HostState, grid_id: GridId, group_id: &str) -> Result<bool, String> {
    log_info!("GRID", "toggle_group grid_id={} group={}", grid_id, group_id);
    with_grid(state, grid_id, |grid| Ok(grid.toggle_group(&RowId::from(group_id))))
}

/// Toggles the group displayed at `index`; errors for leaves and bad indices.
pub fn toggle_group_at(state: &HostState, grid_id: GridId, index: usize) -> Result<bool, String> {
    log_info!("GRID", "toggle_group_at grid_id={} index={}", grid_id, index);
    with_grid(state, grid_id, |grid| {
        grid.toggle_group_at(index)
            .ok_or_else(|| format!("Row {} is not a group row", index))
    })
}

/// Returns true when the group's state changed.
pub fn set_group_open(state: &HostState, grid_id: GridId, group_id: &str, open: bool) -> Result<bool, String> {
    log_info!("GRID", "set_group_open grid_id={} group={} open={}", grid_id, group_id, open);
    with_grid(state, grid_id, |grid| Ok(grid.set_group_open(&RowId::from(group_id), open)))
}

/// Returns the visible row count after expanding.
pub fn expand_all(state: &HostState, grid_id: GridId) -> Result<usize, String> {
    log_info!("GRID", "expand_all grid_id={}", grid_id);
    with_grid(state, grid_id, |grid| {
        grid.expand_all();
        Ok(grid.count_visible())
    })
}

pub fn collapse_all(state: &HostState, grid_id: GridId) -> Result<usize, String> {
    log_info!("GRID", "collapse_all grid_id={}", grid_id);
    with_grid(state, grid_id, |grid| {
        grid.collapse_all();
        Ok(grid.count_visible())
    })
}

/// Drops expanded ids no current group carries; returns how many.
pub fn prune_expansion_state(state: &HostState, grid_id: GridId) -> Result<usize, String> {
    log_info!("GRID", "prune_expansion_state grid_id={}", grid_id);
    with_grid(state, grid_id, |grid| Ok(grid.prune_expansion_state()))
}

pub fn get_expansion_state(state: &HostState, grid_id: GridId) -> Result<ExpansionState, String> {
    with_grid(state, grid_id, |grid| Ok(grid.expansion_state().clone()))
}

pub fn set_expansion_state(
    state: &HostState,
    grid_id: GridId,
    expansion: ExpansionState,
) -> Result<usize, String> {
    log_info!("GRID", "set_expansion_state grid_id={} expanded={}", grid_id, expansion.len());
    with_grid(state, grid_id, |grid| {
        grid.set_expansion_state(expansion);
        Ok(grid.count_visible())
    })
}

/// Forces regeneration; returns how many of `row_ids` are known.
pub fn refresh_rows(state: &HostState, grid_id: GridId, row_ids: Option<Vec<String>>) -> Result<usize, String> {
    log_debug!("GRID", "refresh_rows grid_id={} ids={:?}", grid_id, row_ids.as_ref().map(Vec::len));
    with_grid(state, grid_id, |grid| {
        let ids: Option<Vec<RowId>> = row_ids.map(|ids| ids.into_iter().map(RowId::from).collect());
        Ok(grid.refresh(ids.as_deref()))
    })
}

// ============================================================================
// INTERACTION & EVENTS
// ============================================================================

/// Returns false when `index` is outside the sequence.
pub fn click_row(state: &HostState, grid_id: GridId, index: usize, event: PointerEvent) -> Result<bool, String> {
    log_debug!("GRID", "click_row grid_id={} index={}", grid_id, index);
    with_grid(state, grid_id, |grid| Ok(grid.click_row(index, event)))
}

pub fn click_cell(
    state: &HostState,
    grid_id: GridId,
    index: usize,
    col_id: &str,
    event: PointerEvent,
) -> Result<bool, String> {
    log_debug!("GRID", "click_cell grid_id={} index={} col={}", grid_id, index, col_id);
    with_grid(state, grid_id, |grid| {
        grid.click_cell(index, col_id, event).map_err(|e| e.to_string())
    })
}

/// Takes every event queued for a grid since the last drain.
pub fn drain_events(state: &HostState, grid_id: GridId) -> Result<Vec<GridEventData>, String> {
    let receivers = state
        .event_receivers
        .lock()
        .map_err(|e| format!("Lock error: {}", e))?;
    let receiver = receivers
        .get(&grid_id)
        .ok_or_else(|| format!("Grid {} not found", grid_id))?;
    Ok(receiver.try_iter().collect())
}

// ============================================================================
// LOGGING COMMANDS
// ============================================================================

/// Get next sequence number for renderer-side logging
pub fn get_next_seq() -> u64 {
    crate::logging::next_seq()
}

/// Write a renderer log message (seq assigned and written together)
pub fn log_renderer_atomic(level: String, category: String, message: String) -> Result<u64, String> {
    Ok(crate::logging::log_renderer(&level, &category, &message))
}
