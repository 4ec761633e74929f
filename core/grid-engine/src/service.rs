//! FILENAME: core/grid-engine/src/service.rs
//! Grid Service - The stateful grid a renderer and its host talk to.
//!
//! Owns the caller's rows, the column descriptors, the definition and the
//! expansion state, and publishes the latest `GridView`. Every mutation
//! rebuilds synchronously before returning. A failed rebuild returns the
//! error and leaves the previous configuration and view in place.

use std::sync::Arc;

use log::{debug, warn};

use crate::column::ColumnDef;
use crate::definition::{FilterSpec, GridDefinition, GridLayout, SortDirection, SortSpec};
use crate::engine::calculate_view;
use crate::error::{GridError, GridResult};
use crate::events::{EventBus, GridEvent, ListenerId, PointerEvent};
use crate::expansion::ExpansionState;
use crate::flatten::TreeRow;
use crate::record::GridRecord;
use crate::row::{RowId, RowNode};
use crate::view::{GridView, VisibleRange};

pub struct GridService<T> {
    rows: Arc<[T]>,
    columns: Vec<ColumnDef<T>>,
    definition: GridDefinition,
    expansion: ExpansionState,

    /// The most recently published view.
    view: Arc<GridView<T>>,

    generation: u64,
    events: EventBus<T>,
}

impl<T: GridRecord> Default for GridService<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: GridRecord> GridService<T> {
    /// An empty grid with the default definition.
    pub fn new() -> Self {
        let definition = GridDefinition::default();
        GridService {
            rows: Arc::from(Vec::new()),
            columns: Vec::new(),
            view: Arc::new(GridView::empty(definition.layout)),
            definition,
            expansion: ExpansionState::new(),
            generation: 0,
            events: EventBus::new(),
        }
    }

    /// A grid built from rows, columns and a definition in one rebuild.
    pub fn with_data(
        rows: impl Into<Arc<[T]>>,
        columns: Vec<ColumnDef<T>>,
        definition: GridDefinition,
    ) -> GridResult<Self> {
        let mut grid = Self::new();
        grid.columns = columns;
        grid.rebuild(rows.into(), definition)?;
        Ok(grid)
    }

    // ========================================================================
    // INBOUND CONFIGURATION
    // ========================================================================

    /// Replaces the row collection. Expansion state is kept, so groups whose
    /// identifiers survive the reload stay open.
    pub fn set_rows(&mut self, rows: impl Into<Arc<[T]>>) -> GridResult<()> {
        self.rebuild(rows.into(), self.definition.clone())
    }

    /// Replaces the column descriptors. Columns do not affect the row
    /// sequence, so the view is not rebuilt.
    pub fn set_columns(&mut self, columns: Vec<ColumnDef<T>>) {
        self.columns = columns;
    }

    pub fn set_grouping_keys<S: Into<String>>(
        &mut self,
        fields: impl IntoIterator<Item = S>,
    ) -> GridResult<()> {
        let mut definition = self.definition.clone();
        definition.group_by = fields.into_iter().map(Into::into).collect();
        self.reconfigure(definition)
    }

    pub fn set_sort(&mut self, sort: Vec<SortSpec>) -> GridResult<()> {
        let mut definition = self.definition.clone();
        definition.sort = sort;
        self.reconfigure(definition)
    }

    /// Sorts by a single column; `None` clears the sort.
    pub fn sort_by_column(&mut self, col_id: &str, direction: Option<SortDirection>) -> GridResult<()> {
        let column = self
            .column(col_id)
            .ok_or_else(|| GridError::UnknownColumn(col_id.to_string()))?;
        if !column.sortable {
            return Err(GridError::ColumnNotSortable(col_id.to_string()));
        }
        let sort = match direction {
            Some(direction) => vec![SortSpec::new(col_id, direction)],
            None => Vec::new(),
        };
        self.set_sort(sort)
    }

    pub fn set_filters(&mut self, filters: Vec<FilterSpec>) -> GridResult<()> {
        let mut definition = self.definition.clone();
        definition.filters = filters;
        self.reconfigure(definition)
    }

    /// Changes the row height. The row sequence is reused as is.
    pub fn set_row_height(&mut self, px: u32) -> GridResult<()> {
        let layout = GridLayout {
            row_height: px,
            ..self.definition.layout
        };
        self.relayout(layout)
    }

    pub fn set_header_height(&mut self, px: u32) -> GridResult<()> {
        let layout = GridLayout {
            header_height: px,
            ..self.definition.layout
        };
        self.relayout(layout)
    }

    /// Replaces the whole configuration with a single rebuild.
    pub fn apply_definition(&mut self, definition: GridDefinition) -> GridResult<()> {
        self.reconfigure(definition)
    }

    /// Replaces the expansion state (e.g. one restored by the caller).
    pub fn set_expansion_state(&mut self, expansion: ExpansionState) {
        self.expansion = expansion;
        self.reflatten();
    }

    /// Clamps and stores a column width. Returns the width applied.
    pub fn set_column_width(&mut self, col_id: &str, width: u32) -> GridResult<u32> {
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.field == col_id)
            .ok_or_else(|| GridError::UnknownColumn(col_id.to_string()))?;
        let width = column.clamp_width(width);
        column.width = Some(width);
        Ok(width)
    }

    // ========================================================================
    // EXPANSION
    // ========================================================================

    /// Flips a group and emits `GroupToggled`. Returns the new state.
    pub fn toggle_group(&mut self, id: &RowId) -> bool {
        let expansion = std::mem::take(&mut self.expansion);
        self.expansion = expansion.toggle(id);
        let expanded = self.expansion.is_expanded(id.as_str());
        self.reflatten();
        self.emit_group_toggled(id, expanded);
        expanded
    }

    /// Toggles the group shown at `index`. `None` when the index is out of
    /// range or the row is a leaf.
    pub fn toggle_group_at<I: TryInto<usize>>(&mut self, index: I) -> Option<bool> {
        let id = match self.view.node_at(index) {
            Some(RowNode::Group(group)) => group.id.clone(),
            _ => return None,
        };
        Some(self.toggle_group(&id))
    }

    /// Opens or closes a group. Returns true when the state changed.
    pub fn set_group_open(&mut self, id: &RowId, open: bool) -> bool {
        let changed = self.expansion.set_open(id, open);
        if changed {
            self.reflatten();
        }
        changed
    }

    /// Expands every group of the current tree.
    pub fn expand_all(&mut self) {
        self.expansion.expand_all(self.view.tree().group_ids());
        self.reflatten();
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
        self.reflatten();
    }

    pub fn expansion_state(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Forgets expanded ids that no group of the current tree carries.
    /// Never runs implicitly, so state survives transient reloads.
    /// Returns the number of ids dropped.
    pub fn prune_expansion_state(&mut self) -> usize {
        let removed = self.expansion.retain_known(self.view.tree());
        if removed > 0 {
            debug!("pruned {} stale expanded ids", removed);
        }
        removed
    }

    /// Regenerates the view from the current data and configuration.
    /// Returns how many of `row_ids` the rebuilt tree knows; with `None`,
    /// the number of visible rows.
    pub fn refresh(&mut self, row_ids: Option<&[RowId]>) -> usize {
        if let Err(err) = self.rebuild(Arc::clone(&self.rows), self.definition.clone()) {
            // Previous view stays published
            warn!("refresh kept previous view: {}", err);
        }
        match row_ids {
            Some(ids) => self.view.count_known(ids),
            None => self.view.count_visible(),
        }
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// The published view. Cheap to clone and safe to keep.
    pub fn view(&self) -> Arc<GridView<T>> {
        Arc::clone(&self.view)
    }

    pub fn count_visible(&self) -> usize {
        self.view.count_visible()
    }

    pub fn row_at<I: TryInto<usize>>(&self, index: I) -> Option<&TreeRow> {
        self.view.row_at(index)
    }

    pub fn data_at<I: TryInto<usize>>(&self, index: I) -> Option<&T> {
        self.view.data_at(index)
    }

    pub fn rows_in_range(&self, start: usize, end: usize) -> &[TreeRow] {
        self.view.rows_in_range(start, end)
    }

    pub fn visible_range(&self, scroll_offset: f64, viewport_height: f64, overscan: usize) -> VisibleRange {
        self.view.visible_range(scroll_offset, viewport_height, overscan)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.view.index_of(id)
    }

    pub fn for_each_node<F: FnMut(&RowNode, usize)>(&self, visitor: F) {
        self.view.for_each_node(visitor);
    }

    pub fn for_each_visible<F: FnMut(usize, &TreeRow)>(&self, visitor: F) {
        self.view.for_each_visible(visitor);
    }

    pub fn for_each_leaf_after_filter<F: FnMut(usize, &T)>(&self, visitor: F) {
        self.view.for_each_leaf_after_filter(visitor);
    }

    pub fn for_each_leaf_after_filter_and_sort<F: FnMut(usize, &T)>(&self, visitor: F) {
        self.view.for_each_leaf_after_filter_and_sort(visitor);
    }

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    pub fn column(&self, col_id: &str) -> Option<&ColumnDef<T>> {
        self.columns.iter().find(|column| column.col_id() == col_id)
    }

    pub fn definition(&self) -> &GridDefinition {
        &self.definition
    }

    pub fn rows(&self) -> &Arc<[T]> {
        &self.rows
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&GridEvent<'_, T>) + Send + Sync + 'static,
    {
        self.events.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Emits `Ready` with this grid as the api handle.
    pub fn ready(&self) {
        self.events.emit(&GridEvent::Ready { api: self });
    }

    /// Emits `RowClicked` for the row at `index`. Returns false when the
    /// index is out of range.
    pub fn click_row<I: TryInto<usize>>(&self, index: I, event: PointerEvent) -> bool {
        let Some(row) = self.view.row_at(index) else {
            return false;
        };
        self.events.emit(&GridEvent::RowClicked {
            row,
            data: self.view.data_for(row),
            event,
        });
        true
    }

    /// Emits `CellClicked` for the cell at (`index`, `col_id`).
    pub fn click_cell<I: TryInto<usize>>(
        &self,
        index: I,
        col_id: &str,
        event: PointerEvent,
    ) -> GridResult<bool> {
        let column = self
            .column(col_id)
            .ok_or_else(|| GridError::UnknownColumn(col_id.to_string()))?;
        let Some(row) = self.view.row_at(index) else {
            return Ok(false);
        };
        let data = self.view.data_for(row);
        self.events.emit(&GridEvent::CellClicked {
            row,
            data,
            column,
            value: column.cell_value(row, data),
            event,
        });
        Ok(true)
    }

    // ========================================================================
    // REBUILD
    // ========================================================================

    fn reconfigure(&mut self, mut definition: GridDefinition) -> GridResult<()> {
        definition.version = self.definition.version;
        if definition == self.definition {
            return Ok(());
        }
        definition.bump_version();
        self.rebuild(Arc::clone(&self.rows), definition)
    }

    /// Runs the full pipeline and publishes the result on success.
    fn rebuild(&mut self, rows: Arc<[T]>, definition: GridDefinition) -> GridResult<()> {
        let generation = self.generation + 1;
        match calculate_view(Arc::clone(&rows), &definition, &self.expansion, generation) {
            Ok(view) => {
                self.rows = rows;
                self.definition = definition;
                self.publish(view);
                Ok(())
            }
            Err(err) => {
                warn!("grid rebuild rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Re-flattens the cached tree after an expansion change.
    fn reflatten(&mut self) {
        let view = self.view.with_expansion(&self.expansion, self.generation + 1);
        self.publish(view);
    }

    fn relayout(&mut self, layout: GridLayout) -> GridResult<()> {
        if let Err(err) = layout.validate() {
            warn!("grid layout rejected: {}", err);
            return Err(err);
        }
        if layout == self.definition.layout {
            return Ok(());
        }
        self.definition.layout = layout;
        self.definition.bump_version();
        let view = self.view.with_layout(layout, self.generation + 1);
        self.publish(view);
        Ok(())
    }

    fn publish(&mut self, view: GridView<T>) {
        self.generation = view.generation;
        debug!("published grid view gen={} visible={}", view.generation, view.count_visible());
        self.view = Arc::new(view);
    }

    fn emit_group_toggled(&self, id: &RowId, expanded: bool) {
        let row = self.view.index_of(id.as_str()).and_then(|index| self.view.row_at(index));
        self.events.emit(&GridEvent::GroupToggled {
            group_id: id,
            row,
            expanded,
        });
    }
}

impl<T> std::fmt::Debug for GridService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridService")
            .field("rows", &self.rows.len())
            .field("columns", &self.columns.len())
            .field("definition", &self.definition)
            .field("expanded", &self.expansion.len())
            .field("generation", &self.generation)
            .field("events", &self.events)
            .finish()
    }
}
