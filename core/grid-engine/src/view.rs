//! FILENAME: core/grid-engine/src/view.rs
//! Grid View - The published, read-only snapshot a windowing renderer indexes.
//!
//! A view is immutable once built. Every mutation of the grid produces a new
//! view; snapshots already handed out stay valid and unchanged. The pieces a
//! view shares with its successor (rows, tree, stage order) are reference
//! counted, so republishing after an expansion or layout change does not copy
//! or rebuild them.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::definition::GridLayout;
use crate::expansion::ExpansionState;
use crate::flatten::{flatten, TreeRow};
use crate::row::{RowId, RowNode};
use crate::tree::Tree;

// ============================================================================
// WINDOWING
// ============================================================================

/// The slice of the flattened sequence a viewport needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisibleRange {
    /// First row to render (inclusive).
    pub start: usize,

    /// One past the last row to render.
    pub end: usize,

    /// Pixel offset of `start` from the top of the content.
    pub offset_px: u64,

    /// Height of the whole content (all visible rows).
    pub total_height: u64,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ============================================================================
// VIEW
// ============================================================================

pub struct GridView<T> {
    /// Increments on every published view of a grid.
    pub generation: u64,

    pub layout: GridLayout,

    rows: Arc<[T]>,

    tree: Arc<Tree>,

    /// Source indices after filter and sort, before grouping.
    leaf_order: Arc<[usize]>,

    /// Source indices after filter only, in source order.
    filtered_order: Arc<[usize]>,

    visible: Arc<[TreeRow]>,
}

impl<T> GridView<T> {
    pub fn new(
        generation: u64,
        layout: GridLayout,
        rows: Arc<[T]>,
        tree: Arc<Tree>,
        leaf_order: Arc<[usize]>,
        filtered_order: Arc<[usize]>,
        visible: Arc<[TreeRow]>,
    ) -> Self {
        GridView {
            generation,
            layout,
            rows,
            tree,
            leaf_order,
            filtered_order,
            visible,
        }
    }

    /// A view with no rows.
    pub fn empty(layout: GridLayout) -> Self {
        GridView::new(
            0,
            layout,
            Arc::from(Vec::new()),
            Arc::new(Tree::new()),
            Arc::from(Vec::new()),
            Arc::from(Vec::new()),
            Arc::from(Vec::new()),
        )
    }

    // ------------------------------------------------------------------------
    // Windowed access
    // ------------------------------------------------------------------------

    /// Length of the flattened sequence.
    pub fn count_visible(&self) -> usize {
        self.visible.len()
    }

    /// Bounds-checked access. Negative and out-of-range indices yield `None`.
    pub fn row_at<I: TryInto<usize>>(&self, index: I) -> Option<&TreeRow> {
        let index = index.try_into().ok()?;
        self.visible.get(index)
    }

    pub fn node_at<I: TryInto<usize>>(&self, index: I) -> Option<&RowNode> {
        self.row_at(index).map(|row| &row.node)
    }

    /// The record behind the row at `index`; `None` for groups.
    pub fn data_at<I: TryInto<usize>>(&self, index: I) -> Option<&T> {
        self.row_at(index).and_then(|row| self.data_for(row))
    }

    pub fn data_for(&self, row: &TreeRow) -> Option<&T> {
        row.node.source_index().and_then(|index| self.rows.get(index))
    }

    /// Contiguous slice `[start, end)`, clamped to the sequence.
    pub fn rows_in_range(&self, start: usize, end: usize) -> &[TreeRow] {
        let end = end.min(self.visible.len());
        let start = start.min(end);
        &self.visible[start..end]
    }

    /// How many of `ids` name a node of the tree, inside collapsed groups
    /// or not. Leaf ids resolve through their source index; group ids go
    /// through a set built once per call. Linear in leaves plus ids.
    pub fn count_known(&self, ids: &[RowId]) -> usize {
        if ids.is_empty() {
            return 0;
        }

        let mut leaves = vec![false; self.rows.len()];
        for &index in self.leaf_order.iter() {
            if let Some(slot) = leaves.get_mut(index) {
                *slot = true;
            }
        }

        let groups: FxHashSet<RowId> = if ids.iter().any(RowId::is_group) {
            self.tree.group_ids().into_iter().collect()
        } else {
            FxHashSet::default()
        };

        ids.iter()
            .filter(|id| match id.source_index() {
                Some(index) => leaves.get(index).copied().unwrap_or(false),
                None => groups.contains(*id),
            })
            .count()
    }

    /// Position of a row in the flattened sequence.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.visible.iter().position(|row| row.id().as_str() == id)
    }

    pub fn visible_rows(&self) -> &[TreeRow] {
        &self.visible
    }

    /// Fixed-row-height windowing: which rows cover the viewport, plus
    /// `overscan` extra rows on each side.
    pub fn visible_range(&self, scroll_offset: f64, viewport_height: f64, overscan: usize) -> VisibleRange {
        let count = self.visible.len();
        let row_height = f64::from(self.layout.row_height.max(1));
        let total_height = count as u64 * u64::from(self.layout.row_height);

        if count == 0 {
            return VisibleRange::default();
        }

        let scroll_offset = if scroll_offset.is_finite() { scroll_offset.max(0.0) } else { 0.0 };
        let viewport_height = if viewport_height.is_finite() { viewport_height.max(0.0) } else { 0.0 };

        let first = ((scroll_offset / row_height).floor() as usize).min(count);
        let last = (((scroll_offset + viewport_height) / row_height).ceil() as usize).min(count);

        let start = first.saturating_sub(overscan);
        let end = last.saturating_add(overscan).min(count).max(start);

        VisibleRange {
            start,
            end,
            offset_px: start as u64 * u64::from(self.layout.row_height),
            total_height,
        }
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// Every group and leaf regardless of expansion, pre-order, with depth.
    pub fn for_each_node<F: FnMut(&RowNode, usize)>(&self, visitor: F) {
        self.tree.for_each_node(visitor);
    }

    /// The flattened sequence, with each row's position.
    pub fn for_each_visible<F: FnMut(usize, &TreeRow)>(&self, mut visitor: F) {
        for (index, row) in self.visible.iter().enumerate() {
            visitor(index, row);
        }
    }

    /// Data rows that pass the filters, in source order.
    pub fn for_each_leaf_after_filter<F: FnMut(usize, &T)>(&self, visitor: F) {
        self.visit_leaves(&self.filtered_order, visitor);
    }

    /// Data rows that pass the filters, in sorted order.
    pub fn for_each_leaf_after_filter_and_sort<F: FnMut(usize, &T)>(&self, visitor: F) {
        self.visit_leaves(&self.leaf_order, visitor);
    }

    fn visit_leaves<F: FnMut(usize, &T)>(&self, order: &[usize], mut visitor: F) {
        for &index in order {
            if let Some(record) = self.rows.get(index) {
                visitor(index, record);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn rows(&self) -> &Arc<[T]> {
        &self.rows
    }

    /// Number of data rows that passed the filters.
    pub fn leaf_count(&self) -> usize {
        self.leaf_order.len()
    }

    // ------------------------------------------------------------------------
    // Republishing
    // ------------------------------------------------------------------------

    /// Same data and tree, re-flattened for a new expansion state.
    pub fn with_expansion(&self, expansion: &ExpansionState, generation: u64) -> Self {
        let visible = flatten(&self.tree, expansion, 0);
        GridView {
            generation,
            visible: Arc::from(visible),
            ..self.clone()
        }
    }

    /// Same rows, new layout. Nothing is recomputed.
    pub fn with_layout(&self, layout: GridLayout, generation: u64) -> Self {
        GridView {
            generation,
            layout,
            ..self.clone()
        }
    }
}

impl<T> Clone for GridView<T> {
    fn clone(&self) -> Self {
        GridView {
            generation: self.generation,
            layout: self.layout,
            rows: Arc::clone(&self.rows),
            tree: Arc::clone(&self.tree),
            leaf_order: Arc::clone(&self.leaf_order),
            filtered_order: Arc::clone(&self.filtered_order),
            visible: Arc::clone(&self.visible),
        }
    }
}

impl<T> fmt::Debug for GridView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridView")
            .field("generation", &self.generation)
            .field("layout", &self.layout)
            .field("rows", &self.rows.len())
            .field("leaves", &self.leaf_order.len())
            .field("visible", &self.visible.len())
            .finish()
    }
}
