//! FILENAME: core/grid-engine/src/engine.rs
//! View Engine - The pure derivation from configuration and data to a view.
//!
//! This module takes a GridDefinition (configuration), the caller's rows and
//! the expansion state and produces a GridView (sequence ready for windowing).
//!
//! Algorithm:
//! 1. Validate the definition against the rows
//! 2. Filter, then sort, the source indices
//! 3. Build the group tree over the surviving indices
//! 4. Flatten the tree according to the expansion state
//!
//! Nothing here mutates its inputs; identical inputs give identical views.

use std::sync::Arc;

use log::debug;

use crate::definition::GridDefinition;
use crate::error::GridResult;
use crate::expansion::ExpansionState;
use crate::flatten::flatten;
use crate::record::GridRecord;
use crate::stage::{filter_indices, sort_indices};
use crate::tree::build_tree;
use crate::view::GridView;

// ============================================================================
// VIEW CALCULATOR
// ============================================================================

/// One rebuild of a grid's derived state.
pub struct ViewCalculator<'a, T> {
    rows: &'a Arc<[T]>,
    definition: &'a GridDefinition,
    expansion: &'a ExpansionState,
}

impl<'a, T: GridRecord> ViewCalculator<'a, T> {
    pub fn new(
        rows: &'a Arc<[T]>,
        definition: &'a GridDefinition,
        expansion: &'a ExpansionState,
    ) -> Self {
        ViewCalculator {
            rows,
            definition,
            expansion,
        }
    }

    /// Executes the full pipeline and returns the view.
    pub fn calculate(&self, generation: u64) -> GridResult<GridView<T>> {
        // Step 1: Reject configurations the rows cannot satisfy
        self.definition.validate_for_rows(self.rows)?;

        // Step 2: Filter, then sort (stable, so ties keep source order)
        let filtered = filter_indices(self.rows, &self.definition.filters);
        let filtered_order: Arc<[usize]> = Arc::from(filtered);
        let leaf_order: Arc<[usize]> = if self.definition.sort.is_empty() {
            Arc::clone(&filtered_order)
        } else {
            let mut sorted = filtered_order.to_vec();
            sort_indices(self.rows, &mut sorted, &self.definition.sort);
            Arc::from(sorted)
        };

        // Step 3: Build the group tree
        let tree = build_tree(self.rows, &leaf_order, &self.definition.group_by, 0);

        // Step 4: Flatten for the current expansion state
        let visible = flatten(&tree, self.expansion, 0);

        debug!(
            "rebuilt grid view gen={} rows={} leaves={} groups={} visible={}",
            generation,
            self.rows.len(),
            leaf_order.len(),
            tree.node_count() - tree.leaf_count(),
            visible.len()
        );

        Ok(GridView::new(
            generation,
            self.definition.layout,
            Arc::clone(self.rows),
            Arc::new(tree),
            leaf_order,
            filtered_order,
            Arc::from(visible),
        ))
    }
}

/// Derives a view from rows, definition and expansion state.
pub fn calculate_view<T: GridRecord>(
    rows: Arc<[T]>,
    definition: &GridDefinition,
    expansion: &ExpansionState,
    generation: u64,
) -> GridResult<GridView<T>> {
    ViewCalculator::new(&rows, definition, expansion).calculate(generation)
}
