//! FILENAME: core/grid-engine/src/flatten.rs
//! Flattener - Turns the group tree into the linear sequence a renderer indexes.
//!
//! Pre-order walk: each entry is emitted at the current depth, and an expanded
//! group's children follow it immediately at `depth + 1`. Collapsed subtrees
//! are never visited, so the cost is proportional to the rows emitted.

use serde::{Deserialize, Serialize};

use crate::expansion::ExpansionState;
use crate::row::{RowId, RowNode};
use crate::tree::Tree;

/// One row of the flattened sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRow {
    pub node: RowNode,

    /// Nesting depth (0 = top level).
    pub depth: usize,

    /// Always true: collapsed rows are excluded rather than hidden.
    pub visible: bool,

    /// Expansion state for group rows; always false for leaves.
    pub expanded: bool,
}

impl TreeRow {
    pub fn id(&self) -> &RowId {
        self.node.id()
    }

    pub fn is_group(&self) -> bool {
        self.node.is_group()
    }
}

/// Flattens `tree` starting at `depth`.
pub fn flatten(tree: &Tree, expansion: &ExpansionState, depth: usize) -> Vec<TreeRow> {
    let mut rows = Vec::with_capacity(tree.len());
    flatten_into(tree, expansion, depth, &mut rows);
    rows
}

fn flatten_into(tree: &Tree, expansion: &ExpansionState, depth: usize, out: &mut Vec<TreeRow>) {
    for entry in tree {
        let expanded = entry.is_group() && expansion.is_expanded(entry.id().as_str());

        out.push(TreeRow {
            node: entry.node.clone(),
            depth,
            visible: true,
            expanded,
        });

        if expanded {
            if let Some(children) = &entry.children {
                flatten_into(children, expansion, depth + 1, out);
            }
        }
    }
}
