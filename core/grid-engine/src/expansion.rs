//! FILENAME: core/grid-engine/src/expansion.rs
//! Expansion State Store - Which groups are open.
//!
//! A group is expanded iff its identifier is in the set. The store is keyed
//! purely by identifier, so it outlives any particular tree: rebuilding with
//! new data keeps every group whose identifier still derives the same.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::row::RowId;
use crate::tree::Tree;

/// The set of currently expanded group identifiers. Default empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionState {
    #[serde(default)]
    expanded: FxHashSet<RowId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Flips membership of `id` and returns the resulting state.
    pub fn toggle(mut self, id: &RowId) -> Self {
        if !self.expanded.remove(id.as_str()) {
            self.expanded.insert(id.clone());
        }
        self
    }

    /// Opens or closes one group. Returns true when membership changed.
    pub fn set_open(&mut self, id: &RowId, open: bool) -> bool {
        if open {
            self.expanded.insert(id.clone())
        } else {
            self.expanded.remove(id.as_str())
        }
    }

    /// Replaces the set with exactly `ids` (normally `Tree::group_ids`).
    pub fn expand_all<I: IntoIterator<Item = RowId>>(&mut self, ids: I) {
        self.expanded = ids.into_iter().collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowId> {
        self.expanded.iter()
    }

    /// Drops identifiers that no group of `tree` carries.
    /// Returns the number of identifiers removed.
    pub fn retain_known(&mut self, tree: &Tree) -> usize {
        let known: FxHashSet<RowId> = tree.group_ids().into_iter().collect();
        let before = self.expanded.len();
        self.expanded.retain(|id| known.contains(id));
        before - self.expanded.len()
    }
}

impl FromIterator<RowId> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        ExpansionState {
            expanded: iter.into_iter().collect(),
        }
    }
}
