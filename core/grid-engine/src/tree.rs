//! FILENAME: core/grid-engine/src/tree.rs
//! Tree Builder - Partitions rows into nested groups.
//!
//! Algorithm (one call per level):
//! 1. If every grouping field is consumed, emit one leaf entry per row
//! 2. Otherwise scan the rows once, bucketing them by the stringified value
//!    of this level's field in first-seen order
//! 3. For each bucket, derive the group identifier from the parent path and
//!    recurse into the next level with the bucket's rows
//!
//! Each level touches each of its rows exactly once: O(N) per level,
//! O(N * D) for D grouping fields.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::record::{field_or_null, GridRecord};
use crate::row::{GroupNode, GroupPath, LeafRow, RowId, RowNode, GROUP_ID_ROOT};

// ============================================================================
// TREE STRUCTURES
// ============================================================================

/// One node of the tree: a group with its subtree, or a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub node: RowNode,

    /// Sub-tree for groups; `None` marks a leaf entry.
    pub children: Option<Tree>,

    /// The group's key; `None` for leaves.
    pub group_key: Option<String>,
}

impl TreeEntry {
    pub fn id(&self) -> &RowId {
        self.node.id()
    }

    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }
}

/// An ordered level of the group tree. Iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TreeEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Finds an entry anywhere in the tree by identifier. Group ids descend
    /// along their path; leaf ids may scan the whole tree.
    pub fn find(&self, id: &str) -> Option<&TreeEntry> {
        for entry in &self.entries {
            if entry.id().as_str() == id {
                return Some(entry);
            }
            if let Some(children) = &entry.children {
                // Group ids embed their parent's id, so only descend along the path
                let prefix = entry.id().as_str();
                let on_path = id.len() > prefix.len()
                    && id.starts_with(prefix)
                    && id.as_bytes()[prefix.len()] == b'/';
                if on_path {
                    return children.find(id);
                }
                if !is_group_id(id) {
                    if let Some(found) = children.find(id) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Every group identifier, in pre-order.
    pub fn group_ids(&self) -> Vec<RowId> {
        let mut ids = Vec::new();
        self.collect_group_ids(&mut ids);
        ids
    }

    fn collect_group_ids(&self, ids: &mut Vec<RowId>) {
        for entry in &self.entries {
            if let Some(children) = &entry.children {
                ids.push(entry.id().clone());
                children.collect_group_ids(ids);
            }
        }
    }

    /// Visits every node (groups and leaves, regardless of expansion)
    /// in pre-order, with its depth relative to this level.
    pub fn for_each_node<F: FnMut(&RowNode, usize)>(&self, mut visitor: F) {
        self.walk(0, &mut visitor);
    }

    fn walk<F: FnMut(&RowNode, usize)>(&self, depth: usize, visitor: &mut F) {
        for entry in &self.entries {
            visitor(&entry.node, depth);
            if let Some(children) = &entry.children {
                children.walk(depth + 1, visitor);
            }
        }
    }

    /// Number of data rows anywhere in the tree.
    pub fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match &entry.node {
                RowNode::Group(group) => group.leaf_count,
                RowNode::Leaf(_) => 1,
            })
            .sum()
    }

    /// Total number of nodes (groups plus leaves).
    pub fn node_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| 1 + entry.children.as_ref().map_or(0, Tree::node_count))
            .sum()
    }
}

fn is_group_id(id: &str) -> bool {
    id.starts_with(GROUP_ID_ROOT) && id[GROUP_ID_ROOT.len()..].starts_with('/')
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a TreeEntry;
    type IntoIter = std::slice::Iter<'a, TreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds the group tree for the rows listed in `order`.
///
/// `order` holds source indices into `rows` (the sort/filter stage output);
/// leaves keep that order and groups appear in first-seen order within it.
/// `level` is the first grouping field to apply; pass 0 for a full tree.
/// Entries of `order` past the end of `rows` are skipped.
pub fn build_tree<T: GridRecord>(
    rows: &[T],
    order: &[usize],
    grouping_keys: &[String],
    level: usize,
) -> Tree {
    build_level(rows, order, grouping_keys, level, None, &GroupPath::new())
}

fn build_level<T: GridRecord>(
    rows: &[T],
    order: &[usize],
    grouping_keys: &[String],
    level: usize,
    parent_id: Option<&RowId>,
    parent_path: &GroupPath,
) -> Tree {
    let Some(field) = grouping_keys.get(level) else {
        // Terminal level: one leaf per row, input order preserved
        let entries = order
            .iter()
            .filter(|&&source_index| source_index < rows.len())
            .map(|&source_index| TreeEntry {
                node: RowNode::Leaf(LeafRow::new(source_index)),
                children: None,
                group_key: None,
            })
            .collect();
        return Tree { entries };
    };

    let buckets = partition(rows, order, field);

    let mut entries = Vec::with_capacity(buckets.len());
    for (key, members) in buckets {
        let id = RowId::group(parent_id, level, field, &key);

        let mut path = parent_path.clone();
        path.push(key.clone());

        let children = build_level(rows, &members, grouping_keys, level + 1, Some(&id), &path);

        let group = GroupNode {
            id,
            field: field.clone(),
            key: key.clone(),
            level,
            path,
            child_count: children.len(),
            leaf_count: members.len(),
        };

        entries.push(TreeEntry {
            node: RowNode::Group(Arc::new(group)),
            children: Some(children),
            group_key: Some(key),
        });
    }

    Tree { entries }
}

/// Buckets `order` by the stringified value of `field`, in first-seen order.
fn partition<T: GridRecord>(rows: &[T], order: &[usize], field: &str) -> Vec<(String, Vec<usize>)> {
    let mut bucket_index: FxHashMap<String, usize> = FxHashMap::default();
    let mut buckets: Vec<(String, Vec<usize>)> = Vec::new();

    for &source_index in order {
        let Some(row) = rows.get(source_index) else {
            continue;
        };
        let key = field_or_null(row, field).group_key();
        match bucket_index.get(&key) {
            Some(&bucket) => buckets[bucket].1.push(source_index),
            None => {
                bucket_index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![source_index]));
            }
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn create_test_rows() -> Vec<Value> {
        vec![
            json!({ "department": "Eng", "role": "Dev" }),
            json!({ "department": "Sales", "role": "Rep" }),
            json!({ "department": "Eng", "role": "Lead" }),
            json!({ "department": null, "role": "Dev" }),
            json!({ "department": "Eng", "role": "Dev" }),
            json!({ "role": "Temp" }),
        ]
    }

    fn keys(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn identity(rows: &[Value]) -> Vec<usize> {
        (0..rows.len()).collect()
    }

    #[test]
    fn test_no_grouping_yields_flat_leaves() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &[], 0);
        assert_eq!(tree.len(), rows.len());
        assert!(tree.iter().all(|entry| !entry.is_group()));
        let ids: Vec<&str> = tree.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["row-0", "row-1", "row-2", "row-3", "row-4", "row-5"]);
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &keys(&["department"]), 0);
        let group_keys: Vec<&str> = tree
            .iter()
            .map(|e| e.group_key.as_deref().unwrap())
            .collect();
        assert_eq!(group_keys, vec!["Eng", "Sales", "null"]);
    }

    #[test]
    fn test_null_and_missing_share_sentinel_group() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &keys(&["department"]), 0);
        let null_group = tree.iter().find(|e| e.group_key.as_deref() == Some("null")).unwrap();
        let members: Vec<usize> = null_group
            .children
            .as_ref()
            .unwrap()
            .iter()
            .filter_map(|e| e.node.source_index())
            .collect();
        assert_eq!(members, vec![3, 5]);
    }

    #[test]
    fn test_nested_groups_and_counts() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &keys(&["department", "role"]), 0);
        let eng = tree.entries()[0].node.as_group().unwrap();
        assert_eq!(eng.key, "Eng");
        assert_eq!(eng.child_count, 2); // Dev, Lead
        assert_eq!(eng.leaf_count, 3);

        let eng_children = tree.entries()[0].children.as_ref().unwrap();
        let dev = eng_children.entries()[0].node.as_group().unwrap();
        assert_eq!(dev.level, 1);
        assert_eq!(dev.path.as_slice(), &["Eng".to_string(), "Dev".to_string()]);
        assert_eq!(dev.id.as_str(), "group/0:department=Eng/1:role=Dev");
        assert_eq!(dev.leaf_count, 2);
    }

    #[test]
    fn test_group_ids_pre_order() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &keys(&["department", "role"]), 0);
        let ids: Vec<String> = tree.group_ids().into_iter().map(String::from).collect();
        assert_eq!(
            ids,
            vec![
                "group/0:department=Eng",
                "group/0:department=Eng/1:role=Dev",
                "group/0:department=Eng/1:role=Lead",
                "group/0:department=Sales",
                "group/0:department=Sales/1:role=Rep",
                "group/0:department=null",
                "group/0:department=null/1:role=Dev",
                "group/0:department=null/1:role=Temp",
            ]
        );
    }

    #[test]
    fn test_group_ids_empty_for_flat_tree() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &[], 0);
        assert!(tree.group_ids().is_empty());
        assert!(Tree::new().group_ids().is_empty());
    }

    #[test]
    fn test_find_nested_entry() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &keys(&["department", "role"]), 0);
        let lead = tree.find("group/0:department=Eng/1:role=Lead").unwrap();
        assert_eq!(lead.group_key.as_deref(), Some("Lead"));
        assert_eq!(tree.find("row-2").and_then(|e| e.node.source_index()), Some(2));
        assert!(tree.find("group/0:department=HR").is_none());
    }

    #[test]
    fn test_counts() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &keys(&["department"]), 0);
        assert_eq!(tree.leaf_count(), 6);
        assert_eq!(tree.node_count(), 3 + 6);
    }

    #[test]
    fn test_for_each_node_visits_everything() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &identity(&rows), &keys(&["department"]), 0);
        let mut visited = Vec::new();
        tree.for_each_node(|node, depth| visited.push((node.id().to_string(), depth)));
        assert_eq!(visited.len(), 9);
        assert_eq!(visited[0], ("group/0:department=Eng".to_string(), 0));
        assert_eq!(visited[1], ("row-0".to_string(), 1));
    }

    #[test]
    fn test_respects_input_order() {
        let rows = create_test_rows();
        let tree = build_tree(&rows, &[4, 1, 0], &keys(&["department"]), 0);
        let eng = &tree.entries()[0];
        assert_eq!(eng.group_key.as_deref(), Some("Eng"));
        let leaves: Vec<usize> = eng
            .children
            .as_ref()
            .unwrap()
            .iter()
            .filter_map(|e| e.node.source_index())
            .collect();
        assert_eq!(leaves, vec![4, 0]);
    }

    #[test]
    fn test_out_of_range_order_entries_are_skipped() {
        let rows = create_test_rows();
        let flat = build_tree(&rows, &[1, 6, 0, 99], &[], 0);
        let ids: Vec<&str> = flat.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["row-1", "row-0"]);

        let grouped = build_tree(&rows, &[1, 6, 0, 99], &keys(&["department"]), 0);
        assert_eq!(grouped.leaf_count(), 2);
        assert_eq!(grouped.len(), 2);
    }
}
