//! FILENAME: core/grid-engine/src/row.rs
//! Row Model - Displayable entities and their identifiers.
//!
//! Every row the renderer can show is either a leaf (one caller record) or a
//! synthetic group. Both carry a `RowId` derived from structure, never from
//! the row's position in the flattened sequence:
//! - Leaves: `row-{source_index}`
//! - Groups: `group/{level}:{field}={key}` segments joined from the root,
//!   with `%`, `/`, `:` and `=` percent-escaped inside field and key
//!
//! The same logical group therefore gets the same identifier on every
//! rebuild, which is what lets expansion state survive data reloads.

use std::borrow::Borrow;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Prefix of every leaf identifier.
pub const LEAF_ID_PREFIX: &str = "row-";

/// Root segment of every group identifier.
pub const GROUP_ID_ROOT: &str = "group";

/// Group keys from the root down to (and including) a group.
pub type GroupPath = SmallVec<[String; 4]>;

// ============================================================================
// ROW IDENTIFIER
// ============================================================================

/// Stable identifier of a leaf or group row. Cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RowId(Arc<str>);

impl RowId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        RowId(id.into())
    }

    /// Identifier of the leaf wrapping the record at `source_index`.
    pub fn leaf(source_index: usize) -> Self {
        RowId(format!("{}{}", LEAF_ID_PREFIX, source_index).into())
    }

    /// Identifier of a group, derived from its parent's identifier plus
    /// this level's `(level, field, key)` segment.
    pub fn group(parent: Option<&RowId>, level: usize, field: &str, key: &str) -> Self {
        let parent = parent.map_or(GROUP_ID_ROOT, RowId::as_str);
        let mut id = String::with_capacity(parent.len() + field.len() + key.len() + 8);
        id.push_str(parent);
        // Writing into a String cannot fail
        let _ = write!(id, "/{}:", level);
        push_escaped(&mut id, field);
        id.push('=');
        push_escaped(&mut id, key);
        RowId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_group(&self) -> bool {
        self.0.starts_with(GROUP_ID_ROOT) && self.0[GROUP_ID_ROOT.len()..].starts_with('/')
    }

    /// The source index a leaf identifier encodes; `None` for groups.
    pub fn source_index(&self) -> Option<usize> {
        leaf_source_index(&self.0)
    }
}

/// Parses `row-{index}`. Only the exact form `RowId::leaf` produces is
/// accepted, so `row-07` or `row-+7` never alias `row-7`.
pub fn leaf_source_index(id: &str) -> Option<usize> {
    let digits = id.strip_prefix(LEAF_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

fn push_escaped(out: &mut String, segment: &str) {
    for ch in segment.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            ':' => out.push_str("%3A"),
            '=' => out.push_str("%3D"),
            other => out.push(other),
        }
    }
}

impl Borrow<str> for RowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({:?})", &*self.0)
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        RowId(value.into())
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId(value.into())
    }
}

impl From<RowId> for String {
    fn from(value: RowId) -> Self {
        value.0.to_string()
    }
}

// ============================================================================
// LEAF AND GROUP NODES
// ============================================================================

/// A data row: one caller record, referenced by its index in the row collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRow {
    pub id: RowId,

    /// Index of the record in the caller's row collection.
    pub source_index: usize,
}

impl LeafRow {
    pub fn new(source_index: usize) -> Self {
        LeafRow {
            id: RowId::leaf(source_index),
            source_index,
        }
    }
}

/// A synthetic row for one distinct value of a grouping field at one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
    pub id: RowId,

    /// The grouping field this level partitions on.
    pub field: String,

    /// Stringified group key (`"null"` for missing values).
    pub key: String,

    /// Nesting level (0 = outermost grouping field).
    pub level: usize,

    /// Group keys from the root down to this group.
    pub path: GroupPath,

    /// Number of direct children (sub-groups or leaves).
    pub child_count: usize,

    /// Number of data rows anywhere below this group.
    pub leaf_count: usize,
}

/// Either kind of displayable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowNode {
    Group(Arc<GroupNode>),
    Leaf(LeafRow),
}

impl RowNode {
    pub fn id(&self) -> &RowId {
        match self {
            RowNode::Group(group) => &group.id,
            RowNode::Leaf(leaf) => &leaf.id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, RowNode::Group(_))
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            RowNode::Group(group) => Some(group),
            RowNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafRow> {
        match self {
            RowNode::Leaf(leaf) => Some(leaf),
            RowNode::Group(_) => None,
        }
    }

    /// Index of the wrapped record, for leaves.
    pub fn source_index(&self) -> Option<usize> {
        self.as_leaf().map(|leaf| leaf.source_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_ids_follow_source_index() {
        assert_eq!(RowId::leaf(0).as_str(), "row-0");
        assert_eq!(LeafRow::new(42).id.as_str(), "row-42");
        assert!(!RowId::leaf(3).is_group());
    }

    #[test]
    fn test_leaf_source_index_round_trips_only_canonical_ids() {
        assert_eq!(RowId::leaf(0).source_index(), Some(0));
        assert_eq!(RowId::leaf(99_999).source_index(), Some(99_999));
        assert_eq!(leaf_source_index("row-07"), None);
        assert_eq!(leaf_source_index("row-+7"), None);
        assert_eq!(leaf_source_index("row-"), None);
        assert_eq!(leaf_source_index("rows-1"), None);
        assert_eq!(RowId::group(None, 0, "department", "Eng").source_index(), None);
    }

    #[test]
    fn test_group_ids_nest_parent_path() {
        let eng = RowId::group(None, 0, "department", "Eng");
        let dev = RowId::group(Some(&eng), 1, "role", "Dev");
        assert_eq!(eng.as_str(), "group/0:department=Eng");
        assert_eq!(dev.as_str(), "group/0:department=Eng/1:role=Dev");
        assert!(eng.is_group());
        assert!(dev.is_group());
    }

    #[test]
    fn test_group_ids_escape_separators() {
        // Without escaping these two paths would collide
        let a = RowId::group(None, 0, "dept", "a/1:role=b");
        let parent = RowId::group(None, 0, "dept", "a");
        let b = RowId::group(Some(&parent), 1, "role", "b");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "group/0:dept=a%2F1%3Arole%3Db");
    }

    #[test]
    fn test_same_key_different_level_or_parent() {
        let top = RowId::group(None, 0, "city", "Paris");
        let tx = RowId::group(None, 0, "state", "TX");
        let nested = RowId::group(Some(&tx), 1, "city", "Paris");
        assert_ne!(top, nested);
    }

    #[test]
    fn test_row_id_serializes_as_string() {
        let id = RowId::group(None, 0, "department", "HR");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"group/0:department=HR\"");
        let back: RowId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
