//! Property-based tests for the grouped row pipeline using proptest.

use std::sync::Arc;

use grid_engine::{
    build_tree, calculate_view, flatten, ExpansionState, FieldValue, GridDefinition, GridService,
    RowId, RowNode, SortSpec,
};
use proptest::prelude::*;
use serde_json::{json, Value};

const DEPARTMENTS: [&str; 4] = ["Eng", "Sales", "HR", "Ops"];
const REGIONS: [&str; 3] = ["North", "South", "West"];

/// Rows with a small key space so groups have several members.
/// `None` leaves the field out of the record entirely.
fn arb_rows() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (
            prop::option::of(0usize..DEPARTMENTS.len()),
            0usize..REGIONS.len(),
            0i64..1000,
        ),
        0..120,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (dept, region, amount))| {
                let mut row = json!({ "id": i, "region": REGIONS[region], "amount": amount });
                if let Some(dept) = dept {
                    row["department"] = json!(DEPARTMENTS[dept]);
                }
                row
            })
            .collect()
    })
}

fn arb_grouping() -> impl Strategy<Value = Vec<String>> {
    prop_oneof![
        Just(vec![]),
        Just(vec!["department".to_string()]),
        Just(vec!["region".to_string()]),
        Just(vec!["department".to_string(), "region".to_string()]),
        Just(vec!["region".to_string(), "department".to_string()]),
    ]
}

fn identity(rows: &[Value]) -> Vec<usize> {
    (0..rows.len()).collect()
}

fn leaf_indices(rows: &[grid_engine::TreeRow]) -> Vec<usize> {
    rows.iter().filter_map(|row| row.node.source_index()).collect()
}

proptest! {
    /// Collapsed: only top-level rows, all at depth 0.
    #[test]
    fn collapsed_shows_only_top_level(rows in arb_rows(), keys in arb_grouping()) {
        let tree = build_tree(&rows, &identity(&rows), &keys, 0);
        let flat = flatten(&tree, &ExpansionState::new(), 0);
        prop_assert_eq!(flat.len(), tree.len());
        prop_assert!(flat.iter().all(|row| row.depth == 0));
        if keys.is_empty() {
            prop_assert_eq!(leaf_indices(&flat), identity(&rows));
        } else {
            prop_assert!(flat.iter().all(|row| row.node.is_group()));
        }
    }

    /// Fully expanded: every row appears exactly once.
    #[test]
    fn expand_all_loses_no_rows(rows in arb_rows(), keys in arb_grouping()) {
        let tree = build_tree(&rows, &identity(&rows), &keys, 0);
        let mut state = ExpansionState::new();
        state.expand_all(tree.group_ids());
        let flat = flatten(&tree, &state, 0);

        let mut leaves = leaf_indices(&flat);
        leaves.sort_unstable();
        prop_assert_eq!(leaves, identity(&rows));

        // Leaves sit exactly one level below the innermost group
        for row in flat.iter().filter(|row| !row.node.is_group()) {
            prop_assert_eq!(row.depth, keys.len());
        }
    }

    /// Toggling a group twice restores the sequence exactly.
    #[test]
    fn toggle_twice_is_identity(rows in arb_rows(), keys in arb_grouping(), pick in any::<prop::sample::Index>()) {
        let tree = build_tree(&rows, &identity(&rows), &keys, 0);
        let ids = tree.group_ids();
        prop_assume!(!ids.is_empty());
        let id = pick.get(&ids).clone();

        let state = ExpansionState::new();
        let before = flatten(&tree, &state, 0);
        let state = state.toggle(&id).toggle(&id);
        prop_assert_eq!(flatten(&tree, &state, 0), before);
    }

    /// A leaf is emitted iff every group on its path is expanded.
    #[test]
    fn leaf_visible_iff_ancestors_expanded(
        rows in arb_rows(),
        keys in arb_grouping(),
        open in prop::collection::vec(any::<bool>(), 0..64),
    ) {
        let tree = build_tree(&rows, &identity(&rows), &keys, 0);
        let ids = tree.group_ids();
        let mut state = ExpansionState::new();
        for (id, &is_open) in ids.iter().zip(open.iter()) {
            state.set_open(id, is_open);
        }
        let flat = flatten(&tree, &state, 0);
        let shown: std::collections::HashSet<usize> = leaf_indices(&flat).into_iter().collect();

        for (index, row) in rows.iter().enumerate() {
            let mut parent: Option<RowId> = None;
            let mut all_open = true;
            for (level, field) in keys.iter().enumerate() {
                let key = row.get(field).map(FieldValue::from).unwrap_or_default().group_key();
                let id = RowId::group(parent.as_ref(), level, field, &key);
                all_open &= state.is_expanded(id.as_str());
                parent = Some(id);
            }
            prop_assert_eq!(shown.contains(&index), all_open);
        }
    }

    /// Identical inputs give identical sequences and identifiers.
    #[test]
    fn rebuild_is_deterministic(rows in arb_rows(), keys in arb_grouping()) {
        let rows: Arc<[Value]> = Arc::from(rows);
        let definition = GridDefinition::new()
            .with_group_by(keys)
            .with_sort(vec![SortSpec::asc("amount")]);
        let mut state = ExpansionState::new();
        if let Ok(first) = calculate_view(Arc::clone(&rows), &definition, &state, 1) {
            state.expand_all(first.tree().group_ids());
            let a = calculate_view(Arc::clone(&rows), &definition, &state, 2).unwrap();
            let b = calculate_view(Arc::clone(&rows), &definition, &state, 3).unwrap();
            prop_assert_eq!(a.visible_rows(), b.visible_rows());
        }
    }

    /// The count always matches the sequence, and indices outside it read as None.
    #[test]
    fn count_matches_sequence(rows in arb_rows(), toggles in prop::collection::vec(0usize..40, 0..10)) {
        let mut grid: GridService<Value> = GridService::new();
        grid.set_rows(rows).unwrap();
        // Some generated collections lack the field entirely; skip those
        if grid.set_grouping_keys(["department", "region"]).is_err() {
            return Ok(());
        }
        for index in toggles {
            grid.toggle_group_at(index);
            let view = grid.view();
            prop_assert_eq!(grid.count_visible(), view.visible_rows().len());
            prop_assert!(grid.row_at(-1).is_none());
            prop_assert!(grid.row_at(grid.count_visible()).is_none());
        }
    }

    /// Group identifiers are unique within a tree.
    #[test]
    fn group_ids_are_unique(rows in arb_rows(), keys in arb_grouping()) {
        let tree = build_tree(&rows, &identity(&rows), &keys, 0);
        let ids = tree.group_ids();
        let unique: std::collections::HashSet<&RowId> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

fn create_department_rows() -> Vec<Value> {
    let mut rows = Vec::new();
    for i in 0..3 {
        for dept in ["Eng", "Sales", "HR"] {
            rows.push(json!({ "name": format!("{}-{}", dept, i), "department": dept }));
        }
    }
    rows
}

#[test]
fn test_three_departments_collapsed_then_expanded() {
    let mut grid: GridService<Value> = GridService::new();
    grid.set_rows(create_department_rows()).unwrap();
    grid.set_grouping_keys(["department"]).unwrap();

    assert_eq!(grid.count_visible(), 3);
    let keys: Vec<String> = grid
        .rows_in_range(0, 3)
        .iter()
        .map(|row| {
            assert_eq!(row.depth, 0);
            row.node.as_group().unwrap().key.clone()
        })
        .collect();
    assert_eq!(keys, vec!["Eng", "Sales", "HR"]);

    grid.toggle_group(&RowId::group(None, 0, "department", "Eng"));
    let shown: Vec<(String, usize)> = grid
        .rows_in_range(0, 4)
        .iter()
        .map(|row| (row.id().to_string(), row.depth))
        .collect();
    assert_eq!(
        shown,
        vec![
            ("group/0:department=Eng".to_string(), 0),
            ("row-0".to_string(), 1),
            ("row-3".to_string(), 1),
            ("row-6".to_string(), 1),
        ]
    );
    assert_eq!(grid.row_at(4).unwrap().id().as_str(), "group/0:department=Sales");
}

#[test]
fn test_no_grouping_maps_rows_one_to_one() {
    let rows = create_department_rows();
    let mut grid: GridService<Value> = GridService::new();
    grid.set_rows(rows.clone()).unwrap();
    grid.expand_all();
    assert_eq!(grid.count_visible(), rows.len());
    for index in 0..rows.len() {
        let row = grid.row_at(index).unwrap();
        assert_eq!(row.depth, 0);
        assert!(matches!(&row.node, RowNode::Leaf(leaf) if leaf.source_index == index));
    }
}

#[test]
fn test_null_group_is_distinct_from_text_null_upper() {
    let rows = vec![
        json!({ "department": null }),
        json!({ "department": "NULL" }),
        json!({ "name": "no department" }),
    ];
    let mut grid: GridService<Value> = GridService::new();
    grid.set_rows(rows).unwrap();
    grid.set_grouping_keys(["department"]).unwrap();
    assert_eq!(grid.count_visible(), 2);

    let null_group = grid.row_at(0).unwrap().node.as_group().unwrap().clone();
    assert_eq!(null_group.key, "null");
    assert_eq!(null_group.leaf_count, 2);
    assert_eq!(grid.row_at(1).unwrap().node.as_group().unwrap().key, "NULL");
}

#[test]
fn test_expansion_survives_reload() {
    let mut grid: GridService<Value> = GridService::new();
    grid.set_rows(create_department_rows()).unwrap();
    grid.set_grouping_keys(["department"]).unwrap();
    grid.set_group_open(&RowId::group(None, 0, "department", "HR"), true);
    assert_eq!(grid.count_visible(), 6);

    // Same shape, different records
    let reloaded: Vec<Value> = create_department_rows()
        .into_iter()
        .rev()
        .collect();
    grid.set_rows(reloaded).unwrap();
    assert_eq!(grid.count_visible(), 6);
    assert_eq!(grid.row_at(0).unwrap().id().as_str(), "group/0:department=HR");
    assert!(grid.row_at(0).unwrap().expanded);
}

#[test]
fn test_failed_reconfiguration_leaves_view_unchanged() {
    let mut grid: GridService<Value> = GridService::new();
    grid.set_rows(create_department_rows()).unwrap();
    grid.set_grouping_keys(["department"]).unwrap();
    let before = grid.view();

    assert!(grid.set_grouping_keys(["department", "department"]).is_err());
    assert!(grid.set_grouping_keys(["missing"]).is_err());
    assert!(grid.set_row_height(0).is_err());

    assert_eq!(grid.count_visible(), before.count_visible());
    assert_eq!(grid.row_at(0), before.row_at(0));
    assert_eq!(grid.view().generation, before.generation);
}

#[test]
fn test_snapshot_outlives_rebuild() {
    let mut grid: GridService<Value> = GridService::new();
    grid.set_rows(create_department_rows()).unwrap();
    let snapshot = grid.view();
    grid.set_grouping_keys(["department"]).unwrap();
    assert_eq!(snapshot.count_visible(), 9);
    assert_eq!(grid.count_visible(), 3);
}
