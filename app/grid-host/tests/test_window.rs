//! FILENAME: app/grid-host/tests/test_window.rs
//! PURPOSE: Tests for windowed reads, layout and column commands.

mod common;

use common::TestHarness;
use grid_engine::{GridId, SortDirection};
use grid_host::{
    expand_all, get_grid_info, get_row_at, get_row_count, get_row_window, set_column_width,
    set_header_height, set_row_height, sort_by_column, RowWindowRequest,
};

fn window(grid_id: GridId, scroll_offset: f64, viewport_height: f64, overscan: usize) -> RowWindowRequest {
    RowWindowRequest {
        grid_id,
        scroll_offset,
        viewport_height,
        overscan,
    }
}

#[test]
fn test_window_covers_viewport_only() {
    let (harness, grid_id) = TestHarness::with_large_data(100_000, &[]);
    assert_eq!(get_row_count(&harness.state, grid_id), Ok(100_000));

    let response = get_row_window(&harness.state, window(grid_id, 500_000.0, 600.0, 2)).unwrap();
    assert_eq!(response.start, 9_998);
    assert_eq!(response.end, 10_014);
    assert_eq!(response.rows.len(), 16);
    assert_eq!(response.total_rows, 100_000);
    assert_eq!(response.total_height, 5_000_000);
    assert_eq!(response.offset_px, 9_998 * 50);
    assert_eq!(response.rows[0].index, 9_998);
    assert_eq!(response.rows[0].id, "row-9998");
}

#[test]
fn test_window_on_grouped_large_data() {
    let (harness, grid_id) = TestHarness::with_large_data(100_000, &["department", "city"]);
    let response = get_row_window(&harness.state, window(grid_id, 0.0, 1_000.0, 3)).unwrap();
    assert_eq!(response.total_rows, 3);
    assert_eq!(response.rows.len(), 3);

    assert_eq!(expand_all(&harness.state, grid_id), Ok(3 + 12 + 100_000));
    let response = get_row_window(&harness.state, window(grid_id, 0.0, 200.0, 0)).unwrap();
    assert_eq!(response.rows.len(), 4);
    assert_eq!(response.rows[0].depth, 0);
    assert_eq!(response.rows[1].depth, 1);
    assert_eq!(response.rows[2].depth, 2);
}

#[test]
fn test_window_past_end_is_clamped() {
    let (harness, grid_id) = TestHarness::with_employees(&[]);
    let response = get_row_window(&harness.state, window(grid_id, 10_000.0, 500.0, 3)).unwrap();
    assert_eq!(response.end, 9);
    assert_eq!(response.start, 6);
    assert_eq!(response.rows.len(), 3);
}

#[test]
fn test_row_at_bounds() {
    let (harness, grid_id) = TestHarness::with_employees(&[]);
    assert!(get_row_at(&harness.state, grid_id, -1).unwrap().is_none());
    assert!(get_row_at(&harness.state, grid_id, 9).unwrap().is_none());
    assert!(get_row_at(&harness.state, grid_id, 8).unwrap().is_some());
}

#[test]
fn test_row_height_changes_geometry() {
    let (harness, grid_id) = TestHarness::with_employees(&[]);
    let info = set_row_height(&harness.state, grid_id, 25).unwrap();
    assert_eq!(info.row_height, 25);

    let response = get_row_window(&harness.state, window(grid_id, 50.0, 50.0, 0)).unwrap();
    assert_eq!((response.start, response.end), (2, 4));
    assert_eq!(response.total_height, 225);

    assert!(set_row_height(&harness.state, grid_id, 0).is_err());
    assert_eq!(get_grid_info(&harness.state, grid_id).unwrap().row_height, 25);

    let info = set_header_height(&harness.state, grid_id, 32).unwrap();
    assert_eq!(info.header_height, 32);
}

#[test]
fn test_column_width_is_clamped() {
    let (harness, grid_id) = TestHarness::with_employees(&[]);
    assert_eq!(set_column_width(&harness.state, grid_id, "salary", 500), Ok(240));
    assert_eq!(set_column_width(&harness.state, grid_id, "salary", 10), Ok(80));
    assert_eq!(set_column_width(&harness.state, grid_id, "name", 10), Ok(10));
    assert!(set_column_width(&harness.state, grid_id, "missing", 10).is_err());

    let info = get_grid_info(&harness.state, grid_id).unwrap();
    let salary = info.columns.iter().find(|c| c.col_id == "salary").unwrap();
    assert_eq!(salary.width, 80);
    let city = info.columns.iter().find(|c| c.col_id == "city").unwrap();
    assert_eq!(city.width, 150);
    assert_eq!(city.header_name, "city");
}

#[test]
fn test_sort_by_column_requires_sortable() {
    let (harness, grid_id) = TestHarness::with_employees(&[]);
    sort_by_column(&harness.state, grid_id, "name", Some(SortDirection::Desc)).unwrap();
    let first = get_row_at(&harness.state, grid_id, 0).unwrap().unwrap();
    assert_eq!(first.cells[0].display, "Ivy");

    let err = sort_by_column(&harness.state, grid_id, "city", Some(SortDirection::Asc)).unwrap_err();
    assert_eq!(err, "Column is not sortable: city");

    sort_by_column(&harness.state, grid_id, "name", None).unwrap();
    assert_eq!(get_row_at(&harness.state, grid_id, 0).unwrap().unwrap().id, "row-0");
}

#[test]
fn test_unknown_grid_is_error() {
    let harness = TestHarness::new();
    assert_eq!(get_row_count(&harness.state, 42), Err("Grid 42 not found".to_string()));
}
