//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for grid host integration tests.

#![allow(dead_code)]

use grid_engine::{GridDefinition, GridId};
use grid_host::{create_grid, create_host_state, ColumnSpec, CreateGridRequest, HostState};
use serde_json::{json, Value};

/// Test harness for creating and managing host state.
pub struct TestHarness {
    pub state: HostState,
}

impl TestHarness {
    /// Create a new test harness with empty state.
    pub fn new() -> Self {
        TestHarness {
            state: create_host_state(),
        }
    }

    /// Create a harness holding one employee grid with the given grouping.
    pub fn with_employees(group_by: &[&str]) -> (Self, GridId) {
        let harness = Self::new();
        let grid_id = harness.create_employee_grid(group_by);
        (harness, grid_id)
    }

    /// Create a harness with a large generated dataset.
    pub fn with_large_data(rows: usize, group_by: &[&str]) -> (Self, GridId) {
        let harness = Self::new();
        let request = CreateGridRequest {
            rows: EmployeeFixture::generated(rows),
            columns: EmployeeFixture::columns(),
            definition: GridDefinition::new().with_group_by(group_by.iter().copied()),
        };
        let info = create_grid(&harness.state, request).expect("create large grid");
        (harness, info.grid_id)
    }

    pub fn create_employee_grid(&self, group_by: &[&str]) -> GridId {
        let request = CreateGridRequest {
            rows: EmployeeFixture::rows(),
            columns: EmployeeFixture::columns(),
            definition: GridDefinition::new().with_group_by(group_by.iter().copied()),
        };
        create_grid(&self.state, request)
            .expect("create employee grid")
            .grid_id
    }
}

/// Employee fixture: nine rows across three departments and two cities.
pub struct EmployeeFixture;

impl EmployeeFixture {
    pub const DEPARTMENTS: [&'static str; 3] = ["Engineering", "Sales", "Support"];

    /// (name, department, city, salary, active)
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, bool)> {
        vec![
            ("Alice", "Engineering", "Oslo", 95000.0, true),
            ("Bob", "Sales", "Lima", 62000.0, true),
            ("Charlie", "Engineering", "Lima", 88000.0, false),
            ("Diana", "Support", "Oslo", 51000.0, true),
            ("Eve", "Sales", "Oslo", 70000.0, true),
            ("Frank", "Support", "Lima", 48000.0, false),
            ("Grace", "Engineering", "Oslo", 102000.0, true),
            ("Henry", "Sales", "Lima", 66000.0, true),
            ("Ivy", "Support", "Oslo", 53000.0, true),
        ]
    }

    pub fn rows() -> Vec<Value> {
        Self::data()
            .into_iter()
            .map(|(name, department, city, salary, active)| {
                json!({
                    "name": name,
                    "department": department,
                    "city": city,
                    "salary": salary,
                    "active": active,
                })
            })
            .collect()
    }

    pub fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec {
                header_name: Some("Name".to_string()),
                sortable: true,
                ..ColumnSpec::new("name")
            },
            ColumnSpec {
                header_name: Some("Department".to_string()),
                cell_class: Some("dept".to_string()),
                ..ColumnSpec::new("department")
            },
            ColumnSpec::new("city"),
            ColumnSpec {
                sortable: true,
                resizable: true,
                width: Some(120),
                min_width: Some(80),
                max_width: Some(240),
                ..ColumnSpec::new("salary")
            },
        ]
    }

    /// Deterministic generated rows for volume tests.
    pub fn generated(count: usize) -> Vec<Value> {
        let cities = ["Oslo", "Lima", "Pune", "Kyiv"];
        (0..count)
            .map(|i| {
                json!({
                    "name": format!("emp-{}", i),
                    "department": Self::DEPARTMENTS[i % Self::DEPARTMENTS.len()],
                    "city": cities[(i / 3) % cities.len()],
                    "salary": 40000 + (i * 37) % 60000,
                    "active": i % 5 != 0,
                })
            })
            .collect()
    }
}
