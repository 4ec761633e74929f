//! FILENAME: core/grid-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Invalid grouping field: {0}")]
    InvalidGroupingField(String),

    #[error("Duplicate grouping field: {0}")]
    DuplicateGroupingField(String),

    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("Invalid filter field: {0}")]
    InvalidFilterField(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column is not sortable: {0}")]
    ColumnNotSortable(String),

    #[error("Invalid {name}: {value}px")]
    InvalidDimension { name: &'static str, value: u32 },
}

pub type GridResult<T> = Result<T, GridError>;
