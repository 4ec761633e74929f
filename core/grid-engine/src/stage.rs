//! FILENAME: core/grid-engine/src/stage.rs
//! Sort/Filter Stage - Orders and selects data rows before tree construction.
//!
//! The stage never touches the caller's collection. It produces the list of
//! source indices that survive the filters, in sorted order. The tree builder
//! then partitions that list, so groups appear in first-seen order *within*
//! the sorted sequence and leaves keep the sorted order inside their group.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::definition::{
    ComparisonOperator, FilterCondition, FilterSpec, SortDirection, SortSpec, TextOperator,
};
use crate::record::{field_or_null, GridRecord};
use crate::value::FieldValue;

/// Applies filters then sort, returning surviving source indices in order.
/// With no filters and no sort this is the identity order `0..rows.len()`.
pub fn filter_and_sort<T: GridRecord>(
    rows: &[T],
    filters: &[FilterSpec],
    sort: &[SortSpec],
) -> Vec<usize> {
    let mut order = filter_indices(rows, filters);
    sort_indices(rows, &mut order, sort);
    order
}

/// Source indices of the rows that pass every filter, in source order.
pub fn filter_indices<T: GridRecord>(rows: &[T], filters: &[FilterSpec]) -> Vec<usize> {
    if filters.is_empty() {
        return (0..rows.len()).collect();
    }
    (0..rows.len())
        .filter(|&index| passes_filters(&rows[index], filters))
        .collect()
}

/// Returns true when the record satisfies every filter.
pub fn passes_filters<T: GridRecord>(row: &T, filters: &[FilterSpec]) -> bool {
    filters
        .iter()
        .all(|spec| spec.condition.matches(&field_or_null(row, &spec.field)))
}

/// Stable multi-key sort of `order`. Sort keys are read once per row.
pub fn sort_indices<T: GridRecord>(rows: &[T], order: &mut Vec<usize>, sort: &[SortSpec]) {
    if sort.is_empty() {
        return;
    }
    let mut keyed: Vec<(usize, SmallVec<[FieldValue; 2]>)> = order
        .iter()
        .map(|&index| {
            let keys = sort
                .iter()
                .map(|spec| field_or_null(&rows[index], &spec.field))
                .collect();
            (index, keys)
        })
        .collect();

    // slice::sort_by is stable, so equal keys keep their input order
    keyed.sort_by(|(_, a), (_, b)| compare_keys(a, b, sort));

    order.clear();
    order.extend(keyed.into_iter().map(|(index, _)| index));
}

fn compare_keys(a: &[FieldValue], b: &[FieldValue], sort: &[SortSpec]) -> Ordering {
    for ((va, vb), spec) in a.iter().zip(b.iter()).zip(sort.iter()) {
        let ordering = match spec.direction {
            SortDirection::Asc => va.compare(vb),
            SortDirection::Desc => vb.compare(va),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// ============================================================================
// FILTER MATCHING
// ============================================================================

impl FilterCondition {
    /// Evaluates the condition against one field value.
    pub fn matches(&self, value: &FieldValue) -> bool {
        match self {
            FilterCondition::ValueList(values) => values.contains(value),
            FilterCondition::NumberFilter {
                operator,
                value: bound,
                value2,
            } => match value.as_f64() {
                Some(n) => compare_number(n, *operator, *bound, *value2),
                None => false,
            },
            FilterCondition::TextFilter {
                operator,
                value: needle,
                case_sensitive,
            } => {
                let text = value.to_string();
                if *case_sensitive {
                    compare_text(&text, *operator, needle)
                } else {
                    compare_text(&text.to_lowercase(), *operator, &needle.to_lowercase())
                }
            }
            FilterCondition::BooleanFilter(expected) => *value == FieldValue::Bool(*expected),
            FilterCondition::Blank => value.is_null(),
            FilterCondition::NotBlank => !value.is_null(),
        }
    }
}

fn compare_number(n: f64, operator: ComparisonOperator, bound: f64, bound2: Option<f64>) -> bool {
    let (low, high) = match bound2 {
        Some(other) if other < bound => (other, bound),
        Some(other) => (bound, other),
        None => (bound, bound),
    };
    match operator {
        ComparisonOperator::Equals => n == bound,
        ComparisonOperator::NotEquals => n != bound,
        ComparisonOperator::GreaterThan => n > bound,
        ComparisonOperator::GreaterThanOrEqual => n >= bound,
        ComparisonOperator::LessThan => n < bound,
        ComparisonOperator::LessThanOrEqual => n <= bound,
        ComparisonOperator::Between => n >= low && n <= high,
        ComparisonOperator::NotBetween => n < low || n > high,
    }
}

fn compare_text(text: &str, operator: TextOperator, needle: &str) -> bool {
    match operator {
        TextOperator::Equals => text == needle,
        TextOperator::NotEquals => text != needle,
        TextOperator::Contains => text.contains(needle),
        TextOperator::NotContains => !text.contains(needle),
        TextOperator::BeginsWith => text.starts_with(needle),
        TextOperator::EndsWith => text.ends_with(needle),
    }
}
