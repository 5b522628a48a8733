//! Assertion helpers for result rows.

use common::{PropertyBag, ResultRow, RowValue};
use types::Value;

/// Unwrap a node row into `(id, labels, properties)`, panicking with a
/// useful message on an edge row.
pub fn expect_node(row: &ResultRow) -> (i64, &[String], &PropertyBag) {
    match &row.value {
        RowValue::Node {
            id,
            labels,
            properties,
        } => (*id, labels.as_slice(), properties),
        other => panic!("expected {} to be a node row, got {other:?}", row.variable),
    }
}

/// Unwrap an edge row into `(id, type, source, target, properties)`.
pub fn expect_edge(row: &ResultRow) -> (i64, &str, i64, i64, &PropertyBag) {
    match &row.value {
        RowValue::Edge {
            id,
            ty,
            source,
            target,
            properties,
        } => (*id, ty.as_str(), *source, *target, properties),
        other => panic!("expected {} to be an edge row, got {other:?}", row.variable),
    }
}

/// Fetch a node row's property, panicking if the row is not a node or the
/// key is missing.
pub fn node_property<'a>(row: &'a ResultRow, key: &str) -> &'a Value {
    let (_, _, properties) = expect_node(row);
    properties
        .get(key)
        .unwrap_or_else(|| panic!("node row {} has no property {key}", row.variable))
}

/// Ids of all node rows, in row order.
pub fn row_node_ids(rows: &[ResultRow]) -> Vec<i64> {
    rows.iter().map(|row| expect_node(row).0).collect()
}
