use crate::model::{ColumnMismatch, Row};
use crate::value::Value;

/// Compare two rows that share a key, column by column.
///
/// Only the source row's columns are inspected, in source order. A column
/// the target lacks counts as a `Null` target value; a column only the target
/// has is never reported.
pub fn find_mismatches(source: &Row, target: &Row) -> Vec<ColumnMismatch> {
    source
        .iter()
        .filter_map(|(column, source_value)| {
            let target_value = target.get(column).cloned().unwrap_or(Value::Null);
            if source_value.loosely_eq(&target_value) {
                None
            } else {
                Some(ColumnMismatch {
                    column: column.to_string(),
                    source_value: source_value.clone(),
                    target_value,
                })
            }
        })
        .collect()
}
