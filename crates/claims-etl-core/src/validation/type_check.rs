//! Coercion of raw cells to declared field types

use crate::contract::{FieldSpec, FieldType};
use crate::value::Value;

use super::{Violation, ViolationKind};

/// A column after coercion
#[derive(Debug, Clone, Default)]
pub struct CoercedColumn {
    /// Typed cells; cells that failed coercion are `Missing`
    pub values: Vec<Value>,
    /// `true` where coercion failed
    pub rejected: Vec<bool>,
    /// One violation per rejected cell
    pub violations: Vec<Violation>,
}

/// Coerce one cell.
///
/// Returns `Some(Value::Missing)` for null input and `None` when a present
/// value cannot be represented as `field_type`.
pub fn coerce(value: &Value, field_type: FieldType) -> Option<Value> {
    if value.is_missing() {
        return Some(Value::Missing);
    }
    match field_type {
        FieldType::Text => value.to_text().map(Value::Text),
        FieldType::Integer => value.to_integer().map(Value::Integer),
        FieldType::Number => value.to_decimal().map(Value::Number),
        FieldType::Timestamp => value.to_timestamp().map(Value::Timestamp),
    }
}

/// Coerce every cell of a column to the field's declared type
pub fn coerce_column<'a, I>(field: &FieldSpec, cells: I) -> CoercedColumn
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut column = CoercedColumn::default();

    for (row, cell) in cells.into_iter().enumerate() {
        match coerce(cell, field.field_type) {
            Some(value) => {
                column.values.push(value);
                column.rejected.push(false);
            }
            None => {
                column.violations.push(Violation::cell(
                    field.name,
                    row,
                    ViolationKind::Coercion {
                        expected: field.field_type,
                    },
                    cell,
                ));
                column.values.push(Value::Missing);
                column.rejected.push(true);
            }
        }
    }

    column
}
