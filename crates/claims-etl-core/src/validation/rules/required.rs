//! Nullability: non-nullable fields must have a value on every row

use crate::contract::FieldSpec;
use crate::validation::{Violation, ViolationKind};

use super::{ColumnContext, ColumnRule};

/// Rejects missing values in fields not declared nullable.
///
/// Rows that already failed coercion are skipped; they were reported as a
/// coercion problem and a second "null" finding would only repeat it.
pub struct NullabilityRule;

impl ColumnRule for NullabilityRule {
    fn id(&self) -> &'static str {
        "not-null"
    }

    fn is_applicable(&self, field: &FieldSpec) -> bool {
        !field.nullable
    }

    fn evaluate(&self, column: &ColumnContext<'_>) -> Vec<Violation> {
        column
            .values
            .iter()
            .enumerate()
            .filter(|(row, value)| value.is_missing() && !column.is_rejected(*row))
            .map(|(row, value)| Violation::cell(column.field.name, row, ViolationKind::Null, value))
            .collect()
    }
}
