//! Enum value validation

use crate::contract::{Constraint, FieldSpec};
use crate::validation::{Violation, ViolationKind};

use super::{ColumnContext, ColumnRule};

/// Reports values outside a field's allowed set. Comparison is exact.
pub struct EnumRule;

impl ColumnRule for EnumRule {
    fn id(&self) -> &'static str {
        "one-of"
    }

    fn is_applicable(&self, field: &FieldSpec) -> bool {
        matches!(field.constraint, Some(Constraint::OneOf(_)))
    }

    fn evaluate(&self, column: &ColumnContext<'_>) -> Vec<Violation> {
        let Some(constraint @ Constraint::OneOf(allowed)) = column.field.constraint else {
            return Vec::new();
        };

        column
            .present()
            .filter(|(_, value)| match value.as_str() {
                Some(text) => !allowed.contains(&text),
                None => true,
            })
            .map(|(row, value)| {
                Violation::cell(
                    column.field.name,
                    row,
                    ViolationKind::NotAllowed {
                        allowed: constraint.describe(),
                    },
                    value,
                )
            })
            .collect()
    }
}
