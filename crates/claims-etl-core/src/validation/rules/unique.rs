//! Uniqueness: key fields must not repeat a value

use std::collections::HashMap;

use crate::contract::FieldSpec;
use crate::validation::{Violation, ViolationKind};
use crate::value::Value;

use super::{ColumnContext, ColumnRule};

/// Reports every row holding a value that appears more than once.
///
/// All occurrences are reported, including the first, so the caller can see
/// each duplicated key and where it sits. Missing values never collide.
pub struct UniqueRule;

impl ColumnRule for UniqueRule {
    fn id(&self) -> &'static str {
        "unique"
    }

    fn is_applicable(&self, field: &FieldSpec) -> bool {
        field.unique
    }

    fn evaluate(&self, column: &ColumnContext<'_>) -> Vec<Violation> {
        let mut counts: HashMap<&Value, usize> = HashMap::new();
        for (_, value) in column.present() {
            *counts.entry(value).or_insert(0) += 1;
        }

        column
            .present()
            .filter(|(_, value)| counts.get(value).copied().unwrap_or(0) > 1)
            .map(|(row, value)| {
                Violation::cell(column.field.name, row, ViolationKind::Duplicate, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::rules::test_support::run;

    #[test]
    fn test_all_duplicate_rows_reported() {
        let field = FieldSpec::text("transaction_id").unique();
        let found = run(
            &UniqueRule,
            &field,
            vec![
                Value::text("t1"),
                Value::text("t2"),
                Value::text("t1"),
                Value::Missing,
                Value::Missing,
            ],
        );

        let rows: Vec<_> = found.iter().map(|v| v.row).collect();
        assert_eq!(rows, vec![Some(0), Some(2)]);
        assert!(found.iter().all(|v| v.value.as_deref() == Some("t1")));
    }

    #[test]
    fn test_distinct_values_pass() {
        let field = FieldSpec::text("claim_id").unique();
        let found = run(&UniqueRule, &field, vec![Value::text("a"), Value::text("b")]);
        assert!(found.is_empty());
    }
}
