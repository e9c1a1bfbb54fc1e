//! Regular-expression validation

use regex::Regex;

use crate::contract::{Constraint, FieldSpec};
use crate::validation::{Violation, ViolationKind};

use super::{ColumnContext, ColumnRule};

/// Reports text values that do not match a field's pattern
pub struct PatternRule;

impl ColumnRule for PatternRule {
    fn id(&self) -> &'static str {
        "pattern"
    }

    fn is_applicable(&self, field: &FieldSpec) -> bool {
        matches!(field.constraint, Some(Constraint::Pattern(_)))
    }

    fn evaluate(&self, column: &ColumnContext<'_>) -> Vec<Violation> {
        let Some(Constraint::Pattern(pattern)) = column.field.constraint else {
            return Vec::new();
        };

        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                return vec![Violation::column(
                    column.field.name,
                    ViolationKind::InvalidPattern {
                        pattern: pattern.to_string(),
                        message: e.to_string(),
                    },
                )]
            }
        };

        column
            .present()
            .filter(|(_, value)| match value.as_str() {
                Some(text) => !regex.is_match(text),
                None => true,
            })
            .map(|(row, value)| {
                Violation::cell(
                    column.field.name,
                    row,
                    ViolationKind::PatternMismatch {
                        pattern: pattern.to_string(),
                    },
                    value,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::rules::test_support::run;
    use crate::value::Value;

    #[test]
    fn test_year_month_pattern() {
        let field = FieldSpec::text("year_month").matching(r"^\d{4}-\d{2}$");
        let found = run(
            &PatternRule,
            &field,
            vec![Value::text("2024-01"), Value::text("2024-1"), Value::text("Jan 2024")],
        );
        let rows: Vec<_> = found.iter().map(|v| v.row).collect();
        assert_eq!(rows, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_invalid_pattern_is_reported_once() {
        let field = FieldSpec::text("code").matching("(unclosed");
        let found = run(&PatternRule, &field, vec![Value::text("a"), Value::text("b")]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].row, None);
        assert!(matches!(found[0].kind, ViolationKind::InvalidPattern { .. }));
    }
}
