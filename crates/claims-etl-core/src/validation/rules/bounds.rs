//! Value bounds validation
//!
//! Numeric fields may declare inclusive bounds. Values are compared as
//! decimals so money and counts share one check.

use rust_decimal::Decimal;

use crate::contract::{Constraint, FieldSpec};
use crate::validation::{Violation, ViolationKind};

use super::{ColumnContext, ColumnRule};

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericBounds {
    /// Minimum value (inclusive)
    pub min: Option<Decimal>,
    /// Maximum value (inclusive)
    pub max: Option<Decimal>,
}

/// Result of a bounds check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundsCheckResult {
    WithinBounds,
    BelowMinimum { value: Decimal, min: Decimal },
    AboveMaximum { value: Decimal, max: Decimal },
}

impl NumericBounds {
    /// Bounds declared by a range constraint
    pub fn from_constraint(constraint: &Constraint) -> Option<Self> {
        match constraint {
            Constraint::Range { min, max } => Some(Self {
                min: min.map(Decimal::from),
                max: max.map(Decimal::from),
            }),
            _ => None,
        }
    }

    /// Check if a value is within bounds
    pub fn check(&self, value: Decimal) -> BoundsCheckResult {
        if let Some(min) = self.min {
            if value < min {
                return BoundsCheckResult::BelowMinimum { value, min };
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return BoundsCheckResult::AboveMaximum { value, max };
            }
        }
        BoundsCheckResult::WithinBounds
    }
}

/// Reports values outside a field's range constraint
pub struct BoundsRule;

impl ColumnRule for BoundsRule {
    fn id(&self) -> &'static str {
        "range"
    }

    fn is_applicable(&self, field: &FieldSpec) -> bool {
        matches!(field.constraint, Some(Constraint::Range { .. }))
    }

    fn evaluate(&self, column: &ColumnContext<'_>) -> Vec<Violation> {
        let Some(constraint) = column.field.constraint else {
            return Vec::new();
        };
        let Some(bounds) = NumericBounds::from_constraint(&constraint) else {
            return Vec::new();
        };

        column
            .present()
            .filter(|(_, value)| match value.to_decimal() {
                Some(number) => bounds.check(number) != BoundsCheckResult::WithinBounds,
                None => false,
            })
            .map(|(row, value)| {
                Violation::cell(
                    column.field.name,
                    row,
                    ViolationKind::OutOfRange {
                        bounds: constraint.describe(),
                    },
                    value,
                )
            })
            .collect()
    }
}
