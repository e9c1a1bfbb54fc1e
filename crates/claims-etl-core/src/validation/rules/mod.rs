//! Column rules applied after type coercion
//!
//! Each rule looks at one coerced column and reports every offending row.
//! Rules are pure: they never modify the column and the same input always
//! yields the same violations in the same order.

pub mod bounds;
pub mod enum_check;
pub mod pattern;
pub mod required;
pub mod unique;

use crate::contract::FieldSpec;
use crate::value::Value;

use super::Violation;

/// A coerced column handed to rules
#[derive(Debug, Clone, Copy)]
pub struct ColumnContext<'a> {
    /// Field being checked
    pub field: &'a FieldSpec,
    /// Typed cells, one per row
    pub values: &'a [Value],
    /// Rows whose raw value failed coercion (already reported)
    pub rejected: &'a [bool],
}

impl<'a> ColumnContext<'a> {
    /// Present, successfully coerced cells with their row index
    pub fn present(&self) -> impl Iterator<Item = (usize, &'a Value)> + 'a {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_missing())
    }

    /// Whether a row failed coercion
    pub fn is_rejected(&self, row: usize) -> bool {
        self.rejected.get(row).copied().unwrap_or(false)
    }
}

/// Trait for column validation rules
pub trait ColumnRule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Whether the rule has anything to check on this field
    fn is_applicable(&self, field: &FieldSpec) -> bool;

    /// Check the column, returning every violation found
    fn evaluate(&self, column: &ColumnContext<'_>) -> Vec<Violation>;
}
