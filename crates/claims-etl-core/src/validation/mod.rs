//! Batch validation of candidate tables against [`TableContract`]s
//!
//! Validation is exhaustive: every field of every row is checked and all
//! violations are gathered into one [`SchemaViolationError`] before the table
//! is rejected, so a single run shows every problem.
//!
//! The sequence per field is:
//!
//! 1. the column must exist in the candidate table;
//! 2. each cell is coerced to the declared [`FieldType`](crate::contract::FieldType);
//! 3. every applicable [`ColumnRule`] runs over the coerced column.
//!
//! A passing table comes back as a [`ValidatedTable`] holding exactly the
//! contract's columns, in contract order, with typed cells.

pub mod rules;
pub mod type_check;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::contract::{FieldType, TableContract};
use crate::table::Table;
use crate::value::Value;
use rules::{ColumnContext, ColumnRule};

/// What went wrong with a field or a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// The column is declared but absent from the table
    MissingColumn,
    /// The cell could not be converted to the declared type
    Coercion { expected: FieldType },
    /// A non-nullable field holds a missing value
    Null,
    /// A unique field holds a value seen on another row
    Duplicate,
    /// The value is outside the declared range
    OutOfRange { bounds: String },
    /// The value is not in the declared set
    NotAllowed { allowed: String },
    /// The value does not match the declared pattern
    PatternMismatch { pattern: String },
    /// The declared pattern itself does not compile
    InvalidPattern { pattern: String, message: String },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MissingColumn => write!(f, "column not present in table"),
            ViolationKind::Coercion { expected } => write!(f, "cannot coerce to {}", expected),
            ViolationKind::Null => write!(f, "null value in non-nullable field"),
            ViolationKind::Duplicate => write!(f, "duplicate value in unique field"),
            ViolationKind::OutOfRange { bounds } => write!(f, "value outside {}", bounds),
            ViolationKind::NotAllowed { allowed } => write!(f, "value not {}", allowed),
            ViolationKind::PatternMismatch { pattern } => {
                write!(f, "value does not match /{}/", pattern)
            }
            ViolationKind::InvalidPattern { pattern, message } => {
                write!(f, "invalid pattern /{}/: {}", pattern, message)
            }
        }
    }
}

/// One offending (field, row, reason) triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Field name from the contract
    pub field: String,
    /// Zero-based row index; `None` for column-level problems
    pub row: Option<usize>,
    /// Reason
    pub kind: ViolationKind,
    /// Offending value as rendered text, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Violation {
    /// Column-level violation
    pub fn column(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            row: None,
            kind,
            value: None,
        }
    }

    /// Cell-level violation
    pub fn cell(field: impl Into<String>, row: usize, kind: ViolationKind, value: &Value) -> Self {
        Self {
            field: field.into(),
            row: Some(row),
            kind,
            value: value.render(),
        }
    }

    /// Reason as text
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, &self.value) {
            (Some(row), Some(value)) => {
                write!(f, "{}[row {}] = '{}': {}", self.field, row, value, self.kind)
            }
            (Some(row), None) => write!(f, "{}[row {}]: {}", self.field, row, self.kind),
            (None, _) => write!(f, "{}: {}", self.field, self.kind),
        }
    }
}

/// A candidate table was rejected by its contract
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Schema validation failed for '{table}': {} violation(s)", .violations.len())]
pub struct SchemaViolationError {
    /// Contract name
    pub table: String,
    /// Every violation found, in contract field order
    pub violations: Vec<Violation>,
}

impl SchemaViolationError {
    /// Violations on one field
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.field == field)
    }

    /// Distinct duplicated values reported for a unique field, in first-seen order
    pub fn duplicate_values(&self, field: &str) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for violation in self.for_field(field) {
            if violation.kind != ViolationKind::Duplicate {
                continue;
            }
            if let Some(value) = &violation.value {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        values
    }

    /// Distinct field names with at least one violation
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for violation in &self.violations {
            if !fields.contains(&violation.field.as_str()) {
                fields.push(&violation.field);
            }
        }
        fields
    }
}

/// A table that satisfies every constraint of its contract
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    contract: &'static TableContract,
    table: Table,
}

impl ValidatedTable {
    /// The contract this table satisfies
    pub fn contract(&self) -> &'static TableContract {
        self.contract
    }

    /// The typed table
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Take the typed table
    pub fn into_table(self) -> Table {
        self.table
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Applies contracts to candidate tables
pub struct Validator {
    rules: Vec<Box<dyn ColumnRule>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a validator with the standard rule set
    pub fn new() -> Self {
        let mut validator = Self::empty();
        validator.register(Box::new(rules::required::NullabilityRule));
        validator.register(Box::new(rules::unique::UniqueRule));
        validator.register(Box::new(rules::bounds::BoundsRule));
        validator.register(Box::new(rules::enum_check::EnumRule));
        validator.register(Box::new(rules::pattern::PatternRule));
        validator
    }

    /// Create a validator that only checks presence and types
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule
    pub fn register(&mut self, rule: Box<dyn ColumnRule>) {
        self.rules.push(rule);
    }

    /// Identifiers of the registered rules
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Validate a candidate table against a contract.
    ///
    /// This method is deterministic and does not modify its input.
    pub fn validate(
        &self,
        table: &Table,
        contract: &'static TableContract,
    ) -> Result<ValidatedTable, SchemaViolationError> {
        let mut violations = Vec::new();
        let mut columns: Vec<Vec<Value>> = Vec::with_capacity(contract.fields.len());

        for field in contract.fields {
            let idx = match table.column_index(field.name) {
                Some(idx) => idx,
                None => {
                    violations.push(Violation::column(field.name, ViolationKind::MissingColumn));
                    columns.push(vec![Value::Missing; table.len()]);
                    continue;
                }
            };

            let coerced = type_check::coerce_column(field, table.rows().iter().map(|row| &row[idx]));
            violations.extend(coerced.violations);

            let context = ColumnContext {
                field,
                values: &coerced.values,
                rejected: &coerced.rejected,
            };
            for rule in self.rules.iter().filter(|r| r.is_applicable(field)) {
                let found = rule.evaluate(&context);
                if !found.is_empty() {
                    tracing::debug!(
                        table = contract.name,
                        field = field.name,
                        rule = rule.id(),
                        count = found.len(),
                        "Rule produced violations"
                    );
                }
                violations.extend(found);
            }

            columns.push(coerced.values);
        }

        if !violations.is_empty() {
            return Err(SchemaViolationError {
                table: contract.name.to_string(),
                violations,
            });
        }

        let validated = Table::from_column_major(
            contract.column_names().into_iter().map(String::from).collect(),
            columns,
        );

        Ok(ValidatedTable {
            contract,
            table: validated,
        })
    }
}
