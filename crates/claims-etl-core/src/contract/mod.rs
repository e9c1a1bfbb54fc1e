//! Declarative table contracts
//!
//! A [`TableContract`] is static data: an ordered list of [`FieldSpec`]s, each
//! naming a semantic type, nullability, uniqueness and an optional value
//! constraint. Contracts carry no behaviour; the
//! [`Validator`](crate::validation::Validator) interprets them.
//!
//! Fields are non-nullable unless marked with [`FieldSpec::nullable`].

pub mod gold;
pub mod silver;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type a column is coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Number,
    Timestamp,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
            FieldType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Value-level constraint on a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric bounds
    Range { min: Option<i64>, max: Option<i64> },
    /// Value must be one of the listed strings
    OneOf(&'static [&'static str]),
    /// Value must match the regular expression
    Pattern(&'static str),
}

impl Constraint {
    /// Human-readable form, e.g. `[0, 120]` or `in {Male, Female}`
    pub fn describe(&self) -> String {
        match self {
            Constraint::Range { min: Some(min), max: Some(max) } => format!("[{}, {}]", min, max),
            Constraint::Range { min: Some(min), max: None } => format!(">= {}", min),
            Constraint::Range { min: None, max: Some(max) } => format!("<= {}", max),
            Constraint::Range { min: None, max: None } => "unbounded".to_string(),
            Constraint::OneOf(values) => format!("in {{{}}}", values.join(", ")),
            Constraint::Pattern(pattern) => format!("matches /{}/", pattern),
        }
    }
}

/// Specification of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub nullable: bool,
    pub unique: bool,
    pub constraint: Option<Constraint>,
}

impl FieldSpec {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: false,
            unique: false,
            constraint: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    /// Allow missing values
    pub const fn nullable(self) -> Self {
        Self { nullable: true, ..self }
    }

    /// Require distinct non-missing values
    pub const fn unique(self) -> Self {
        Self { unique: true, ..self }
    }

    /// Require `value >= min`
    pub const fn at_least(self, min: i64) -> Self {
        Self {
            constraint: Some(Constraint::Range { min: Some(min), max: None }),
            ..self
        }
    }

    /// Require `min <= value <= max`
    pub const fn between(self, min: i64, max: i64) -> Self {
        Self {
            constraint: Some(Constraint::Range { min: Some(min), max: Some(max) }),
            ..self
        }
    }

    /// Require membership in a fixed set
    pub const fn one_of(self, values: &'static [&'static str]) -> Self {
        Self {
            constraint: Some(Constraint::OneOf(values)),
            ..self
        }
    }

    /// Require a regular-expression match
    pub const fn matching(self, pattern: &'static str) -> Self {
        Self {
            constraint: Some(Constraint::Pattern(pattern)),
            ..self
        }
    }
}

/// Named, ordered set of field specifications for one published table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableContract {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl TableContract {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column names in contract order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Column names in contract order, excluding the named column
    pub fn column_names_without(&self, excluded: &str) -> Vec<&'static str> {
        self.fields
            .iter()
            .map(|f| f.name)
            .filter(|name| *name != excluded)
            .collect()
    }
}
