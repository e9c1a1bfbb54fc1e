//! In-memory tabular record sets
//!
//! A [`Table`] is an ordered list of column names plus rows of [`Value`]s.
//! Rows are positional; [`Record`] gives by-name access for transforms.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::value::Value;

static MISSING: Value = Value::Missing;

/// Structural errors when building tables
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A row does not have one cell per column
    #[error("Row has {actual} cells but table has {expected} columns")]
    WidthMismatch { expected: usize, actual: usize },

    /// The same column name was declared twice
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),
}

/// Ordered set of named columns and positional rows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from columns and rows, checking row widths
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::with_columns(columns);
        for (i, name) in table.columns.iter().enumerate() {
            if table.columns[..i].contains(name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build a table from column-major data of equal-length columns
    pub(crate) fn from_column_major(columns: Vec<String>, data: Vec<Vec<Value>>) -> Self {
        let len = data.first().map(Vec::len).unwrap_or(0);
        let mut cells: Vec<_> = data.into_iter().map(Vec::into_iter).collect();
        let rows = (0..len)
            .map(|_| cells.iter_mut().map(|c| c.next().unwrap_or_default()).collect())
            .collect();
        Self { columns, rows }
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::WidthMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Iterate rows with by-name access
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |row| Record { table: self, row })
    }

    /// Cells of one column, if present
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Set a column to the same value on every row, adding it if absent
    pub fn set_constant_column(&mut self, name: &str, value: Value) {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Keep the named columns that exist, in the given order
    pub fn project(&self, names: &[&str]) -> Table {
        let indices: Vec<(usize, &str)> = names
            .iter()
            .filter_map(|name| self.column_index(name).map(|idx| (idx, *name)))
            .collect();

        Table {
            columns: indices.iter().map(|(_, name)| name.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|(idx, _)| row[*idx].clone()).collect())
                .collect(),
        }
    }

    /// SHA-256 over column names and rendered cells.
    ///
    /// Two tables with the same fingerprint are byte-identical once stored.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for column in &self.columns {
            hasher.update(column.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        for row in &self.rows {
            for cell in row {
                match cell.render() {
                    Some(text) => {
                        hasher.update([0x01]);
                        hasher.update(text.as_bytes());
                    }
                    None => hasher.update([0x00]),
                }
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        hex::encode(hasher.finalize())
    }
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a Table,
    row: &'a [Value],
}

impl<'a> Record<'a> {
    /// Cell by column name; absent columns read as missing
    pub fn get(&self, name: &str) -> &'a Value {
        match self.table.column_index(name) {
            Some(idx) => &self.row[idx],
            None => &MISSING,
        }
    }

    /// Cell by position
    pub fn at(&self, idx: usize) -> &'a Value {
        self.row.get(idx).unwrap_or(&MISSING)
    }

    /// All cells
    pub fn values(&self) -> &'a [Value] {
        self.row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            ["id", "name"],
            vec![
                vec![Value::text("1"), Value::text("ana")],
                vec![Value::text("2"), Value::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut table = Table::with_columns(["a", "b"]);
        let err = table.push_row(vec![Value::Missing]).unwrap_err();
        assert_eq!(err, TableError::WidthMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = Table::from_rows(["a", "a"], vec![]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_record_access() {
        let table = sample();
        let names: Vec<_> = table.records().map(|r| r.get("name").clone()).collect();
        assert_eq!(names, vec![Value::text("ana"), Value::Missing]);
        assert!(table.records().all(|r| r.get("absent").is_missing()));
    }

    #[test]
    fn test_project_skips_absent_columns() {
        let projected = sample().project(&["name", "nope", "id"]);
        assert_eq!(projected.columns(), &["name".to_string(), "id".to_string()]);
        assert_eq!(projected.rows()[0], vec![Value::text("ana"), Value::text("1")]);
    }

    #[test]
    fn test_set_constant_column() {
        let mut table = sample();
        table.set_constant_column("stamp", Value::Integer(1));
        assert_eq!(table.columns().len(), 3);
        assert!(table.rows().iter().all(|r| r[2] == Value::Integer(1)));

        table.set_constant_column("stamp", Value::Integer(2));
        assert_eq!(table.columns().len(), 3);
        assert!(table.rows().iter().all(|r| r[2] == Value::Integer(2)));
    }

    #[test]
    fn test_fingerprint_distinguishes_null_and_empty() {
        let a = Table::from_rows(["x"], vec![vec![Value::Missing]]).unwrap();
        let b = Table::from_rows(["x"], vec![vec![Value::text("")]]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }
}
