//! Relational store seam
//!
//! The pipeline reads sources and publishes results through the
//! [`TableStore`] trait. Extraction is a full read, loading is a full
//! replace; there is no partial upsert.

pub mod memory;

pub use memory::InMemoryStore;

use thiserror::Error;

use crate::table::Table;
use crate::validation::ValidatedTable;

/// Errors that can occur when talking to a store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The requested table does not exist
    #[error("Table not found: {schema}.{table}")]
    TableNotFound { schema: String, table: String },

    /// A statement was rejected
    #[error("Query error: {0}")]
    Query(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create a table-not-found error
    pub fn table_not_found(schema: impl Into<String>, table: impl Into<String>) -> Self {
        StoreError::TableNotFound {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Read and replace whole tables in a relational store
///
/// One handle is used for the whole run, sequentially. Each
/// [`replace_table`](TableStore::replace_table) call is atomic on its own;
/// nothing spans tables.
#[cfg_attr(test, mockall::automock)]
pub trait TableStore {
    /// Returns the name of this store, for logs
    fn name(&self) -> &str;

    /// Check that the store is reachable
    fn ping(&mut self) -> StoreResult<()>;

    /// Run one statement, returning the number of affected rows
    fn execute(&mut self, statement: &str) -> StoreResult<u64>;

    /// Create a schema if it does not exist
    fn create_schema(&mut self, schema: &str) -> StoreResult<()> {
        self.execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
            .map(|_| ())
    }

    /// Read every row of a table
    fn read_table(&mut self, schema: &str, table: &str) -> StoreResult<Table>;

    /// Replace the table named by `data`'s contract, returning the rows
    /// written. Column definitions come from the contract, not the cells.
    fn replace_table(&mut self, schema: &str, data: &ValidatedTable) -> StoreResult<u64>;
}

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
