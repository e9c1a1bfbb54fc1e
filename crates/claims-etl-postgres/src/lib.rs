//! PostgreSQL implementation of [`TableStore`]
//!
//! Reads cast every column to text so Bronze tables come back as raw strings.
//! Writes replace the whole table inside one transaction: drop, create with
//! the contract's column types, then multi-row inserts in chunks. Cells travel as text
//! parameters and are cast server-side to the column type.

use std::fmt;
use std::time::Duration;

use claims_etl_core::config::DatabaseConfig;
use claims_etl_core::store::{quote_ident, StoreError, StoreResult, TableStore};
use claims_etl_core::{FieldType, Table, ValidatedTable, Value};
use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::{Client, NoTls};

/// Rows per INSERT statement, before the parameter limit is applied
pub const DEFAULT_BATCH_ROWS: usize = 1_000;

/// Maximum bind parameters in one statement
const MAX_PARAMETERS: usize = 65_535;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Column types used when creating tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    BigInt,
    Numeric,
    Timestamp,
}

impl From<FieldType> for SqlType {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => SqlType::Text,
            FieldType::Integer => SqlType::BigInt,
            FieldType::Number => SqlType::Numeric,
            FieldType::Timestamp => SqlType::Timestamp,
        }
    }
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::BigInt => "BIGINT",
            SqlType::Numeric => "NUMERIC",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Column definitions of a validated table, typed by its contract
pub fn column_types(data: &ValidatedTable) -> Vec<(String, SqlType)> {
    let contract = data.contract();
    data.table()
        .columns()
        .iter()
        .map(|name| {
            let ty = contract
                .field(name)
                .map(|field| SqlType::from(field.field_type))
                .unwrap_or(SqlType::Text);
            (name.clone(), ty)
        })
        .collect()
}

/// `SELECT` reading every column as text
pub fn select_sql(schema: &str, table: &str, columns: &[String]) -> String {
    let projection = columns
        .iter()
        .map(|c| format!("{}::TEXT", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {} FROM {}", projection, qualified(schema, table))
}

/// `CREATE TABLE` for the given column names and types
pub fn create_table_sql(schema: &str, table: &str, columns: &[(String, SqlType)]) -> String {
    let definitions = columns
        .iter()
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", qualified(schema, table), definitions)
}

/// Multi-row `INSERT` with one text parameter per cell
pub fn insert_sql(schema: &str, table: &str, columns: &[(String, SqlType)], rows: usize) -> String {
    let names = columns
        .iter()
        .map(|(name, _)| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut param = 0;
    let tuples = (0..rows)
        .map(|_| {
            let cells = columns
                .iter()
                .map(|(_, ty)| {
                    param += 1;
                    match ty {
                        SqlType::Text => format!("${}::TEXT", param),
                        other => format!("CAST(${}::TEXT AS {})", param, other),
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", cells)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified(schema, table),
        names,
        tuples
    )
}

/// Rows per INSERT so that no statement exceeds the parameter limit
pub fn rows_per_statement(batch_rows: usize, column_count: usize) -> usize {
    let limit = MAX_PARAMETERS / column_count.max(1);
    batch_rows.clamp(1, limit.max(1))
}

fn map_error(err: postgres::Error) -> StoreError {
    if err.is_closed() {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::Query(err.to_string())
    }
}

/// Store backed by a PostgreSQL database
pub struct PostgresStore {
    client: Client,
    batch_rows: usize,
}

impl fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStore")
            .field("batch_rows", &self.batch_rows)
            .finish_non_exhaustive()
    }
}

impl PostgresStore {
    /// Open a connection
    pub fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connecting to PostgreSQL"
        );
        let client = Client::connect(&config.connection_string(), NoTls)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            batch_rows: DEFAULT_BATCH_ROWS,
        })
    }

    /// Set the number of rows per INSERT statement
    pub fn with_batch_rows(mut self, batch_rows: usize) -> Self {
        self.batch_rows = batch_rows.max(1);
        self
    }

    fn column_names(&mut self, schema: &str, table: &str) -> StoreResult<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT column_name::TEXT FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 \
                 ORDER BY ordinal_position",
                &[&schema, &table],
            )
            .map_err(map_error)?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}

impl TableStore for PostgresStore {
    fn name(&self) -> &str {
        "postgres"
    }

    fn ping(&mut self) -> StoreResult<()> {
        self.client
            .is_valid(PING_TIMEOUT)
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    fn execute(&mut self, statement: &str) -> StoreResult<u64> {
        tracing::debug!(statement, "Executing statement");
        self.client.execute(statement, &[]).map_err(map_error)
    }

    fn read_table(&mut self, schema: &str, table: &str) -> StoreResult<Table> {
        let columns = self.column_names(schema, table)?;
        if columns.is_empty() {
            return Err(StoreError::table_not_found(schema, table));
        }

        let rows = self
            .client
            .query(select_sql(schema, table, &columns).as_str(), &[])
            .map_err(|e| match e.code() {
                Some(code) if *code == SqlState::UNDEFINED_TABLE => {
                    StoreError::table_not_found(schema, table)
                }
                _ => map_error(e),
            })?;

        let data = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| Value::from_raw(row.get::<_, Option<String>>(i)))
                    .collect()
            })
            .collect();

        Table::from_rows(columns, data).map_err(|e| StoreError::Query(e.to_string()))
    }

    fn replace_table(&mut self, schema: &str, data: &ValidatedTable) -> StoreResult<u64> {
        let table = data.contract().name;
        let columns = column_types(data);
        let chunk_rows = rows_per_statement(self.batch_rows, columns.len());

        let mut tx = self.client.transaction().map_err(map_error)?;
        tx.batch_execute(&format!(
            "DROP TABLE IF EXISTS {}",
            qualified(schema, table)
        ))
        .map_err(map_error)?;
        tx.batch_execute(&create_table_sql(schema, table, &columns))
            .map_err(map_error)?;

        let mut written = 0;
        for chunk in data.table().rows().chunks(chunk_rows) {
            let params: Vec<Option<String>> =
                chunk.iter().flatten().map(Value::render).collect();
            let refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p as &(dyn ToSql + Sync))
                .collect();
            written += tx
                .execute(insert_sql(schema, table, &columns, chunk.len()).as_str(), &refs)
                .map_err(map_error)?;
        }

        tx.commit().map_err(map_error)?;
        tracing::debug!(schema, table, rows = written, "Replaced table");
        Ok(written)
    }
}
