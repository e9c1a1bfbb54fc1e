//! In-memory table store
//!
//! Keeps tables in ordered maps. Used by tests and dry runs; failures can be
//! injected per table or for the whole connection.

use std::collections::{BTreeMap, BTreeSet};

use crate::table::Table;
use crate::validation::ValidatedTable;

use super::{StoreError, StoreResult, TableStore};

type TableKey = (String, String);

fn table_key(schema: &str, table: &str) -> TableKey {
    (schema.to_string(), table.to_string())
}

/// Store backed by process memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    schemas: BTreeSet<String>,
    tables: BTreeMap<TableKey, Table>,
    statements: Vec<String>,
    connection_failure: Option<String>,
    read_failures: BTreeSet<TableKey>,
    write_failures: BTreeSet<TableKey>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, creating its schema
    pub fn with_table(mut self, schema: &str, table: &str, data: Table) -> Self {
        self.insert_table(schema, table, data);
        self
    }

    /// Add or replace a table, creating its schema
    pub fn insert_table(&mut self, schema: &str, table: &str, data: Table) {
        self.schemas.insert(schema.to_string());
        self.tables.insert(table_key(schema, table), data);
    }

    /// Look up a stored table
    pub fn table(&self, schema: &str, table: &str) -> Option<&Table> {
        self.tables.get(&table_key(schema, table))
    }

    /// Names of the tables in a schema
    pub fn table_names(&self, schema: &str) -> Vec<&str> {
        self.tables
            .keys()
            .filter(|(s, _)| s == schema)
            .map(|(_, t)| t.as_str())
            .collect()
    }

    /// Whether a schema exists
    pub fn has_schema(&self, schema: &str) -> bool {
        self.schemas.contains(schema)
    }

    /// Statements passed to [`TableStore::execute`], in order
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Make every operation fail as if the server were down
    pub fn fail_connection(&mut self, message: impl Into<String>) {
        self.connection_failure = Some(message.into());
    }

    /// Make reads of one table fail
    pub fn fail_reads_of(&mut self, schema: &str, table: &str) {
        self.read_failures.insert(table_key(schema, table));
    }

    /// Make replacing one table fail
    pub fn fail_writes_to(&mut self, schema: &str, table: &str) {
        self.write_failures.insert(table_key(schema, table));
    }

    fn check_connection(&self) -> StoreResult<()> {
        match &self.connection_failure {
            Some(message) => Err(StoreError::Connection(message.clone())),
            None => Ok(()),
        }
    }
}

impl TableStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn ping(&mut self) -> StoreResult<()> {
        self.check_connection()
    }

    fn execute(&mut self, statement: &str) -> StoreResult<u64> {
        self.check_connection()?;
        self.statements.push(statement.to_string());
        Ok(0)
    }

    fn create_schema(&mut self, schema: &str) -> StoreResult<()> {
        self.check_connection()?;
        self.statements
            .push(format!("CREATE SCHEMA IF NOT EXISTS {}", super::quote_ident(schema)));
        self.schemas.insert(schema.to_string());
        Ok(())
    }

    fn read_table(&mut self, schema: &str, table: &str) -> StoreResult<Table> {
        self.check_connection()?;
        let key = table_key(schema, table);
        if self.read_failures.contains(&key) {
            return Err(StoreError::Query(format!("read of {}.{} refused", schema, table)));
        }
        self.tables
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::table_not_found(schema, table))
    }

    fn replace_table(&mut self, schema: &str, data: &ValidatedTable) -> StoreResult<u64> {
        self.check_connection()?;
        let table = data.contract().name;
        let key = table_key(schema, table);
        if self.write_failures.contains(&key) {
            return Err(StoreError::Query(format!("write to {}.{} refused", schema, table)));
        }
        if !self.schemas.contains(schema) {
            return Err(StoreError::Query(format!("schema \"{}\" does not exist", schema)));
        }
        self.tables.insert(key, data.table().clone());
        Ok(data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::silver;
    use crate::validation::Validator;
    use crate::value::Value;

    fn sample() -> Table {
        Table::from_rows(["id"], vec![vec![Value::text("1")], vec![Value::text("2")]]).unwrap()
    }

    fn validated_payers() -> ValidatedTable {
        let stamp = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let table = Table::from_rows(
            ["payer_id", "payer_name", silver::PROCESSING_TIMESTAMP_COLUMN],
            vec![
                vec![Value::text("A"), Value::text("Plan A"), Value::Timestamp(stamp)],
                vec![Value::text("B"), Value::text("Plan B"), Value::Timestamp(stamp)],
            ],
        )
        .unwrap();
        Validator::new().validate(&table, &silver::PAYERS).unwrap()
    }

    #[test]
    fn test_replace_requires_schema() {
        let mut store = InMemoryStore::new();
        let payers = validated_payers();
        assert!(store.replace_table("silver", &payers).is_err());

        store.create_schema("silver").unwrap();
        assert_eq!(store.replace_table("silver", &payers).unwrap(), 2);
        assert_eq!(
            &store.read_table("silver", "silver_payers_dim").unwrap(),
            payers.table()
        );
        assert_eq!(store.statements(), &["CREATE SCHEMA IF NOT EXISTS \"silver\""]);
    }

    #[test]
    fn test_missing_table() {
        let mut store = InMemoryStore::new();
        assert!(matches!(
            store.read_table("bronze", "nope"),
            Err(StoreError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_injected_failures() {
        let mut store = InMemoryStore::new().with_table("bronze", "a", sample());
        store.fail_reads_of("bronze", "a");
        assert!(matches!(store.read_table("bronze", "a"), Err(StoreError::Query(_))));

        store.fail_connection("down");
        assert!(matches!(store.ping(), Err(StoreError::Connection(_))));
        assert!(store.create_schema("x").is_err());
    }

    #[test]
    fn test_table_names() {
        let store = InMemoryStore::new()
            .with_table("silver", "b", sample())
            .with_table("silver", "a", sample())
            .with_table("gold", "c", sample());
        assert_eq!(store.table_names("silver"), vec!["a", "b"]);
    }
}
