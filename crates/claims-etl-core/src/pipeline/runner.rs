//! Per-table extract, stamp, validate and load sequence shared by the layers

use chrono::NaiveDateTime;

use crate::contract::TableContract;
use crate::store::TableStore;
use crate::table::Table;
use crate::transform::TransformResult;
use crate::validation::Validator;
use crate::value::Value;

use super::report::{log_violations, FailureKind, Layer, RunReport};

/// Drives one layer run against a store.
///
/// Every failure after extraction is contained to its table: it is logged,
/// recorded in the report and the next table proceeds.
pub struct LayerRunner<'a> {
    store: &'a mut dyn TableStore,
    validator: &'a Validator,
    source_schema: String,
    target_schema: String,
    processing_timestamp: NaiveDateTime,
    report: RunReport,
}

impl<'a> LayerRunner<'a> {
    pub fn new(
        store: &'a mut dyn TableStore,
        validator: &'a Validator,
        layer: Layer,
        source_schema: impl Into<String>,
        target_schema: impl Into<String>,
        processing_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            store,
            validator,
            source_schema: source_schema.into(),
            target_schema: target_schema.into(),
            processing_timestamp,
            report: RunReport::new(layer, processing_timestamp),
        }
    }

    /// Read a source table. A failed read is recorded and yields an empty table.
    pub fn extract(&mut self, table: &str) -> Table {
        match self.store.read_table(&self.source_schema, table) {
            Ok(data) => {
                tracing::info!(
                    schema = %self.source_schema,
                    table,
                    records = data.len(),
                    "Extracted source table"
                );
                data
            }
            Err(e) => {
                tracing::error!(schema = %self.source_schema, table, error = %e, "Extraction failed");
                self.report
                    .record_extraction_failure(&self.source_schema, table, e.to_string());
                Table::default()
            }
        }
    }

    /// Stamp, validate and load one candidate table. Returns whether it was loaded.
    pub fn publish(&mut self, contract: &'static TableContract, candidate: TransformResult) -> bool {
        let name = contract.name;

        let mut candidate = match candidate {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(table = name, error = %e, "Transform failed");
                self.report
                    .record_failed(name, FailureKind::Transform, e.to_string(), Vec::new());
                return false;
            }
        };

        if candidate.is_empty() {
            tracing::warn!(table = name, "Empty result for '{}', skipping load", name);
            self.report.record_failed(
                name,
                FailureKind::EmptyResult,
                "transform produced no rows",
                Vec::new(),
            );
            return false;
        }

        candidate.set_constant_column(
            self.report.layer.processing_timestamp_column(),
            Value::Timestamp(self.processing_timestamp),
        );

        let validated = match self.validator.validate(&candidate, contract) {
            Ok(validated) => validated,
            Err(err) => {
                log_violations(name, &err.violations);
                let message = err.to_string();
                self.report.record_failed(
                    name,
                    FailureKind::SchemaValidation,
                    message,
                    err.violations,
                );
                return false;
            }
        };

        let loaded = self
            .store
            .create_schema(&self.target_schema)
            .and_then(|_| {
                self.store.replace_table(&self.target_schema, &validated)
            });

        match loaded {
            Ok(_) => {
                tracing::info!(
                    "Loaded {}.{}. Records: {}",
                    self.target_schema,
                    name,
                    validated.len()
                );
                self.report.record_loaded(name, validated.len());
                true
            }
            Err(e) => {
                tracing::error!(table = name, error = %e, "Failed to load table");
                self.report
                    .record_failed(name, FailureKind::Io, e.to_string(), Vec::new());
                false
            }
        }
    }

    /// Close the run and hand back its report
    pub fn finish(mut self) -> RunReport {
        self.report.finish();
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::silver;
    use crate::error::TransformError;
    use crate::store::{InMemoryStore, MockTableStore, StoreError};
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn payers(rows: &[[&str; 2]]) -> Table {
        Table::from_rows(
            ["payer_id", "payer_name"],
            rows.iter()
                .map(|r| vec![Value::text(r[0]), Value::text(r[1])])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_publish_stamps_and_loads() {
        let mut store = InMemoryStore::new();
        let validator = Validator::new();
        let mut runner =
            LayerRunner::new(&mut store, &validator, Layer::Silver, "bronze", "silver", stamp());

        assert!(runner.publish(&silver::PAYERS, Ok(payers(&[["A", "Plan A"]]))));
        let report = runner.finish();
        assert_eq!(report.loaded_tables(), 1);

        let stored = store.table("silver", "silver_payers_dim").unwrap();
        assert_eq!(
            stored.rows()[0][2],
            Value::Timestamp(stamp())
        );
        assert_eq!(stored.columns()[2], silver::PROCESSING_TIMESTAMP_COLUMN);
    }

    #[test]
    fn test_failures_are_recorded_by_kind() {
        let mut store = InMemoryStore::new();
        let validator = Validator::new();
        let mut runner =
            LayerRunner::new(&mut store, &validator, Layer::Silver, "bronze", "silver", stamp());

        assert!(!runner.publish(&silver::PAYERS, Ok(payers(&[]))));
        assert!(!runner.publish(
            &silver::PAYERS,
            Err(TransformError::missing_column("payers", "payer_name"))
        ));
        assert!(!runner.publish(
            &silver::PAYERS,
            Ok(payers(&[["A", "x"], ["A", "y"]]))
        ));

        let report = runner.finish();
        assert_eq!(
            report.failed_tables(),
            vec![
                "silver_payers_dim".to_string(),
                "silver_payers_dim (Transform)".to_string(),
                "silver_payers_dim (Schema Validation)".to_string(),
            ]
        );
        assert!(store.table("silver", "silver_payers_dim").is_none());
        assert!(!store.has_schema("silver"));
    }

    #[test]
    fn test_extraction_failure_yields_empty_table() {
        let mut store = InMemoryStore::new();
        let validator = Validator::new();
        let mut runner =
            LayerRunner::new(&mut store, &validator, Layer::Silver, "bronze", "silver", stamp());

        assert!(runner.extract("bronze_payers").is_empty());
        let report = runner.finish();
        assert_eq!(report.extraction_failures.len(), 1);
        assert_eq!(report.extraction_failures[0].table, "bronze_payers");
    }

    #[test]
    fn test_replace_failure_is_io() {
        let mut store = MockTableStore::new();
        store.expect_create_schema().returning(|_| Ok(()));
        store
            .expect_replace_table()
            .times(1)
            .returning(|_, _| Err(StoreError::Query("disk full".into())));
        let validator = Validator::new();
        let mut runner =
            LayerRunner::new(&mut store, &validator, Layer::Silver, "bronze", "silver", stamp());

        assert!(!runner.publish(&silver::PAYERS, Ok(payers(&[["A", "Plan A"]]))));
        let report = runner.finish();
        assert_eq!(report.failed_tables(), vec!["silver_payers_dim (I/O)".to_string()]);
    }
}
