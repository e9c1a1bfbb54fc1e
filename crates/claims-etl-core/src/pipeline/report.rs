//! Run statistics
//!
//! A [`RunReport`] is built up by the [`LayerRunner`](super::LayerRunner) as
//! each table is processed and handed back to the caller when the run ends.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::contract;
use crate::validation::Violation;

/// Number of violations shown when a table is rejected
const VIOLATION_SAMPLE: usize = 5;

/// Pipeline layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Silver,
    Gold,
}

impl Layer {
    /// Column stamped with the run's processing timestamp in this layer
    pub fn processing_timestamp_column(&self) -> &'static str {
        match self {
            Layer::Silver => contract::silver::PROCESSING_TIMESTAMP_COLUMN,
            Layer::Gold => contract::gold::PROCESSING_TIMESTAMP_COLUMN,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Silver => write!(f, "silver"),
            Layer::Gold => write!(f, "gold"),
        }
    }
}

/// Why a table was not loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The transform produced no rows
    EmptyResult,
    /// The transform raised an error
    Transform,
    /// The candidate was rejected by its contract
    SchemaValidation,
    /// Schema creation or the table replace failed
    Io,
}

impl FailureKind {
    /// Suffix used in failed-table labels
    fn label(&self) -> Option<&'static str> {
        match self {
            FailureKind::EmptyResult => None,
            FailureKind::Transform => Some("Transform"),
            FailureKind::SchemaValidation => Some("Schema Validation"),
            FailureKind::Io => Some("I/O"),
        }
    }
}

/// Outcome of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    Loaded {
        records: usize,
    },
    Failed {
        kind: FailureKind,
        message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        violations: Vec<Violation>,
    },
}

/// One target table and what happened to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: String,
    #[serde(flatten)]
    pub status: TableStatus,
}

impl TableOutcome {
    /// Whether the table was published
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, TableStatus::Loaded { .. })
    }

    /// Failed-table label, e.g. `silver_claims_fact (Schema Validation)`
    pub fn label(&self) -> String {
        match &self.status {
            TableStatus::Failed { kind, .. } => match kind.label() {
                Some(suffix) => format!("{} ({})", self.table, suffix),
                None => self.table.clone(),
            },
            TableStatus::Loaded { .. } => self.table.clone(),
        }
    }
}

/// A source table that could not be read; it was treated as empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub schema: String,
    pub table: String,
    pub message: String,
}

/// Summary of one layer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub layer: Layer,
    pub processing_timestamp: NaiveDateTime,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub extraction_failures: Vec<ExtractionFailure>,
    pub tables: Vec<TableOutcome>,
}

impl RunReport {
    /// Start a report for a new run
    pub fn new(layer: Layer, processing_timestamp: NaiveDateTime) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            layer,
            processing_timestamp,
            started_at: Utc::now(),
            finished_at: None,
            extraction_failures: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Record a loaded table
    pub fn record_loaded(&mut self, table: &str, records: usize) {
        self.tables.push(TableOutcome {
            table: table.to_string(),
            status: TableStatus::Loaded { records },
        });
    }

    /// Record a failed table
    pub fn record_failed(
        &mut self,
        table: &str,
        kind: FailureKind,
        message: impl Into<String>,
        violations: Vec<Violation>,
    ) {
        self.tables.push(TableOutcome {
            table: table.to_string(),
            status: TableStatus::Failed {
                kind,
                message: message.into(),
                violations,
            },
        });
    }

    /// Record a source that could not be read
    pub fn record_extraction_failure(&mut self, schema: &str, table: &str, message: String) {
        self.extraction_failures.push(ExtractionFailure {
            schema: schema.to_string(),
            table: table.to_string(),
            message,
        });
    }

    /// Mark the run finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of tables published
    pub fn loaded_tables(&self) -> usize {
        self.tables.iter().filter(|t| t.is_loaded()).count()
    }

    /// Rows published across all tables
    pub fn total_records(&self) -> usize {
        self.tables
            .iter()
            .map(|t| match t.status {
                TableStatus::Loaded { records } => records,
                TableStatus::Failed { .. } => 0,
            })
            .sum()
    }

    /// Labels of the tables that were not published
    pub fn failed_tables(&self) -> Vec<String> {
        self.tables
            .iter()
            .filter(|t| !t.is_loaded())
            .map(TableOutcome::label)
            .collect()
    }

    /// Outcome of one table
    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|t| t.table == table)
    }

    /// Whether every table was published
    pub fn is_success(&self) -> bool {
        self.tables.iter().all(TableOutcome::is_loaded)
    }

    /// Log the end-of-run banner
    pub fn log_summary(&self) {
        let rule = "=".repeat(60);
        tracing::info!("{}", rule);
        tracing::info!("{} LOAD SUMMARY", self.layer.to_string().to_uppercase());
        tracing::info!("{}", rule);
        tracing::info!("Tables loaded: {}", self.loaded_tables());
        tracing::info!("Total records: {}", self.total_records());
        if self.is_success() {
            tracing::info!(
                "All {} {} transformations completed successfully",
                self.tables.len(),
                self.layer
            );
        } else {
            tracing::warn!("Failed tables: {}", self.failed_tables().join(", "));
        }
        for failure in &self.extraction_failures {
            tracing::warn!(
                "Source {}.{} could not be read: {}",
                failure.schema,
                failure.table,
                failure.message
            );
        }
        tracing::info!("{}", rule);
    }
}

/// Log the first few violations of a rejected table
pub(crate) fn log_violations(table: &str, violations: &[Violation]) {
    tracing::error!(
        table,
        count = violations.len(),
        "Validation errors for '{}'",
        table
    );
    for violation in violations.iter().take(VIOLATION_SAMPLE) {
        tracing::error!(table, "  {}", violation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationKind;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn report() -> RunReport {
        let mut report = RunReport::new(Layer::Silver, stamp());
        report.record_loaded("silver_patients_dim", 10);
        report.record_failed(
            "silver_claims_fact",
            FailureKind::SchemaValidation,
            "rejected",
            vec![Violation::column("claim_id", ViolationKind::MissingColumn)],
        );
        report.record_loaded("silver_payers_dim", 3);
        report.record_failed("silver_encounters_fact", FailureKind::EmptyResult, "empty", vec![]);
        report
    }

    #[test]
    fn test_statistics() {
        let report = report();
        assert_eq!(report.loaded_tables(), 2);
        assert_eq!(report.total_records(), 13);
        assert!(!report.is_success());
        assert_eq!(
            report.failed_tables(),
            vec![
                "silver_claims_fact (Schema Validation)".to_string(),
                "silver_encounters_fact".to_string()
            ]
        );
    }

    #[test]
    fn test_serializes_status_inline() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["layer"], "silver");
        assert_eq!(json["tables"][0]["status"], "loaded");
        assert_eq!(json["tables"][0]["records"], 10);
        assert_eq!(json["tables"][1]["kind"], "schema_validation");
        assert!(json["tables"][3].get("violations").is_none());
    }

    #[test]
    fn test_empty_report_is_success() {
        let mut report = RunReport::new(Layer::Gold, stamp());
        report.finish();
        assert!(report.is_success());
        assert!(report.finished_at.is_some());
        assert_ne!(report.run_id, RunReport::new(Layer::Gold, report.processing_timestamp).run_id);
    }
}
