//! Silver layer run: Bronze sources to the five curated tables

use chrono::NaiveDateTime;

use crate::config::LayerSchemas;
use crate::error::Result;
use crate::store::TableStore;
use crate::transform::{self, BronzeTables, TransformContext};
use crate::validation::Validator;

use super::{ensure_connected, Layer, LayerRunner, RunPhase, RunReport};

/// Runs the Silver layer against a store
pub struct SilverOrchestrator<'a> {
    store: &'a mut dyn TableStore,
    schemas: LayerSchemas,
    validator: Validator,
    processing_timestamp: NaiveDateTime,
    phase: RunPhase,
}

impl<'a> SilverOrchestrator<'a> {
    /// Create an orchestrator. Every row of the run is stamped with
    /// `processing_timestamp` and ages are computed against it.
    pub fn new(
        store: &'a mut dyn TableStore,
        schemas: LayerSchemas,
        processing_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            store,
            schemas,
            validator: Validator::new(),
            processing_timestamp,
            phase: RunPhase::Idle,
        }
    }

    /// Replace the validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Current phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run the layer.
    ///
    /// Only an unreachable store is an error; per-table failures are in the
    /// returned report.
    pub fn run(&mut self) -> Result<RunReport> {
        tracing::info!(
            processing_timestamp = %self.processing_timestamp,
            "Starting Silver layer run"
        );
        self.phase = RunPhase::Idle;
        ensure_connected(&mut *self.store)?;

        let mut runner = LayerRunner::new(
            &mut *self.store,
            &self.validator,
            Layer::Silver,
            self.schemas.bronze.as_str(),
            self.schemas.silver.as_str(),
            self.processing_timestamp,
        );

        self.phase = RunPhase::Extracting;
        let [patients, claims, claims_transactions, encounters, payers] =
            BronzeTables::SOURCES.map(|source| runner.extract(source));
        let bronze = BronzeTables {
            patients,
            claims,
            claims_transactions,
            encounters,
            payers,
        };

        self.phase = RunPhase::Transforming;
        let context = TransformContext::new(self.processing_timestamp);
        for (contract, candidate) in transform::transform_all(&bronze, &context) {
            runner.publish(contract, candidate);
        }

        let report = runner.finish();
        self.phase = RunPhase::Summarized;
        report.log_summary();

        self.phase = RunPhase::Done;
        tracing::info!(run_id = %report.run_id, "Silver layer run complete");
        Ok(report)
    }
}
