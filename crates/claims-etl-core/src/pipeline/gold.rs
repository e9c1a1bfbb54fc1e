//! Gold layer run: published Silver tables to the analytics aggregates

use chrono::NaiveDateTime;

use crate::config::LayerSchemas;
use crate::error::Result;
use crate::gold::{self, SilverTables};
use crate::store::TableStore;
use crate::transform::TransformContext;
use crate::validation::Validator;

use super::{ensure_connected, Layer, LayerRunner, RunPhase, RunReport};

/// Runs the Gold layer against a store
pub struct GoldOrchestrator<'a> {
    store: &'a mut dyn TableStore,
    schemas: LayerSchemas,
    validator: Validator,
    processing_timestamp: NaiveDateTime,
    phase: RunPhase,
}

impl<'a> GoldOrchestrator<'a> {
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

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run the layer; see [`SilverOrchestrator::run`](super::SilverOrchestrator::run)
    pub fn run(&mut self) -> Result<RunReport> {
        tracing::info!(
            processing_timestamp = %self.processing_timestamp,
            "Starting Gold layer run"
        );
        self.phase = RunPhase::Idle;
        ensure_connected(&mut *self.store)?;

        let mut runner = LayerRunner::new(
            &mut *self.store,
            &self.validator,
            Layer::Gold,
            self.schemas.silver.as_str(),
            self.schemas.gold.as_str(),
            self.processing_timestamp,
        );

        self.phase = RunPhase::Extracting;
        let [patients, claims, encounters, claims_transactions] =
            SilverTables::SOURCES.map(|source| runner.extract(source));
        let silver = SilverTables {
            patients,
            claims,
            encounters,
            claims_transactions,
        };

        self.phase = RunPhase::Transforming;
        let context = TransformContext::new(self.processing_timestamp);
        for (contract, candidate) in gold::transform_all(&silver, &context) {
            runner.publish(contract, candidate);
        }

        let report = runner.finish();
        self.phase = RunPhase::Summarized;
        report.log_summary();

        self.phase = RunPhase::Done;
        tracing::info!(run_id = %report.run_id, "Gold layer run complete");
        Ok(report)
    }
}
