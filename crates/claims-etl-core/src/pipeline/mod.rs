//! Layer orchestration
//!
//! [`SilverOrchestrator`] and [`GoldOrchestrator`] sequence one layer run:
//! check the store, extract every source, transform, validate and load each
//! target table independently, and summarize. Both share [`LayerRunner`] for
//! the per-table steps and return a [`RunReport`].

pub mod gold;
pub mod report;
pub mod runner;
pub mod silver;

pub use gold::GoldOrchestrator;
pub use report::{ExtractionFailure, FailureKind, Layer, RunReport, TableOutcome, TableStatus};
pub use runner::LayerRunner;
pub use silver::SilverOrchestrator;

use serde::Serialize;

use crate::error::EtlError;
use crate::store::TableStore;

/// Where an orchestrator is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Extracting,
    Transforming,
    Summarized,
    Done,
}

/// Fail the run unless the store answers
pub(crate) fn ensure_connected(store: &mut dyn TableStore) -> Result<(), EtlError> {
    store.ping().map_err(|e| {
        tracing::error!(error = %e, "Store is unreachable");
        EtlError::connection(e.to_string())
    })
}
