//! Claims ETL core
//!
//! The Silver and Gold layers of a Bronze → Silver → Gold healthcare claims
//! pipeline: raw, text-typed Bronze tables are cleaned, enriched and checked
//! against declarative contracts before being published as curated tables,
//! which are then aggregated into analytics tables.
//!
//! ## Architecture
//!
//! 1. **Values and tables** (`value`, `table`): tagged cells with total
//!    coercions, and ordered in-memory record sets.
//!
//! 2. **Contracts** (`contract/`): static field specifications per published
//!    table.
//!
//! 3. **Validation** (`validation/`): exhaustive batch validation of a
//!    candidate table against its contract.
//!
//! 4. **Transforms** (`transform/`, `gold/`): one pure function per target
//!    table.
//!
//! 5. **Store** (`store/`): the read/replace seam to the relational store.
//!
//! 6. **Pipeline** (`pipeline/`): orchestrators that run a layer and return a
//!    [`RunReport`].
//!
//! ## Example
//!
//! ```rust
//! use claims_etl_core::config::LayerSchemas;
//! use claims_etl_core::pipeline::SilverOrchestrator;
//! use claims_etl_core::store::InMemoryStore;
//!
//! let mut store = InMemoryStore::new();
//! let timestamp = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
//!     .unwrap()
//!     .and_hms_opt(0, 0, 0)
//!     .unwrap();
//!
//! let report = SilverOrchestrator::new(&mut store, LayerSchemas::default(), timestamp)
//!     .run()
//!     .unwrap();
//!
//! // Nothing in Bronze, so every table is reported as failed.
//! assert_eq!(report.failed_tables().len(), 5);
//! ```

pub mod config;
pub mod contract;
pub mod error;
pub mod gold;
pub mod pipeline;
pub mod store;
pub mod table;
pub mod transform;
pub mod validation;
pub mod value;

pub use config::EtlConfig;
pub use contract::{Constraint, FieldSpec, FieldType, TableContract};
pub use error::{ConfigError, EtlError, Result, TransformError};
pub use pipeline::{GoldOrchestrator, Layer, RunPhase, RunReport, SilverOrchestrator};
pub use store::{InMemoryStore, StoreError, TableStore};
pub use table::{Record, Table, TableError};
pub use validation::{SchemaViolationError, ValidatedTable, Validator, Violation, ViolationKind};
pub use value::Value;
