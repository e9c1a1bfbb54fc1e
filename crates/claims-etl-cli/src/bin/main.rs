//! Claims ETL CLI
//!
//! # Usage
//!
//! ```bash
//! # Curate Bronze into Silver
//! claims-etl silver --processing-timestamp "2024-01-01 00:00:00"
//!
//! # Silver then Gold with one shared timestamp, JSON report
//! claims-etl --env-file prod.env run --format json
//!
//! # Show the Silver contracts
//! claims-etl contracts --layer silver
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success - every table was published
//! - 1: One or more tables failed
//! - 3: Configuration error
//! - 4: Database connection error
//! - 10: Internal error

use clap::Parser;
use claims_etl_cli::{run_cli, EtlCli};

fn main() {
    let cli = EtlCli::parse();
    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
