//! CLI command definitions for the claims pipeline

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use claims_etl_core::config::LayerSchemas;
use claims_etl_core::contract::{gold, silver, TableContract};
use claims_etl_core::value::parse_timestamp;
use claims_etl_core::{
    ConfigError, EtlConfig, EtlError, GoldOrchestrator, Layer, RunReport, SilverOrchestrator,
    TableStore,
};
use claims_etl_postgres::PostgresStore;

use super::output::{render_contracts, OutputFormat, ReportOutput};
use super::ExitCode;

/// Healthcare claims ETL
///
/// Curate raw Bronze tables into validated Silver tables and aggregate them
/// into Gold analytics tables.
#[derive(Parser, Debug)]
#[command(name = "claims-etl")]
#[command(about = "Claims ETL - curate Bronze into Silver and Gold", long_about = None)]
#[command(version)]
pub struct EtlCli {
    /// Output verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// `.env` file with connection settings; overrides the environment
    #[arg(long, global = true, default_value = ".env", env = "ETL_ENV_FILE")]
    pub env_file: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: EtlCommands,
}

/// Options shared by the layer commands
#[derive(Args, Debug, Clone)]
pub struct LayerArgs {
    /// Processing timestamp stamped on every row (default: now)
    #[arg(long)]
    pub processing_timestamp: Option<String>,

    /// Output format for the run report
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum EtlCommands {
    /// Transform Bronze into the Silver tables
    Silver(LayerArgs),

    /// Aggregate the Silver tables into the Gold tables
    Gold(LayerArgs),

    /// Run Silver then Gold with one processing timestamp
    ///
    /// Gold runs even when some Silver tables failed; it reads whatever
    /// Silver tables are currently published.
    Run(LayerArgs),

    /// Print the declared table contracts
    Contracts {
        /// Only show one layer
        #[arg(long, value_enum)]
        layer: Option<LayerArg>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Layer selector
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum LayerArg {
    Silver,
    Gold,
}

impl From<LayerArg> for Layer {
    fn from(layer: LayerArg) -> Self {
        match layer {
            LayerArg::Silver => Layer::Silver,
            LayerArg::Gold => Layer::Gold,
        }
    }
}

/// Load configuration from the TOML file, the environment and the `.env` file
pub fn load_config(config: Option<&Path>, env_file: &Path) -> Result<EtlConfig, EtlError> {
    Ok(EtlConfig::load(config, Some(env_file))?)
}

/// Processing timestamp from the flag, then the configuration, then now
pub fn resolve_timestamp(flag: Option<&str>, config: &EtlConfig) -> Result<NaiveDateTime, EtlError> {
    match flag {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| {
            EtlError::from(ConfigError::invalid_value(
                "--processing-timestamp",
                format!("'{}' is not a timestamp", raw),
            ))
        }),
        None => Ok(config.processing_timestamp_or_now()),
    }
}

/// Run layers in order against one store
pub fn run_layers(
    store: &mut dyn TableStore,
    schemas: &LayerSchemas,
    processing_timestamp: NaiveDateTime,
    layers: &[Layer],
) -> Result<Vec<RunReport>, EtlError> {
    let mut reports = Vec::with_capacity(layers.len());
    for layer in layers {
        let report = match layer {
            Layer::Silver => {
                SilverOrchestrator::new(&mut *store, schemas.clone(), processing_timestamp).run()?
            }
            Layer::Gold => {
                GoldOrchestrator::new(&mut *store, schemas.clone(), processing_timestamp).run()?
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

/// Execute the silver, gold and run commands
pub fn execute_layers(
    config: &EtlConfig,
    args: &LayerArgs,
    layers: &[Layer],
) -> anyhow::Result<ExitCode> {
    let processing_timestamp = resolve_timestamp(args.processing_timestamp.as_deref(), config)?;

    let mut store = PostgresStore::connect(&config.database)
        .map_err(|e| EtlError::connection(e.to_string()))?;

    let reports = run_layers(&mut store, &config.schemas, processing_timestamp, layers)?;
    ReportOutput::from_reports(&reports).render(args.format)?;

    Ok(ExitCode::from_reports(&reports))
}

/// Execute the contracts command
pub fn execute_contracts(layer: Option<LayerArg>, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let contracts: Vec<&'static TableContract> = match layer.map(Layer::from) {
        Some(Layer::Silver) => silver::all().to_vec(),
        Some(Layer::Gold) => gold::all().to_vec(),
        None => silver::all().into_iter().chain(gold::all()).collect(),
    };
    render_contracts(&contracts, format, &mut std::io::stdout())?;
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use claims_etl_core::{InMemoryStore, Table, Value};

    #[test]
    fn test_cli_definition() {
        EtlCli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_global_flags() {
        let cli = EtlCli::try_parse_from([
            "claims-etl",
            "run",
            "--processing-timestamp",
            "2024-01-01",
            "--format",
            "json",
            "-vv",
            "--env-file",
            "prod.env",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.env_file, PathBuf::from("prod.env"));
        match cli.command {
            EtlCommands::Run(args) => {
                assert_eq!(args.processing_timestamp.as_deref(), Some("2024-01-01"));
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_contracts_layer() {
        let cli = EtlCli::try_parse_from(["claims-etl", "contracts", "--layer", "gold"]).unwrap();
        assert!(matches!(
            cli.command,
            EtlCommands::Contracts {
                layer: Some(LayerArg::Gold),
                format: OutputFormat::Table
            }
        ));
        assert!(EtlCli::try_parse_from(["claims-etl", "contracts", "--layer", "bronze"]).is_err());
    }

    #[test]
    fn test_resolve_timestamp() {
        let config = EtlConfig::default();
        let ts = resolve_timestamp(Some("2024-03-01T10:30:00"), &config).unwrap();
        assert_eq!(ts.to_string(), "2024-03-01 10:30:00");

        let err = resolve_timestamp(Some("tomorrow"), &config).unwrap_err();
        assert!(matches!(err, EtlError::Config(ConfigError::InvalidValue { .. })));

        let fixed = EtlConfig {
            processing_timestamp: Some(ts),
            ..Default::default()
        };
        assert_eq!(resolve_timestamp(None, &fixed).unwrap(), ts);
    }

    #[test]
    fn test_run_layers_in_order() {
        let payers = Table::from_rows(
            ["payer_id", "payer_name"],
            vec![vec![Value::text("A"), Value::text("Acme")]],
        )
        .unwrap();
        let mut store = InMemoryStore::new().with_table("bronze", "bronze_payers", payers);
        let ts = parse_timestamp("2024-01-01").unwrap();

        let reports = run_layers(
            &mut store,
            &LayerSchemas::default(),
            ts,
            &[Layer::Silver, Layer::Gold],
        )
        .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].layer, Layer::Silver);
        assert_eq!(reports[1].layer, Layer::Gold);
        assert_eq!(reports[0].loaded_tables(), 1);
        assert!(store.table("silver", "silver_payers_dim").is_some());
        assert_eq!(ExitCode::from_reports(&reports), ExitCode::TablesFailed);
    }

    #[test]
    fn test_unreachable_store_stops_before_gold() {
        let mut store = InMemoryStore::new();
        store.fail_connection("connection refused");
        let ts = parse_timestamp("2024-01-01").unwrap();

        let err = run_layers(&mut store, &LayerSchemas::default(), ts, &[Layer::Silver, Layer::Gold])
            .unwrap_err();
        assert!(matches!(err, EtlError::Connection(_)));
    }
}
