//! Command-line runner for the claims pipeline
//!
//! Loads configuration, installs logging, connects to PostgreSQL and runs the
//! Silver and Gold layers, printing each [`RunReport`] as a table, JSON or
//! YAML.

pub mod commands;
pub mod logging;
pub mod output;

pub use commands::{EtlCli, EtlCommands, LayerArgs};
pub use output::{OutputFormat, ReportOutput};

use claims_etl_core::{ConfigError, EtlError, Layer, RunReport};

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every table was published
    Success = 0,
    /// At least one table failed
    TablesFailed = 1,
    /// Configuration could not be loaded or was invalid
    ConfigError = 3,
    /// The database could not be reached
    ConnectionError = 4,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a set of completed runs
    pub fn from_reports(reports: &[RunReport]) -> Self {
        if reports.iter().all(RunReport::is_success) {
            ExitCode::Success
        } else {
            ExitCode::TablesFailed
        }
    }

    /// Exit code for an error that stopped the command
    pub fn from_error(err: &anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<EtlError>() {
            return match err {
                EtlError::Connection(_) => ExitCode::ConnectionError,
                EtlError::Config(_) => ExitCode::ConfigError,
            };
        }
        if err.downcast_ref::<ConfigError>().is_some() {
            return ExitCode::ConfigError;
        }
        ExitCode::InternalError
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: EtlCli) -> anyhow::Result<ExitCode> {
    let EtlCli {
        verbose,
        env_file,
        config,
        log_json,
        log_file,
        command,
    } = cli;

    if let EtlCommands::Contracts { layer, format } = command {
        return commands::execute_contracts(layer, format);
    }

    let mut settings = commands::load_config(config.as_deref(), &env_file)?;
    if log_json {
        settings.logging.json = true;
    }
    if log_file.is_some() {
        settings.logging.file = log_file;
    }
    logging::init(verbose, &settings.logging)?;
    match &settings.loaded_env_file {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        None => tracing::debug!(path = %env_file.display(), "No .env file found"),
    }
    tracing::debug!(config = ?settings, "Configuration loaded");

    match command {
        EtlCommands::Silver(args) => commands::execute_layers(&settings, &args, &[Layer::Silver]),
        EtlCommands::Gold(args) => commands::execute_layers(&settings, &args, &[Layer::Gold]),
        EtlCommands::Run(args) => {
            commands::execute_layers(&settings, &args, &[Layer::Silver, Layer::Gold])
        }
        EtlCommands::Contracts { layer, format } => commands::execute_contracts(layer, format),
    }
}

/// Run the CLI, printing any error and mapping it to an exit code
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use claims_etl_cli::{run_cli, EtlCli};
///
/// let cli = EtlCli::parse();
/// let exit_code = run_cli(cli);
/// std::process::exit(exit_code.into());
/// ```
pub fn run_cli(cli: EtlCli) -> ExitCode {
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report() -> RunReport {
        let stamp = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        RunReport::new(Layer::Silver, stamp)
    }

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::TablesFailed), 1);
        assert_eq!(i32::from(ExitCode::ConfigError), 3);
        assert_eq!(i32::from(ExitCode::ConnectionError), 4);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_reports() {
        let mut ok = report();
        ok.record_loaded("silver_payers_dim", 3);
        let mut failed = report();
        failed.record_failed(
            "silver_claims_fact",
            claims_etl_core::pipeline::FailureKind::EmptyResult,
            "transform produced no rows",
            Vec::new(),
        );

        assert_eq!(ExitCode::from_reports(&[ok.clone()]), ExitCode::Success);
        assert_eq!(ExitCode::from_reports(&[ok, failed]), ExitCode::TablesFailed);
    }

    #[test]
    fn test_exit_code_from_error() {
        let connection = anyhow::Error::from(EtlError::connection("refused"));
        assert_eq!(ExitCode::from_error(&connection), ExitCode::ConnectionError);

        let config = anyhow::Error::from(EtlError::from(ConfigError::invalid_value("PG_PORT", "bad")));
        assert_eq!(ExitCode::from_error(&config), ExitCode::ConfigError);

        let other = anyhow::anyhow!("serializer failed");
        assert_eq!(ExitCode::from_error(&other), ExitCode::InternalError);
    }
}
