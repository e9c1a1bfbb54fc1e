//! Output formatting for run reports and contracts
//!
//! Structured output in JSON, YAML and a colored human-readable table.

use std::io::{self, Write};

use clap::ValueEnum;
use claims_etl_core::pipeline::{TableOutcome, TableStatus};
use claims_etl_core::{RunReport, TableContract};
use colored::Colorize;
use serde::Serialize;

/// Violations listed per failed table in the table format
const VIOLATION_SAMPLE: usize = 5;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Output for one or more layer runs
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    /// Whether every table of every run was published
    pub success: bool,
    pub runs: Vec<RunOutput>,
}

/// One layer run
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: String,
    pub layer: String,
    pub processing_timestamp: String,
    pub tables_loaded: usize,
    pub total_records: usize,
    pub failed_tables: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extraction_failures: Vec<String>,
    pub tables: Vec<TableRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

/// One target table
#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub table: String,
    pub loaded: bool,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
    pub violation_count: usize,
}

impl TableRow {
    fn from_outcome(outcome: &TableOutcome) -> Self {
        match &outcome.status {
            TableStatus::Loaded { records } => Self {
                table: outcome.table.clone(),
                loaded: true,
                records: *records,
                error: None,
                violations: Vec::new(),
                violation_count: 0,
            },
            TableStatus::Failed {
                message,
                violations,
                ..
            } => Self {
                table: outcome.label(),
                loaded: false,
                records: 0,
                error: Some(message.clone()),
                violations: violations.iter().map(ToString::to_string).collect(),
                violation_count: violations.len(),
            },
        }
    }
}

impl RunOutput {
    /// Create output from a run report
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            layer: report.layer.to_string(),
            processing_timestamp: report.processing_timestamp.to_string(),
            tables_loaded: report.loaded_tables(),
            total_records: report.total_records(),
            failed_tables: report.failed_tables(),
            extraction_failures: report
                .extraction_failures
                .iter()
                .map(|f| format!("{}.{}: {}", f.schema, f.table, f.message))
                .collect(),
            tables: report.tables.iter().map(TableRow::from_outcome).collect(),
            duration_ms: report
                .finished_at
                .map(|end| (end - report.started_at).num_milliseconds()),
        }
    }
}

impl ReportOutput {
    /// Create output from completed runs
    pub fn from_reports(reports: &[RunReport]) -> Self {
        Self {
            success: reports.iter().all(RunReport::is_success),
            runs: reports.iter().map(RunOutput::from_report).collect(),
        }
    }

    /// Render to stdout in the specified format
    pub fn render(&self, format: OutputFormat) -> anyhow::Result<()> {
        let mut stdout = io::stdout();
        self.write(format, &mut stdout)?;
        stdout.flush()?;
        Ok(())
    }

    /// Render in the specified format
    pub fn write<W: Write>(&self, format: OutputFormat, out: &mut W) -> anyhow::Result<()> {
        match format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(self)?)?,
            OutputFormat::Yaml => write!(out, "{}", serde_yaml::to_string(self)?)?,
            OutputFormat::Table => self.write_table(out)?,
        }
        Ok(())
    }

    fn write_table<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for run in &self.runs {
            writeln!(out)?;
            writeln!(
                out,
                "{}",
                format!("{} LOAD SUMMARY", run.layer.to_uppercase()).cyan().bold()
            )?;
            writeln!(out, "{}", "=".repeat(60))?;
            writeln!(out, "Run:                  {}", run.run_id.dimmed())?;
            writeln!(out, "Processing timestamp: {}", run.processing_timestamp)?;
            writeln!(out, "Tables loaded:        {}", run.tables_loaded)?;
            writeln!(out, "Total records:        {}", run.total_records)?;
            writeln!(out)?;

            for table in &run.tables {
                if table.loaded {
                    writeln!(
                        out,
                        "{} {:<40} {:>10}",
                        "+".green(),
                        table.table,
                        table.records
                    )?;
                } else {
                    writeln!(out, "{} {}", "x".red(), table.table.red())?;
                    if let Some(error) = &table.error {
                        writeln!(out, "  {} {}", "Error:".dimmed(), error)?;
                    }
                    for violation in table.violations.iter().take(VIOLATION_SAMPLE) {
                        writeln!(out, "  - {}", violation)?;
                    }
                    if table.violation_count > VIOLATION_SAMPLE {
                        writeln!(
                            out,
                            "  ... and {} more",
                            table.violation_count - VIOLATION_SAMPLE
                        )?;
                    }
                }
            }

            if !run.extraction_failures.is_empty() {
                writeln!(out)?;
                writeln!(out, "{}", "Unreadable sources:".yellow().bold())?;
                for failure in &run.extraction_failures {
                    writeln!(out, "  {} {}", "!".yellow(), failure)?;
                }
            }

            writeln!(out, "{}", "=".repeat(60))?;
            if run.failed_tables.is_empty() {
                writeln!(
                    out,
                    "{} All {} {} tables loaded",
                    "+".green(),
                    run.tables.len(),
                    run.layer
                )?;
            } else {
                writeln!(
                    out,
                    "{} Failed tables: {}",
                    "x".red(),
                    run.failed_tables.join(", ")
                )?;
            }
            if let Some(duration) = run.duration_ms {
                writeln!(out, "Completed in {} ms", duration.to_string().dimmed())?;
            }
        }
        Ok(())
    }
}

/// Render table contracts
pub fn render_contracts<W: Write>(
    contracts: &[&'static TableContract],
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(contracts)?)?,
        OutputFormat::Yaml => write!(out, "{}", serde_yaml::to_string(contracts)?)?,
        OutputFormat::Table => {
            for contract in contracts {
                writeln!(out)?;
                writeln!(out, "{}", contract.name.cyan().bold())?;
                writeln!(out, "{}", "-".repeat(60))?;
                for field in contract.fields {
                    let mut flags = Vec::new();
                    if field.nullable {
                        flags.push("nullable".to_string());
                    }
                    if field.unique {
                        flags.push("unique".to_string());
                    }
                    if let Some(constraint) = &field.constraint {
                        flags.push(constraint.describe());
                    }
                    writeln!(
                        out,
                        "  {:<36} {:<10} {}",
                        field.name,
                        field.field_type.to_string().dimmed(),
                        flags.join(", ")
                    )?;
                }
            }
        }
    }
    Ok(())
}
