//! Error types for the claims pipeline
//!
//! [`EtlError`] covers what stops a command: a lost connection or bad
//! configuration. Per-table failures (transform errors, contract
//! violations, store writes) never become an `EtlError`; they are recorded
//! in the [`RunReport`](crate::pipeline::RunReport).

use thiserror::Error;

use crate::table::TableError;

/// Errors raised inside a transform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A source table lacks a column the transform reads
    #[error("Source table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A running money total left the representable decimal range
    #[error("Total of '{column}' in '{table}' overflowed")]
    Overflow { table: String, column: String },

    /// The candidate table could not be assembled
    #[error("Failed to build '{table}': {source}")]
    Table {
        table: String,
        #[source]
        source: TableError,
    },
}

impl TransformError {
    /// Create a missing column error
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        TransformError::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create an overflow error
    pub fn overflow(table: impl Into<String>, column: impl Into<String>) -> Self {
        TransformError::Overflow {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Wrap a table construction error
    pub fn table(table: impl Into<String>, source: TableError) -> Self {
        TransformError::Table {
            table: table.into(),
            source,
        }
    }
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File access error
    #[error("File error: {0}")]
    FileError(String),

    /// The file or a value could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A value is syntactically fine but not usable
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::FileError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(format!("TOML error: {}", err))
    }
}

/// Errors that stop a run
#[derive(Error, Debug)]
pub enum EtlError {
    /// The store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EtlError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        EtlError::Connection(msg.into())
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransformError::missing_column("patients", "date_of_birth");
        assert_eq!(
            err.to_string(),
            "Source table 'patients' is missing required column 'date_of_birth'"
        );

        let err = TransformError::overflow("silver_claims_fact", "payments");
        assert_eq!(
            err.to_string(),
            "Total of 'payments' in 'silver_claims_fact' overflowed"
        );

        let err = EtlError::from(ConfigError::invalid_value("PG_PORT", "not a number"));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value for PG_PORT: not a number"
        );
    }
}
