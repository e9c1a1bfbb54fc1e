//! Pipeline configuration
//!
//! Values are layered, lowest precedence first:
//!
//! 1. built-in defaults;
//! 2. an optional TOML file;
//! 3. the process environment;
//! 4. an optional `.env` file, which overrides everything else.
//!
//! Recognized variables: `PG_HOST`, `PG_PORT`, `PG_USER`, `PG_PASS`, `PG_DB`,
//! `ETL_BRONZE_SCHEMA`, `ETL_SILVER_SCHEMA`, `ETL_GOLD_SCHEMA`,
//! `ETL_PROCESSING_TIMESTAMP`, `ETL_LOG_FILE` and `ETL_LOG_JSON`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::value::parse_timestamp;

/// Connection settings for the relational store
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl DatabaseConfig {
    /// Key/value connection string understood by libpq-style clients
    pub fn connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote_conn_value(&self.host)),
            format!("port={}", self.port),
            format!("user={}", quote_conn_value(&self.user)),
            format!("dbname={}", quote_conn_value(&self.database)),
        ];
        if !self.password.is_empty() {
            parts.push(format!("password={}", quote_conn_value(&self.password)));
        }
        parts.join(" ")
    }
}

fn quote_conn_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Schema names of the three layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSchemas {
    pub bronze: String,
    pub silver: String,
    pub gold: String,
}

impl Default for LayerSchemas {
    fn default() -> Self {
        Self {
            bronze: "bronze".to_string(),
            silver: "silver".to_string(),
            gold: "gold".to_string(),
        }
    }
}

/// Log sink settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write logs to this file
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of text
    pub json: bool,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub database: DatabaseConfig,
    pub schemas: LayerSchemas,
    /// Fixed processing timestamp; the current local time when unset
    pub processing_timestamp: Option<NaiveDateTime>,
    pub logging: LoggingConfig,
    /// The `.env` file that was applied, if any
    #[serde(skip)]
    pub loaded_env_file: Option<PathBuf>,
}

impl EtlConfig {
    /// Load configuration from every source.
    ///
    /// A missing `.env` file is skipped; a missing TOML file is an error.
    /// Nothing is logged here since this runs before logging is set up; the
    /// applied `.env` path is kept in [`loaded_env_file`](Self::loaded_env_file).
    pub fn load(config_file: Option<&Path>, env_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match config_file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };

        config.apply_env(
            std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )?;

        if let Some(path) = env_file {
            if path.exists() {
                config.apply_env(read_dotenv(path)?)?;
                config.loaded_env_file = Some(path.to_path_buf());
            }
        }

        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply recognized variables; unknown names are ignored
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                "PG_HOST" => self.database.host = value,
                "PG_PORT" => {
                    self.database.port = value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::invalid_value(&key, "expected a port number"))?
                }
                "PG_USER" => self.database.user = value,
                "PG_PASS" => self.database.password = value,
                "PG_DB" => self.database.database = value,
                "ETL_BRONZE_SCHEMA" => self.schemas.bronze = value,
                "ETL_SILVER_SCHEMA" => self.schemas.silver = value,
                "ETL_GOLD_SCHEMA" => self.schemas.gold = value,
                "ETL_PROCESSING_TIMESTAMP" => {
                    self.processing_timestamp = Some(
                        parse_timestamp(&value)
                            .ok_or_else(|| ConfigError::invalid_value(&key, "expected a timestamp"))?,
                    )
                }
                "ETL_LOG_FILE" => {
                    self.logging.file = (!value.trim().is_empty()).then(|| PathBuf::from(value))
                }
                "ETL_LOG_JSON" => {
                    self.logging.json = parse_bool(&value)
                        .ok_or_else(|| ConfigError::invalid_value(&key, "expected true or false"))?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The configured processing timestamp, or now
    pub fn processing_timestamp_or_now(&self) -> NaiveDateTime {
        self.processing_timestamp
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Read a `.env` file
pub fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileError(format!("{}: {}", path.display(), e)))?;
    Ok(parse_dotenv(&content))
}

/// Parse `.env` content: `KEY=value` lines, `#` comments, optional `export`,
/// surrounding quotes and `\n`, `\t`, `\r` escapes.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim().to_string();
            let mut value = line[eq_pos + 1..].trim().to_string();

            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }

            value = value
                .replace("\\n", "\n")
                .replace("\\t", "\t")
                .replace("\\r", "\r");

            vars.push((key, value));
        }
    }

    vars
}
