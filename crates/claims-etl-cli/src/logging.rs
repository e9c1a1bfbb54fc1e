//! Logging setup for the CLI
//!
//! Logs go to stderr so reports on stdout stay machine-readable. `RUST_LOG`
//! takes precedence over the verbosity flag.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use anyhow::Context;
use claims_etl_core::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Default filter directive for a verbosity count
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
pub fn init(verbose: u8, config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.json {
        layers.push(fmt::layer().json().with_writer(io::stderr).boxed());
    } else {
        layers.push(fmt::layer().with_target(false).with_writer(io::stderr).boxed());
    }

    if let Some(path) = &config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}
