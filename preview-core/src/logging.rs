//! ``src/logging.rs``
//! ============================================================================
//! # Logging: Tracing Subscriber Setup
//!
//! Installs the global `tracing` subscriber for binaries embedding the
//! coordinator: an `EnvFilter`-driven fmt layer on stderr plus an optional
//! non-blocking rolling file appender. Returns the appender's `WorkerGuard`;
//! dropping it flushes buffered log lines, so callers keep it alive for the
//! process lifetime.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub log_level: String,
    /// When false, log to stderr only.
    pub log_to_file: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "preview-core".to_string(),
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggerConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level in config")?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if config.log_to_file {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory: {}", config.log_dir.display())
        })?;

        let appender = RollingFileAppender::new(
            Rotation::DAILY,
            &config.log_dir,
            &config.log_file_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        Ok(None)
    }
}

/// Stderr-only setup with the default level.
pub fn init_default_logging() -> Result<Option<WorkerGuard>> {
    init_logging(&LoggerConfig {
        log_to_file: false,
        ..LoggerConfig::default()
    })
}
