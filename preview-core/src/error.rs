//! ``src/error.rs``
//! ============================================================================
//! # PreviewError: Unified Error Type for the Preview Coordinator
//!
//! Expected pipeline conditions (generation failures, stale results,
//! cancellation races, missing geometry) are handled internally and never
//! become errors; this enum covers genuine faults only.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Unified error type for coordinator setup and runtime faults.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config file I/O error with path.
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The view dropped its delivery receiver while the coordinator was
    /// still running.
    #[error("Delivery channel closed: {0}")]
    DeliveryClosed(String),

    /// Async task failure or join error.
    #[error("Async task failed: {0}")]
    Task(String),

    /// Coordinator shut down while work was outstanding.
    #[error("Operation was cancelled")]
    Cancelled,

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(String),
}

impl PreviewError {
    /// Attach extra context to an error.
    pub fn with_context<S: Into<String>>(self, ctx: S) -> PreviewError {
        PreviewError::Other(format!("{}: {}", ctx.into(), self))
    }
}

// Allow conversion from `anyhow::Error` as fallback.
impl From<anyhow::Error> for PreviewError {
    fn from(e: anyhow::Error) -> Self {
        PreviewError::Other(e.to_string())
    }
}
