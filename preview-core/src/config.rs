//! ``src/config.rs``
//! ============================================================================
//! # Config: Preview Coordinator Configuration Loader and Saver
//!
//! All tunables of the coordinator in one serde struct: preview toggle, size
//! clamp, dispatch batching, scroll debounce intervals, job concurrency, and
//! the dimmed-icon cache. Loads and saves TOML from the proper cross-platform
//! config path using the [`directories`](https://docs.rs/directories) crate,
//! with robust defaulting when no config file exists.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use tokio::fs as TokioFs;

/// Periodic delivery of ready previews to the view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum previews flushed to the view per tick. Bounded so a burst of
    /// completed jobs cannot trigger a re-layout storm.
    pub batch_len: usize,

    /// Interval between flushes of the ready queue.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_len: 16,
            interval: Duration::from_millis(100),
        }
    }
}

/// Scroll debounce tuning. These are tunables, not invariants; tests assert
/// state-machine ordering rather than specific durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Quiet period after the last scroll event before the view counts as
    /// settling.
    #[serde(with = "humantime_serde")]
    pub quiet_interval: Duration,

    /// Additional settle period before job submission resumes.
    #[serde(with = "humantime_serde")]
    pub settle_interval: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            quiet_interval: Duration::from_millis(200),
            settle_interval: Duration::from_millis(300),
        }
    }
}

/// Bounded concurrency against the external job engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Maximum generation jobs in flight at once.
    pub max_active: usize,

    /// Maximum identifiers batched into a single job.
    pub max_batch_len: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_active: 2,
            max_batch_len: 8,
        }
    }
}

/// Dimmed-icon cache sizing (see `clipboard::cut_tracker`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutCacheConfig {
    /// Maximum number of cached dimmed bitmaps.
    pub max_capacity: u64,

    /// Time-to-live for entries.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for CutCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1024,
            ttl: Duration::from_secs(1800),
        }
    }
}

/// Main configuration struct for the preview coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Master toggle: when false, no jobs run and icons stay at default.
    pub show_previews: bool,

    /// Maximum preview width in pixels; larger bitmaps are clamped.
    pub max_width: u32,

    /// Maximum preview height in pixels; larger bitmaps are clamped.
    pub max_height: u32,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub scroll: ScrollConfig,

    #[serde(default)]
    pub jobs: JobConfig,

    #[serde(default)]
    pub cut_cache: CutCacheConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            show_previews: true,
            max_width: 128,
            max_height: 128,
            dispatch: DispatchConfig::default(),
            scroll: ScrollConfig::default(),
            jobs: JobConfig::default(),
            cut_cache: CutCacheConfig::default(),
        }
    }
}

impl PreviewConfig {
    /// Loads config from TOML at the XDG-compliant app config dir, or returns
    /// defaults (writing them out for discoverability).
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            info!("Loading config from {}", path.display());
            let text = TokioFs::read_to_string(&path).await?;
            let cfg: Self = toml::from_str(&text)?;

            Ok(cfg)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save().await?;

            Ok(default_config)
        }
    }

    /// Saves config to TOML at the XDG-compliant app config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()?;

        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(&path, toml_str).await?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "example", "PreviewCore")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg: PreviewConfig = PreviewConfig::default();
        assert!(cfg.show_previews);
        assert!(cfg.jobs.max_active >= 1);
        assert!(cfg.dispatch.batch_len >= 1);
    }

    #[tokio::test]
    async fn toml_roundtrip_via_tempfile() {
        let cfg: PreviewConfig = PreviewConfig::default();
        let text: String = toml::to_string_pretty(&cfg).expect("serialize");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        TokioFs::write(&path, &text).await.expect("write");

        let loaded: PreviewConfig =
            toml::from_str(&TokioFs::read_to_string(&path).await.expect("read")).expect("parse");
        assert_eq!(loaded.max_width, cfg.max_width);
        assert_eq!(loaded.scroll.quiet_interval, cfg.scroll.quiet_interval);
    }

    #[test]
    fn partial_config_uses_section_defaults() {
        let loaded: PreviewConfig =
            toml::from_str("show_previews = false\nmax_width = 64\nmax_height = 64\n")
                .expect("parse");
        assert!(!loaded.show_previews);
        assert_eq!(loaded.jobs.max_active, JobConfig::default().max_active);
    }
}
