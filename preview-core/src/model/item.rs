//! ``src/model/item.rs``
//! ============================================================================
//! # Item Model: Identifiers and Preview Request/Result Records
//!
//! Defines the stable item identifier used to key every queue and cache in the
//! coordinator, plus the request/result records that travel through the
//! preview pipeline.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::image::bitmap::Bitmap;

/// Stable, comparable handle for a file entry (conceptually its location/URL).
///
/// Identity-equality only; the coordinator never relies on an ordering between
/// identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(CompactString);

impl ItemId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(CompactString::new(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Metadata snapshot taken when an item is queued for preview generation.
///
/// The snapshot is handed to the job engine as-is; the engine never consults
/// the live model, so a listing change cannot race with an in-flight job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMeta {
    pub name: CompactString,
    pub is_dir: bool,
    pub size: u64,
}

impl ItemMeta {
    pub fn file(name: impl AsRef<str>, size: u64) -> Self {
        Self {
            name: CompactString::new(name.as_ref()),
            is_dir: false,
            size,
        }
    }

    pub fn dir(name: impl AsRef<str>) -> Self {
        Self {
            name: CompactString::new(name.as_ref()),
            is_dir: true,
            size: 0,
        }
    }
}

/// A queued preview request: identifier plus the metadata snapshot taken at
/// enqueue time. Lives from enqueue until a result arrives or the request is
/// superseded by a newer listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub id: ItemId,
    pub meta: ItemMeta,
}

impl PreviewRequest {
    pub fn new(id: ItemId, meta: ItemMeta) -> Self {
        Self { id, meta }
    }
}

/// A post-processed preview buffered for batched delivery to the view.
#[derive(Debug, Clone)]
pub struct ReadyPreview {
    pub id: ItemId,
    pub bitmap: Bitmap,
}
