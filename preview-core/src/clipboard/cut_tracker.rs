//! ``src/clipboard/cut_tracker.rs``
//! ============================================================================
//! # Cut Item Tracker
//!
//! Tracks which identifiers are currently marked "cut" by the external
//! clipboard collaborator and caches their dimmed icons, so a clipboard
//! change only re-processes bitmaps through the cut effect instead of
//! regenerating previews.

use std::collections::HashSet;
use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::config::CutCacheConfig;
use crate::image::bitmap::Bitmap;
use crate::image::post_process::apply_cut_effect;
use crate::model::item::ItemId;

/// External clipboard collaborator boundary.
pub trait ClipboardSource: Send + Sync {
    /// Identifiers of all items currently part of a cut operation.
    fn current_cut_ids(&self) -> HashSet<ItemId>;
}

pub struct CutItemTracker {
    source: Arc<dyn ClipboardSource>,
    cut: HashSet<ItemId>,
    /// identifier → already-dimmed icon, invalidated wholesale on clipboard
    /// change and per-entry when a fresh bitmap arrives for an item.
    dimmed: Cache<ItemId, Bitmap>,
}

impl CutItemTracker {
    pub fn new(source: Arc<dyn ClipboardSource>, config: &CutCacheConfig) -> Self {
        let dimmed: Cache<ItemId, Bitmap> = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();
        Self {
            source,
            cut: HashSet::new(),
            dimmed,
        }
    }

    /// Re-query the clipboard. When the cut set changed, the dimmed cache is
    /// invalidated and the identifiers whose cut state flipped are returned
    /// so their icons can be re-evaluated (swap dimmed/original, never
    /// regenerate).
    pub fn refresh(&mut self) -> Option<Vec<ItemId>> {
        let current: HashSet<ItemId> = self.source.current_cut_ids();
        if current == self.cut {
            return None;
        }

        let changed: Vec<ItemId> = self.cut.symmetric_difference(&current).cloned().collect();
        debug!(changed = changed.len(), "clipboard cut set changed");

        self.dimmed.invalidate_all();
        self.cut = current;
        Some(changed)
    }

    pub fn is_cut(&self, id: &ItemId) -> bool {
        self.cut.contains(id)
    }

    /// Cached-or-computed dimmed variant of `base` for a cut item.
    pub async fn dimmed(&self, id: &ItemId, base: &Bitmap) -> Bitmap {
        let source: Bitmap = base.clone();
        self.dimmed
            .get_with(id.clone(), async move { apply_cut_effect(&source) })
            .await
    }

    /// Drop the cached dimmed icon for one identifier; used when its
    /// underlying bitmap was regenerated.
    pub async fn invalidate(&self, id: &ItemId) {
        self.dimmed.invalidate(id).await;
    }
}
