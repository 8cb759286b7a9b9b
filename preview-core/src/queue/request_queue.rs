//! ``src/queue/request_queue.rs``
//! ============================================================================
//! # PreviewRequestQueue: Pending / Dispatched / Ready Stages
//!
//! The three-stage queue at the heart of the coordinator. Each stage is a
//! FIFO with an O(1) amortized membership test, keyed by [`ItemId`], and an
//! identifier is never duplicated within a stage. The structural invariant
//! (pending and dispatched are disjoint; ready may additionally hold an
//! identifier awaiting flush) is enforced here so callers cannot break it.

use std::collections::{HashMap, VecDeque};

use ahash::AHashSet;
use tracing::trace;

use crate::model::item::{ItemId, ItemMeta, PreviewRequest, ReadyPreview};

/// FIFO ordering plus hashed membership over [`ItemId`].
#[derive(Debug, Default)]
struct FifoSet {
    order: VecDeque<ItemId>,
    members: AHashSet<ItemId>,
}

impl FifoSet {
    fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    /// Appends `id` unless already present; returns whether it was added.
    fn push_back(&mut self, id: ItemId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push_back(id);
        true
    }

    fn pop_front(&mut self) -> Option<ItemId> {
        let id = self.order.pop_front()?;
        self.members.remove(&id);
        Some(id)
    }

    fn remove(&mut self, id: &ItemId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|queued| queued != id);
        true
    }

    fn clear(&mut self) -> Vec<ItemId> {
        self.members.clear();
        self.order.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.order.iter()
    }
}

/// Pending/dispatched/ready queue with one outstanding request per item.
#[derive(Debug, Default)]
pub struct PreviewRequestQueue {
    pending: FifoSet,
    dispatched: FifoSet,
    ready: VecDeque<ReadyPreview>,
    ready_ids: AHashSet<ItemId>,
    /// Metadata snapshots for identifiers in pending or dispatched.
    requests: HashMap<ItemId, ItemMeta>,
}

impl PreviewRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue requests whose identifier is absent from every stage, preserving
    /// arrival order for ties. Returns the number actually added.
    pub fn enqueue(&mut self, requests: impl IntoIterator<Item = PreviewRequest>) -> usize {
        let mut added: usize = 0;
        for request in requests {
            if self.dispatched.contains(&request.id)
                || self.ready_ids.contains(&request.id)
                || self.pending.contains(&request.id)
            {
                continue;
            }
            self.requests.insert(request.id.clone(), request.meta);
            self.pending.push_back(request.id);
            added += 1;
        }
        trace!(added, pending = self.pending.len(), "enqueued preview requests");
        added
    }

    /// Move the given identifiers to the front of pending, preserving their
    /// relative order among themselves. Identifiers not in pending are
    /// ignored. Idempotent.
    pub fn promote(&mut self, ids: &[ItemId]) {
        let mut front: Vec<ItemId> = Vec::with_capacity(ids.len());
        let mut promoted: AHashSet<&ItemId> = AHashSet::default();
        for id in ids {
            if self.pending.contains(id) && promoted.insert(id) {
                front.push(id.clone());
            }
        }
        if front.is_empty() {
            return;
        }

        let mut rest: VecDeque<ItemId> = VecDeque::with_capacity(self.pending.len());
        for id in self.pending.order.drain(..) {
            if !promoted.contains(&id) {
                rest.push_back(id);
            }
        }
        let mut order: VecDeque<ItemId> = VecDeque::from(front);
        order.append(&mut rest);
        self.pending.order = order;
    }

    /// Remove up to `n` requests from the front of pending, moving their
    /// identifiers into dispatched. The caller is responsible for confirming
    /// actual job dispatch.
    pub fn take_batch(&mut self, n: usize) -> Vec<PreviewRequest> {
        let mut batch: Vec<PreviewRequest> = Vec::with_capacity(n.min(self.pending.len()));
        while batch.len() < n {
            let Some(id) = self.pending.pop_front() else {
                break;
            };
            let meta = self
                .requests
                .get(&id)
                .cloned()
                .unwrap_or_else(|| ItemMeta::file(id.as_str(), 0));
            self.dispatched.push_back(id.clone());
            batch.push(PreviewRequest::new(id, meta));
        }
        batch
    }

    /// Drop an identifier from dispatched once its result (or failure) has
    /// been consumed.
    pub fn mark_done(&mut self, id: &ItemId) -> bool {
        let was_dispatched = self.dispatched.remove(id);
        if was_dispatched {
            self.requests.remove(id);
        }
        was_dispatched
    }

    /// Buffer a post-processed preview for delivery. Rejected when the
    /// identifier is already awaiting flush.
    pub fn push_ready(&mut self, preview: ReadyPreview) -> bool {
        if !self.ready_ids.insert(preview.id.clone()) {
            return false;
        }
        self.ready.push_back(preview);
        true
    }

    /// Remove and return up to `n` ready previews in FIFO order.
    pub fn drain_ready(&mut self, n: usize) -> Vec<ReadyPreview> {
        let take = n.min(self.ready.len());
        let mut batch: Vec<ReadyPreview> = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(preview) = self.ready.pop_front() {
                self.ready_ids.remove(&preview.id);
                batch.push(preview);
            }
        }
        batch
    }

    /// Empty every stage. Returns the identifiers that were dispatched so
    /// their jobs can be cancelled.
    pub fn invalidate_all(&mut self) -> Vec<ItemId> {
        self.pending.clear();
        self.requests.clear();
        self.ready.clear();
        self.ready_ids.clear();
        let dispatched = self.dispatched.clear();
        trace!(cancelled = dispatched.len(), "invalidated all preview queues");
        dispatched
    }

    /// Clear identifiers from every stage (items left the model).
    pub fn remove(&mut self, ids: &[ItemId]) {
        for id in ids {
            self.pending.remove(id);
            self.dispatched.remove(id);
            self.requests.remove(id);
            if self.ready_ids.remove(id) {
                self.ready.retain(|preview| &preview.id != id);
            }
        }
    }

    pub fn in_pending(&self, id: &ItemId) -> bool {
        self.pending.contains(id)
    }

    pub fn in_dispatched(&self, id: &ItemId) -> bool {
        self.dispatched.contains(id)
    }

    pub fn in_ready(&self, id: &ItemId) -> bool {
        self.ready_ids.contains(id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn dispatched_len(&self) -> usize {
        self.dispatched.len()
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub fn pending_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::bitmap::Bitmap;

    fn req(id: &str) -> PreviewRequest {
        PreviewRequest::new(ItemId::from(id), ItemMeta::file(id, 1))
    }

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().map(|s| ItemId::from(*s)).collect()
    }

    #[test]
    fn enqueue_deduplicates_across_stages() {
        let mut q = PreviewRequestQueue::new();
        assert_eq!(q.enqueue([req("a"), req("b"), req("a")]), 2);
        assert_eq!(q.pending_len(), 2);

        // "a" moves to dispatched; re-enqueueing it must be a no-op.
        let batch = q.take_batch(1);
        assert_eq!(batch[0].id, ItemId::from("a"));
        assert_eq!(q.enqueue([req("a")]), 0);
        assert!(!q.in_pending(&ItemId::from("a")));
    }

    #[test]
    fn pending_and_dispatched_stay_disjoint() {
        let mut q = PreviewRequestQueue::new();
        q.enqueue([req("a"), req("b"), req("c")]);
        q.take_batch(2);
        for id in ids(&["a", "b", "c"]) {
            assert!(!(q.in_pending(&id) && q.in_dispatched(&id)));
        }
        assert_eq!(q.pending_len() + q.dispatched_len(), 3);
    }

    #[test]
    fn promote_moves_to_front_preserving_relative_order() {
        let mut q = PreviewRequestQueue::new();
        q.enqueue([req("a"), req("b"), req("c"), req("d")]);
        q.promote(&ids(&["c", "b"]));

        let order: Vec<&ItemId> = q.pending_ids().collect();
        assert_eq!(order, ids(&["c", "b", "a", "d"]).iter().collect::<Vec<_>>());
    }

    #[test]
    fn promote_is_idempotent() {
        let mut q = PreviewRequestQueue::new();
        q.enqueue([req("a"), req("b"), req("c"), req("d")]);
        q.promote(&ids(&["d", "b"]));
        let once: Vec<ItemId> = q.pending_ids().cloned().collect();
        q.promote(&ids(&["d", "b"]));
        let twice: Vec<ItemId> = q.pending_ids().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn promote_ignores_unknown_and_dispatched_ids() {
        let mut q = PreviewRequestQueue::new();
        q.enqueue([req("a"), req("b")]);
        q.take_batch(1); // "a" dispatched
        q.promote(&ids(&["a", "zz", "b"]));
        let order: Vec<&ItemId> = q.pending_ids().collect();
        assert_eq!(order, ids(&["b"]).iter().collect::<Vec<_>>());
    }

    #[test]
    fn take_batch_respects_fifo_and_bound() {
        let mut q = PreviewRequestQueue::new();
        q.enqueue([req("a"), req("b"), req("c")]);
        let batch = q.take_batch(2);
        let batch_ids: Vec<&ItemId> = batch.iter().map(|r| &r.id).collect();
        assert_eq!(batch_ids, ids(&["a", "b"]).iter().collect::<Vec<_>>());
        assert!(q.in_dispatched(&ItemId::from("a")));
        assert_eq!(q.take_batch(5).len(), 1);
        assert!(q.take_batch(1).is_empty());
    }

    #[test]
    fn invalidate_all_reports_dispatched_ids() {
        let mut q = PreviewRequestQueue::new();
        q.enqueue([req("a"), req("b"), req("c")]);
        q.take_batch(2);
        q.push_ready(ReadyPreview {
            id: ItemId::from("x"),
            bitmap: Bitmap::filled(2, 2, 0),
        });

        let cancelled = q.invalidate_all();
        assert_eq!(cancelled, ids(&["a", "b"]));
        assert_eq!(q.pending_len(), 0);
        assert_eq!(q.dispatched_len(), 0);
        assert_eq!(q.ready_len(), 0);
    }

    #[test]
    fn remove_clears_every_stage() {
        let mut q = PreviewRequestQueue::new();
        q.enqueue([req("a"), req("b")]);
        q.take_batch(1); // "a" dispatched
        q.push_ready(ReadyPreview {
            id: ItemId::from("b"),
            bitmap: Bitmap::filled(2, 2, 0),
        });

        q.remove(&ids(&["a", "b"]));
        assert_eq!(q.pending_len(), 0);
        assert_eq!(q.dispatched_len(), 0);
        assert_eq!(q.ready_len(), 0);
    }

    #[test]
    fn ready_drains_in_fifo_order_without_duplicates() {
        let mut q = PreviewRequestQueue::new();
        let bmp = Bitmap::filled(2, 2, 0);
        assert!(q.push_ready(ReadyPreview { id: ItemId::from("a"), bitmap: bmp.clone() }));
        assert!(q.push_ready(ReadyPreview { id: ItemId::from("b"), bitmap: bmp.clone() }));
        assert!(!q.push_ready(ReadyPreview { id: ItemId::from("a"), bitmap: bmp }));

        let first = q.drain_ready(1);
        assert_eq!(first[0].id, ItemId::from("a"));
        let rest = q.drain_ready(10);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ItemId::from("b"));
    }
}
