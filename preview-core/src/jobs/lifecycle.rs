//! ``src/jobs/lifecycle.rs``
//! ============================================================================
//! # Job Lifecycle Manager
//!
//! Owns every handle to an in-flight generation job: starts jobs for the
//! front of the pending queue, bounds how many run concurrently, reaps them
//! on completion, and cancels them all on invalidation. No other component
//! issues cancellation or resubmission.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::JobConfig;
use crate::jobs::engine::{EngineEvent, JobHandle, JobId, PreviewJobEngine};
use crate::queue::request_queue::PreviewRequestQueue;

pub struct JobLifecycleManager {
    engine: Arc<dyn PreviewJobEngine>,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    active: HashMap<JobId, JobHandle>,
    next_job_id: JobId,
    max_active: usize,
    max_batch_len: usize,
}

impl JobLifecycleManager {
    pub fn new(
        engine: Arc<dyn PreviewJobEngine>,
        event_tx: mpsc::UnboundedSender<EngineEvent>,
        config: &JobConfig,
    ) -> Self {
        Self {
            engine,
            event_tx,
            active: HashMap::new(),
            next_job_id: 1,
            max_active: config.max_active.max(1),
            max_batch_len: config.max_batch_len.max(1),
        }
    }

    /// Start jobs for the front of pending while concurrency slots are free.
    /// Returns the number of jobs started.
    pub fn submit_pending(&mut self, queue: &mut PreviewRequestQueue) -> usize {
        let mut started: usize = 0;

        while self.active.len() < self.max_active {
            let batch = queue.take_batch(self.max_batch_len);
            if batch.is_empty() {
                break;
            }

            let job_id: JobId = self.next_job_id;
            self.next_job_id += 1;

            let cancel = CancellationToken::new();
            debug!(job_id, items = batch.len(), "starting preview job");
            self.engine
                .start(job_id, batch, self.event_tx.clone(), cancel.clone());
            self.active.insert(job_id, JobHandle::new(job_id, cancel));
            started += 1;
        }

        started
    }

    /// Whether `job_id` belongs to the current job run. Events from unknown
    /// jobs are stale deliveries racing a cancellation.
    pub fn is_active(&self, job_id: JobId) -> bool {
        self.active.contains_key(&job_id)
    }

    /// Drop the handle once the engine signals the job finished.
    pub fn reap(&mut self, job_id: JobId) {
        if self.active.remove(&job_id).is_some() {
            trace!(job_id, "reaped finished preview job");
        }
    }

    /// Request cancellation of every outstanding job and clear bookkeeping.
    /// Best-effort: late deliveries are revalidated by the coordinator.
    pub fn cancel_all(&mut self) {
        if self.active.is_empty() {
            return;
        }
        debug!(jobs = self.active.len(), "cancelling outstanding preview jobs");
        for (_, handle) in self.active.drain() {
            handle.cancel();
        }
    }

    pub fn active_jobs(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{ItemId, ItemMeta, PreviewRequest};
    use std::sync::Mutex;

    /// Engine stub that records started batches and exposes the tokens.
    #[derive(Default)]
    struct RecordingEngine {
        started: Mutex<Vec<(JobId, Vec<ItemId>, CancellationToken)>>,
    }

    impl PreviewJobEngine for RecordingEngine {
        fn start(
            &self,
            job_id: JobId,
            batch: Vec<PreviewRequest>,
            _results: mpsc::UnboundedSender<EngineEvent>,
            cancel: CancellationToken,
        ) {
            let ids: Vec<ItemId> = batch.into_iter().map(|r| r.id).collect();
            self.started.lock().unwrap().push((job_id, ids, cancel));
        }
    }

    fn queue_with(ids: &[&str]) -> PreviewRequestQueue {
        let mut queue = PreviewRequestQueue::new();
        queue.enqueue(
            ids.iter()
                .map(|id| PreviewRequest::new(ItemId::from(*id), ItemMeta::file(id, 1))),
        );
        queue
    }

    fn manager(engine: Arc<RecordingEngine>, max_active: usize, max_batch: usize) -> JobLifecycleManager {
        let (tx, _rx) = mpsc::unbounded_channel();
        JobLifecycleManager::new(
            engine,
            tx,
            &JobConfig {
                max_active,
                max_batch_len: max_batch,
            },
        )
    }

    #[test]
    fn submit_batches_and_bounds_concurrency() {
        let engine = Arc::new(RecordingEngine::default());
        let mut jobs = manager(engine.clone(), 2, 2);
        let mut queue = queue_with(&["a", "b", "c", "d", "e", "f"]);

        assert_eq!(jobs.submit_pending(&mut queue), 2);
        assert_eq!(jobs.active_jobs(), 2);
        // Two jobs of two items each; the rest stays pending.
        assert_eq!(queue.pending_len(), 2);
        assert_eq!(queue.dispatched_len(), 4);

        // No free slot: nothing further is started.
        assert_eq!(jobs.submit_pending(&mut queue), 0);

        let started = engine.started.lock().unwrap();
        assert_eq!(started.len(), 2);
        assert_eq!(started[0].1, vec![ItemId::from("a"), ItemId::from("b")]);
    }

    #[test]
    fn reap_frees_a_slot() {
        let engine = Arc::new(RecordingEngine::default());
        let mut jobs = manager(engine.clone(), 1, 2);
        let mut queue = queue_with(&["a", "b", "c"]);

        assert_eq!(jobs.submit_pending(&mut queue), 1);
        let job_id = engine.started.lock().unwrap()[0].0;
        assert!(jobs.is_active(job_id));

        jobs.reap(job_id);
        assert!(!jobs.is_active(job_id));
        assert_eq!(jobs.submit_pending(&mut queue), 1);
    }

    #[test]
    fn cancel_all_fires_tokens_and_clears_bookkeeping() {
        let engine = Arc::new(RecordingEngine::default());
        let mut jobs = manager(engine.clone(), 2, 2);
        let mut queue = queue_with(&["a", "b", "c", "d"]);
        jobs.submit_pending(&mut queue);

        jobs.cancel_all();
        assert_eq!(jobs.active_jobs(), 0);
        for (_, _, token) in engine.started.lock().unwrap().iter() {
            assert!(token.is_cancelled());
        }
    }
}
