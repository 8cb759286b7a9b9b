//! ``src/jobs/engine.rs``
//! ============================================================================
//! # Job Engine Boundary
//!
//! The external generation engine is modeled as a message-passing boundary:
//! the coordinator hands it a batch of requests plus a result channel and a
//! cancellation token, and the engine replies asynchronously with one event
//! per item followed by a finished signal. This is the only cross-thread
//! boundary in the coordinator and it is one-directional (engine → loop).

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::image::bitmap::Bitmap;
use crate::model::item::{ItemId, PreviewRequest};

/// Opaque identity of one generation job.
pub type JobId = u64;

/// Events delivered by the engine on the result channel.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A raw bitmap was produced for one identifier.
    Preview {
        job_id: JobId,
        id: ItemId,
        bitmap: Bitmap,
    },
    /// The engine cannot produce a bitmap for this identifier. Expected and
    /// non-fatal; the item keeps its default icon.
    Failed { job_id: JobId, id: ItemId },
    /// The job delivered everything it will deliver.
    Finished { job_id: JobId },
}

/// External job engine collaborator.
///
/// `start` must return immediately; generation happens on the engine's own
/// workers. Cancellation via the token is advisory: the engine may still
/// deliver results after it fires, and the coordinator revalidates every
/// arriving event.
pub trait PreviewJobEngine: Send + Sync {
    fn start(
        &self,
        job_id: JobId,
        batch: Vec<PreviewRequest>,
        results: mpsc::UnboundedSender<EngineEvent>,
        cancel: CancellationToken,
    );
}

/// Handle to an in-flight job: its identity plus the cancellation capability.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn new(job_id: JobId, cancel: CancellationToken) -> Self {
        Self { job_id, cancel }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Request best-effort cancellation from the engine.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
