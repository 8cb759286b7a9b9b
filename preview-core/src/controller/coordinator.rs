//! ``src/controller/coordinator.rs``
//! ============================================================================
//! # Preview Coordinator: Async Event Loop
//!
//! Ties the queue, prioritizer, scroll controller, cut tracker, and job
//! lifecycle together. All queue mutation and state transitions happen on
//! this one logical task; the engine's result channel is the only inbound
//! cross-thread boundary. Commands arrive from the view over a channel and
//! processed previews leave over another, so nothing here ever blocks the
//! caller.

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::clipboard::cut_tracker::{ClipboardSource, CutItemTracker};
use crate::config::PreviewConfig;
use crate::controller::scroll_pause::{ScrollPauseController, ScrollTransition};
use crate::error::PreviewError;
use crate::image::bitmap::Bitmap;
use crate::image::post_process::{add_frame, clamp_to_max};
use crate::jobs::engine::{EngineEvent, PreviewJobEngine};
use crate::jobs::lifecycle::JobLifecycleManager;
use crate::model::item::{ItemId, ItemMeta, PreviewRequest, ReadyPreview};
use crate::queue::request_queue::PreviewRequestQueue;
use crate::view::visibility::{ItemGeometry, Rect, partition};

/// Commands from the view/model collaborator.
#[derive(Debug, Clone)]
pub enum PreviewCommand {
    /// Toggle preview generation. Off cancels all work and drops buffered
    /// results undelivered; on re-evaluates the full listing.
    SetPreviewsEnabled(bool),
    /// Replace the listing (directory change or model reset).
    SetListing(Vec<(ItemId, ItemMeta)>),
    /// Items entered the model incrementally.
    ItemsAdded(Vec<(ItemId, ItemMeta)>),
    /// Items left the model; any outstanding work for them is dropped.
    ItemsRemoved(Vec<ItemId>),
    /// Force a full re-evaluation of the current listing.
    Refresh,
    /// The visible rectangle moved.
    ViewportChanged(Rect),
    /// The external clipboard content changed.
    ClipboardChanged,
    Shutdown,
}

/// Batched results delivered to the view.
#[derive(Debug, Clone)]
pub enum PreviewUpdate {
    /// Finished previews in ready-queue FIFO order.
    Previews(Vec<(ItemId, Bitmap)>),
    /// Only the dimming effect changed for these identifiers; no new bitmap.
    CutStateChanged(Vec<ItemId>),
}

/// Cloneable command sender handed to the view.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    tx: mpsc::UnboundedSender<PreviewCommand>,
}

impl PreviewHandle {
    pub fn set_previews_enabled(&self, enabled: bool) {
        let _ = self.tx.send(PreviewCommand::SetPreviewsEnabled(enabled));
    }

    pub fn set_listing(&self, items: Vec<(ItemId, ItemMeta)>) {
        let _ = self.tx.send(PreviewCommand::SetListing(items));
    }

    pub fn items_added(&self, items: Vec<(ItemId, ItemMeta)>) {
        let _ = self.tx.send(PreviewCommand::ItemsAdded(items));
    }

    pub fn items_removed(&self, ids: Vec<ItemId>) {
        let _ = self.tx.send(PreviewCommand::ItemsRemoved(ids));
    }

    pub fn update_previews(&self) {
        let _ = self.tx.send(PreviewCommand::Refresh);
    }

    pub fn viewport_changed(&self, visible: Rect) {
        let _ = self.tx.send(PreviewCommand::ViewportChanged(visible));
    }

    pub fn clipboard_changed(&self) {
        let _ = self.tx.send(PreviewCommand::ClipboardChanged);
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(PreviewCommand::Shutdown);
    }
}

pub struct PreviewCoordinator {
    config: PreviewConfig,
    /// Current listing in model order.
    listing: IndexMap<ItemId, ItemMeta>,
    queue: PreviewRequestQueue,
    jobs: JobLifecycleManager,
    scroll: ScrollPauseController,
    cut: CutItemTracker,
    geometry: Arc<dyn ItemGeometry + Send + Sync>,
    visible_rect: Rect,
    previews_enabled: bool,
    update_tx: mpsc::UnboundedSender<PreviewUpdate>,
    command_rx: mpsc::UnboundedReceiver<PreviewCommand>,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl PreviewCoordinator {
    /// Wire up a coordinator. Returns the coordinator (drive it with
    /// [`run`](Self::run)), the command handle for the view, and the
    /// delivery channel.
    pub fn new(
        config: PreviewConfig,
        engine: Arc<dyn PreviewJobEngine>,
        geometry: Arc<dyn ItemGeometry + Send + Sync>,
        clipboard: Arc<dyn ClipboardSource>,
    ) -> (
        Self,
        PreviewHandle,
        mpsc::UnboundedReceiver<PreviewUpdate>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();

        let jobs = JobLifecycleManager::new(engine, engine_tx, &config.jobs);
        let scroll = ScrollPauseController::new(&config.scroll);
        let cut = CutItemTracker::new(clipboard, &config.cut_cache);
        let previews_enabled = config.show_previews;

        let coordinator = Self {
            config,
            listing: IndexMap::new(),
            queue: PreviewRequestQueue::new(),
            jobs,
            scroll,
            cut,
            geometry,
            visible_rect: Rect::default(),
            previews_enabled,
            update_tx,
            command_rx,
            engine_rx,
        };

        (coordinator, PreviewHandle { tx: command_tx }, update_rx)
    }

    /// Drive the coordinator until shutdown or until the view drops its
    /// channels.
    pub async fn run(mut self) -> Result<(), PreviewError> {
        info!("preview coordinator started");
        let mut dispatch = tokio::time::interval(self.config.dispatch.interval);
        dispatch.set_missed_tick_behavior(MissedTickBehavior::Delay);

        enum LoopEvent {
            Command(Option<PreviewCommand>),
            Engine(Option<EngineEvent>),
            DispatchTick,
            ScrollDeadline,
        }

        loop {
            let scroll_deadline = self.scroll.next_deadline();

            let event: LoopEvent = tokio::select! {
                cmd = self.command_rx.recv() => LoopEvent::Command(cmd),
                ev = self.engine_rx.recv() => LoopEvent::Engine(ev),
                _ = dispatch.tick() => LoopEvent::DispatchTick,
                _ = sleep_until_opt(scroll_deadline) => LoopEvent::ScrollDeadline,
            };

            match event {
                LoopEvent::Command(None) => {
                    debug!("command channel closed, shutting down");
                    self.jobs.cancel_all();
                    return Ok(());
                }
                LoopEvent::Command(Some(cmd)) => {
                    if !self.handle_command(cmd, Instant::now()) {
                        info!("preview coordinator shut down");
                        return Ok(());
                    }
                }
                LoopEvent::Engine(Some(ev)) => self.handle_engine_event(ev).await,
                // The lifecycle manager holds a sender, so the engine channel
                // cannot close while we are running.
                LoopEvent::Engine(None) => {}
                LoopEvent::DispatchTick => self.flush_ready().await?,
                LoopEvent::ScrollDeadline => self.poll_scroll(Instant::now()),
            }
        }
    }

    /// Process one command. Returns false on shutdown.
    fn handle_command(&mut self, cmd: PreviewCommand, now: Instant) -> bool {
        match cmd {
            PreviewCommand::SetPreviewsEnabled(enabled) => {
                if enabled == self.previews_enabled {
                    return true;
                }
                self.previews_enabled = enabled;
                if enabled {
                    info!("previews enabled, re-evaluating listing");
                    self.refresh_previews();
                } else {
                    info!("previews disabled, cancelling all outstanding work");
                    self.jobs.cancel_all();
                    self.queue.invalidate_all();
                }
            }
            PreviewCommand::SetListing(items) => {
                debug!(items = items.len(), "listing replaced");
                self.listing = items.into_iter().collect();
                self.refresh_previews();
            }
            PreviewCommand::ItemsAdded(items) => {
                let requests: Vec<PreviewRequest> = items
                    .iter()
                    .map(|(id, meta)| PreviewRequest::new(id.clone(), meta.clone()))
                    .collect();
                self.listing.extend(items);
                if self.previews_enabled {
                    self.queue.enqueue(requests);
                    self.prioritize_visible();
                    self.submit_if_active();
                }
            }
            PreviewCommand::ItemsRemoved(ids) => {
                for id in &ids {
                    self.listing.shift_remove(id);
                }
                self.queue.remove(&ids);
            }
            PreviewCommand::Refresh => self.refresh_previews(),
            PreviewCommand::ViewportChanged(visible) => {
                self.visible_rect = visible;
                self.scroll.on_scroll(now);
            }
            PreviewCommand::ClipboardChanged => {
                if let Some(changed) = self.cut.refresh() {
                    let affected: Vec<ItemId> = changed
                        .into_iter()
                        .filter(|id| self.listing.contains_key(id))
                        .collect();
                    if !affected.is_empty() {
                        let _ = self.update_tx.send(PreviewUpdate::CutStateChanged(affected));
                    }
                }
            }
            PreviewCommand::Shutdown => {
                self.jobs.cancel_all();
                return false;
            }
        }
        true
    }

    /// Full re-evaluation: cancel everything, requeue the listing, promote
    /// the visible subset, submit.
    fn refresh_previews(&mut self) {
        self.jobs.cancel_all();
        self.queue.invalidate_all();
        if !self.previews_enabled {
            return;
        }

        let requests: Vec<PreviewRequest> = self
            .listing
            .iter()
            .map(|(id, meta)| PreviewRequest::new(id.clone(), meta.clone()))
            .collect();
        self.queue.enqueue(requests);
        self.prioritize_visible();
        self.submit_if_active();
    }

    /// Promote on-screen identifiers to the front of pending.
    fn prioritize_visible(&mut self) {
        let all: Vec<ItemId> = self.listing.keys().cloned().collect();
        let (visible, _rest) = partition(&all, self.visible_rect, self.geometry.as_ref());
        self.queue.promote(&visible);
    }

    /// Start jobs unless previews are off or the viewport is in motion.
    fn submit_if_active(&mut self) {
        if self.previews_enabled && !self.scroll.submission_suspended() {
            self.jobs.submit_pending(&mut self.queue);
        }
    }

    /// Route one engine event. Stale and cancel-raced deliveries are
    /// discarded here; everything else is post-processed and buffered.
    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Preview { job_id, id, bitmap } => {
                if !self.previews_enabled || !self.jobs.is_active(job_id) {
                    trace!(%id, job_id, "discarding preview from stale job");
                    return;
                }
                if !self.queue.mark_done(&id) {
                    trace!(%id, job_id, "discarding preview for undispatched item");
                    return;
                }
                if !self.listing.contains_key(&id) {
                    trace!(%id, "discarding preview for item no longer listed");
                    return;
                }

                let processed: Bitmap = add_frame(&clamp_to_max(
                    &bitmap,
                    (self.config.max_width, self.config.max_height),
                ));
                // The underlying bitmap changed; a cached dimmed icon for it
                // is out of date.
                self.cut.invalidate(&id).await;
                self.queue.push_ready(ReadyPreview { id, bitmap: processed });
            }
            EngineEvent::Failed { job_id, id } => {
                // Expected and non-fatal; the item keeps its default icon.
                debug!(%id, job_id, "preview generation failed, keeping default icon");
                self.queue.mark_done(&id);
            }
            EngineEvent::Finished { job_id } => {
                self.jobs.reap(job_id);
                self.submit_if_active();
            }
        }
    }

    /// Flush a bounded batch of ready previews to the view, applying the cut
    /// effect to items currently marked cut.
    async fn flush_ready(&mut self) -> Result<(), PreviewError> {
        let batch = self.queue.drain_ready(self.config.dispatch.batch_len);
        if batch.is_empty() {
            return Ok(());
        }

        let mut delivered: Vec<(ItemId, Bitmap)> = Vec::with_capacity(batch.len());
        for ready in batch {
            let bitmap: Bitmap = if self.cut.is_cut(&ready.id) {
                self.cut.dimmed(&ready.id, &ready.bitmap).await
            } else {
                ready.bitmap
            };
            delivered.push((ready.id, bitmap));
        }

        trace!(previews = delivered.len(), "dispatching preview batch");
        self.update_tx
            .send(PreviewUpdate::Previews(delivered))
            .map_err(|e| PreviewError::DeliveryClosed(e.to_string()))
    }

    /// Advance the scroll state machine; on resume, re-prioritize and submit.
    fn poll_scroll(&mut self, now: Instant) {
        if let Some(ScrollTransition::ResumedActive) = self.scroll.poll(now) {
            self.prioritize_visible();
            self.submit_if_active();
        }
    }
}

/// Sleep until the deadline, or forever when there is none. Keeps the
/// select! arm alive without a conditional guard.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
