//! ``src/controller/scroll_pause.rs``
//! ============================================================================
//! # Scroll Pause Controller
//!
//! Debounces rapid viewport movement so previews are not generated for items
//! that are only transiently visible during a fast scroll. While the view is
//! Moving or Settling, new job submission is suspended; jobs already in
//! flight keep delivering and their results keep flowing to the view.
//!
//! Time is injected through `Instant` parameters, so state transitions are
//! testable without sleeping.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::ScrollConfig;

/// Viewport movement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    /// No recent movement; submission runs normally.
    Active,
    /// Scroll events are arriving; the quiet timer restarts on each one.
    Moving,
    /// Quiet interval elapsed; waiting out the settle interval.
    Settling,
}

/// Observable transitions reported by [`ScrollPauseController::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTransition {
    /// Moving → Settling: no scroll event for the quiet interval.
    StartedSettling,
    /// Settling → Active: settle interval elapsed; the caller re-runs
    /// visibility prioritization and resumes submission.
    ResumedActive,
}

#[derive(Debug)]
pub struct ScrollPauseController {
    state: ScrollState,
    quiet_interval: Duration,
    settle_interval: Duration,
    last_scroll: Option<Instant>,
    settling_since: Option<Instant>,
}

impl ScrollPauseController {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            state: ScrollState::Active,
            quiet_interval: config.quiet_interval,
            settle_interval: config.settle_interval,
            last_scroll: None,
            settling_since: None,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// True while in Moving or Settling: pending requests stay frozen.
    pub fn submission_suspended(&self) -> bool {
        self.state != ScrollState::Active
    }

    /// Record a scroll-position change. Any state enters (or stays in)
    /// Moving and the quiet timer restarts.
    pub fn on_scroll(&mut self, now: Instant) {
        if self.state != ScrollState::Moving {
            trace!(from = ?self.state, "viewport moving, pausing job submission");
        }
        self.state = ScrollState::Moving;
        self.last_scroll = Some(now);
        self.settling_since = None;
    }

    /// Advance the state machine. Call when the deadline from
    /// [`next_deadline`](Self::next_deadline) fires.
    pub fn poll(&mut self, now: Instant) -> Option<ScrollTransition> {
        match self.state {
            ScrollState::Moving => {
                let last = self.last_scroll?;
                if now.duration_since(last) >= self.quiet_interval {
                    self.state = ScrollState::Settling;
                    self.settling_since = Some(now);
                    trace!("viewport quiet, settling");
                    return Some(ScrollTransition::StartedSettling);
                }
                None
            }
            ScrollState::Settling => {
                let since = self.settling_since?;
                if now.duration_since(since) >= self.settle_interval {
                    self.state = ScrollState::Active;
                    self.last_scroll = None;
                    self.settling_since = None;
                    trace!("viewport settled, resuming job submission");
                    return Some(ScrollTransition::ResumedActive);
                }
                None
            }
            ScrollState::Active => None,
        }
    }

    /// Next instant at which [`poll`](Self::poll) can transition, for the
    /// event loop's timer arm. `None` while Active.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            ScrollState::Active => None,
            ScrollState::Moving => self.last_scroll.map(|t| t + self.quiet_interval),
            ScrollState::Settling => self.settling_since.map(|t| t + self.settle_interval),
        }
    }
}
