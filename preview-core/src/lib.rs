//! lib.rs — Asynchronous Preview Coordinator
//! -----------------------------------------
//! Schedules background preview/thumbnail generation for a directory listing
//! view: prioritizes on-screen items, pauses submission during rapid
//! scrolling, applies presentation effects (cut-item dimming, framing, size
//! clamping), and delivers results in bounded batches without blocking the
//! view. Only re-export what you want public in the library crate root.

/// --- Error handling (unified error type for the coordinator) ---
pub mod error;

/// --- Configuration: toggle, clamp size, intervals, concurrency ---
pub mod config;

/// --- Controller: coordinator event loop and scroll debounce ---
pub mod controller {
    pub mod coordinator;
    pub mod scroll_pause;
}

/// --- Item model: identifiers, requests, ready previews ---
pub mod model {
    pub mod item;
}

/// --- Bitmaps and pure post-processing transforms ---
pub mod image {
    pub mod bitmap;
    pub mod post_process;
}

/// --- Pending/dispatched/ready queue ---
pub mod queue {
    pub mod request_queue;
}

/// --- View geometry and visibility prioritization ---
pub mod view {
    pub mod visibility;
}

/// --- Job engine boundary and lifecycle management ---
pub mod jobs {
    pub mod engine;
    pub mod lifecycle;
}

/// --- Clipboard collaborator and cut-item tracking ---
pub mod clipboard {
    pub mod cut_tracker;
}

pub mod logging;

/// --- Crate-level re-exports for the most important types ---
pub use config::PreviewConfig;
pub use controller::coordinator::{
    PreviewCommand, PreviewCoordinator, PreviewHandle, PreviewUpdate,
};
pub use error::PreviewError;
pub use image::bitmap::Bitmap;
pub use model::item::{ItemId, ItemMeta, PreviewRequest};
pub use view::visibility::{ItemGeometry, Rect};
