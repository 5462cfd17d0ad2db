//! Docs Readtime - Reading-time estimation and timer engine for documentation pages
//!
//! Readtime turns a page's content region (or a precomputed value) into an
//! estimated reading time, and drives a per-document reading session: a
//! start/stop/reset timer ticking once per second, live progress, and the
//! state behind an on-page overlay.
//!
//! ## Modules
//!
//! - **Estimation**: content sources, word counting, minutes at a configurable rate
//! - **Timing**: timer state machine over a pluggable tick source
//! - **Session**: one coordinator per document, with observers and overlay bindings

pub mod config;
pub mod content;
pub mod error;
pub mod estimator;
pub mod overlay;
pub mod progress;
pub mod session;
pub mod ticker;
pub mod timer;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ReadingConfig;
pub use content::{ContentFn, ContentSource, HtmlDocument, StaticText};
pub use error::ReadingError;
pub use estimator::{Estimate, EstimateInput, EstimateOrigin, Estimator};
pub use overlay::{
    FloatingCard, OverlayBinding, OverlayModel, OverlayRenderer, OverlayVariant, StickyBar,
};
pub use progress::{format_clock, ProgressCalculator};
pub use session::{SessionCoordinator, SessionHandle, SessionHost, SubscriptionId};
pub use ticker::{IntervalTicker, ManualClock};
pub use timer::{TickSource, TimerController};
pub use types::{
    OverlayIntent, ProgressView, ReadingSession, SessionSnapshot, SessionUpdate, TimerState,
};

/// Library version
pub const READTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "docs-readtime";
