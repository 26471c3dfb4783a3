//! Liveterm Core - Live terminal rendering engine
//!
//! This crate provides:
//! - Text transitions between frames (identity, slide, wipe)
//! - Animator: fixed-rate redraw of a current frame
//! - LiveChart: producer-driven refresh on top of an Animator
//! - ProgressBar and Spinner: self-contained in-place widgets
//! - Output sink and viewport collaborators
//! - Error and configuration types
//!
//! Every background loop runs as its own tokio task with an explicit
//! `Idle -> Running -> Stopped` lifecycle. `stop()` signals the loop and
//! returns without waiting for it to exit.

pub mod animator;
pub mod config;
pub mod error;
pub mod frame;
pub mod lifecycle;
pub mod live_chart;
pub mod progress;
pub mod sink;
pub mod spinner;
pub mod transition;
pub mod viewport;

// Re-export common types
pub use animator::Animator;
pub use config::AnimationConfig;
pub use error::{RenderError, Result};
pub use frame::Frame;
pub use lifecycle::Lifecycle;
pub use live_chart::{LiveChart, Producer};
pub use progress::ProgressBar;
pub use sink::{MemorySink, OutputSink, StdoutSink};
pub use spinner::Spinner;
pub use transition::TransitionKind;
pub use viewport::{FixedProbe, TerminalProbe, Viewport, ViewportProbe};
