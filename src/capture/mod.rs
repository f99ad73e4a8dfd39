//! Screenshot capture for shotwire.
//!
//! This module provides:
//! - The capture request model and region parsing
//! - Screen layout discovery
//! - Image acquisition (grim/slurp, xdg-desktop-portal fallback)
//! - Post-capture tasks (saving, clipboard, stdout)
//! - The [`CaptureEngine`] boundary used by the orchestrator

pub mod clipboard;
pub mod engine;
pub mod file;
pub mod portal;
pub mod region;
pub mod request;
pub mod screens;
pub mod state;
pub mod types;

mod dependencies;
mod pipeline;
mod sources;

pub use dependencies::{
    CaptureClipboard, CaptureDependencies, CaptureFileSaver, CaptureOutput, CaptureSource,
};
pub use engine::{CaptureEngine, PortalEngine};
pub use region::Region;
pub use request::{
    CaptureMode, CaptureRequest, CaptureRequestBuilder, CaptureTask, ScreenTarget, next_request_id,
};
pub use sources::{CaptureTarget, CapturedImage};
pub use types::{CaptureError, CaptureEvent, CaptureResult};
