//! Data types for screenshot capture functionality.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::util::Rect;

/// Result of a completed capture and its post-capture tasks.
#[derive(Clone, Default)]
pub struct CaptureResult {
    /// Raw image data (PNG format).
    pub image_data: Vec<u8>,
    /// Area of the desktop the image covers, when known.
    pub selection: Option<Rect>,
    /// Path where the image was saved (if saved).
    pub saved_path: Option<PathBuf>,
    /// Whether the image was copied to clipboard.
    pub copied_to_clipboard: bool,
}

impl fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureResult")
            .field("image_bytes", &self.image_data.len())
            .field("selection", &self.selection.map(|r| r.to_string()))
            .field("saved_path", &self.saved_path)
            .field("copied_to_clipboard", &self.copied_to_clipboard)
            .finish()
    }
}

/// Terminal event emitted by a capture engine for one request.
///
/// Exactly one of these is delivered per submitted request, after every
/// post-capture task for that request has been attempted.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    Taken { id: u32, result: CaptureResult },
    Failed { id: u32, reason: String },
}

impl CaptureEvent {
    pub fn id(&self) -> u32 {
        match self {
            CaptureEvent::Taken { id, .. } | CaptureEvent::Failed { id, .. } => *id,
        }
    }
}

/// Errors that can occur during screenshot capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screenshot permission denied by user")]
    PermissionDenied,

    #[error("D-Bus communication error: {0}")]
    DBusError(#[from] zbus::Error),

    #[error("Failed to save screenshot: {0}")]
    SaveError(#[from] std::io::Error),

    #[error("Clipboard operation failed: {0}")]
    ClipboardError(String),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("Portal returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("Screen {0} is not connected")]
    UnknownScreen(u32),

    #[error("Capture cancelled: {0}")]
    Cancelled(String),
}
