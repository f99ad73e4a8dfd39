//! Clipboard integration for captured images.

use std::io::Write;
use std::process::{Command, Stdio};

use wl_clipboard_rs::copy::{MimeType, Options, ServeRequests, Source};

use super::types::CaptureError;

const PNG_MIME: &str = "image/png";

/// Copy PNG bytes to the Wayland clipboard.
///
/// `wl-copy` is tried first because it keeps serving the selection after this
/// process exits; the in-process wl-clipboard-rs server is the fallback.
pub fn copy_to_clipboard(image_data: &[u8]) -> Result<(), CaptureError> {
    log::debug!("Copying {} bytes to clipboard", image_data.len());

    let command_err = match copy_via_command(image_data) {
        Ok(()) => {
            log::info!("Copied capture to clipboard via wl-copy");
            return Ok(());
        }
        Err(err) => err,
    };

    log::warn!("wl-copy unavailable ({command_err}); falling back to wl-clipboard-rs");
    copy_via_library(image_data)
        .map(|()| log::info!("Copied capture to clipboard via wl-clipboard-rs"))
        .map_err(|lib_err| {
            CaptureError::ClipboardError(format!(
                "wl-copy failed: {command_err}; wl-clipboard-rs failed: {lib_err}"
            ))
        })
}

fn copy_via_library(image_data: &[u8]) -> Result<(), CaptureError> {
    let mut opts = Options::new();
    opts.serve_requests(ServeRequests::Only(1));
    opts.copy(
        Source::Bytes(image_data.into()),
        MimeType::Specific(PNG_MIME.to_string()),
    )
    .map_err(|e| CaptureError::ClipboardError(format!("wl-clipboard-rs error: {e}")))
}

fn copy_via_command(image_data: &[u8]) -> Result<(), CaptureError> {
    let clipboard_err = |what: &str, e: std::io::Error| {
        CaptureError::ClipboardError(format!("{what}: {e}"))
    };

    let mut child = Command::new("wl-copy")
        .args(["--type", PNG_MIME])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| clipboard_err("Failed to spawn wl-copy", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(image_data)
            .map_err(|e| clipboard_err("Failed to write to wl-copy", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| clipboard_err("Failed to wait for wl-copy", e))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(CaptureError::ClipboardError(format!(
            "wl-copy exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}
