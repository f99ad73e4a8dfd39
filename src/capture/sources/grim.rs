//! wlroots fast path: `slurp` for selection, `grim` for pixels.

use std::process::{Command, Stdio};

use tokio::task;

use crate::capture::types::CaptureError;
use crate::util::Rect;

/// What `grim` should grab.
#[derive(Debug, Clone)]
pub enum GrimTarget {
    Everything,
    Geometry(Rect),
    Output(String),
}

/// Capture with `grim`, writing PNG to stdout.
pub async fn capture_with_grim(target: GrimTarget) -> Result<Vec<u8>, CaptureError> {
    task::spawn_blocking(move || run_grim(&target))
        .await
        .map_err(|e| CaptureError::ImageError(format!("grim task failed to join: {}", e)))?
}

/// Let the user drag out a region with `slurp` and return it.
pub async fn select_with_slurp() -> Result<Rect, CaptureError> {
    task::spawn_blocking(run_slurp)
        .await
        .map_err(|e| CaptureError::ImageError(format!("slurp task failed to join: {}", e)))?
}

fn run_grim(target: &GrimTarget) -> Result<Vec<u8>, CaptureError> {
    let mut command = Command::new("grim");
    match target {
        GrimTarget::Everything => {}
        GrimTarget::Geometry(rect) => {
            command.args(["-g", &rect.to_grim_geometry()]);
        }
        GrimTarget::Output(name) => {
            command.args(["-o", name]);
        }
    }
    log::debug!("Capturing via grim: {:?}", target);

    let output = command
        .arg("-")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CaptureError::ImageError(format!("Failed to run grim: {}", e)))?;

    if !output.status.success() {
        return Err(CaptureError::ImageError(format!(
            "grim failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    if output.stdout.is_empty() {
        return Err(CaptureError::ImageError(
            "grim returned empty screenshot".into(),
        ));
    }
    Ok(output.stdout)
}

fn run_slurp() -> Result<Rect, CaptureError> {
    let output = Command::new("slurp")
        .args(["-f", "%x %y %w %h"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CaptureError::ImageError(format!("Failed to run slurp: {}", e)))?;

    // slurp exits non-zero when the user presses Escape.
    if !output.status.success() {
        return Err(CaptureError::Cancelled(format!(
            "selection aborted: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let text = String::from_utf8(output.stdout)
        .map_err(|e| CaptureError::InvalidResponse(format!("Invalid slurp output: {}", e)))?;
    parse_slurp_geometry(&text)
}

fn parse_slurp_geometry(text: &str) -> Result<Rect, CaptureError> {
    let values: Vec<i32> = text
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| CaptureError::InvalidResponse(format!("Invalid slurp geometry '{}'", text.trim())))?;

    match values.as_slice() {
        [x, y, w, h] => Rect::new(*x, *y, *w, *h).ok_or_else(|| {
            CaptureError::InvalidResponse("slurp returned an empty selection".into())
        }),
        _ => Err(CaptureError::InvalidResponse(format!(
            "Invalid slurp geometry '{}'",
            text.trim()
        ))),
    }
}
