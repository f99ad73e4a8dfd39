use std::path::Path;
use std::{fs, thread, time::Duration};

use crate::capture::types::CaptureError;

/// Some portals hand back the URI before the file is fully flushed.
const READ_ATTEMPTS: usize = 60;
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Read a portal screenshot from its `file://` URI and delete the temporary file.
pub fn read_image_from_uri(uri: &str) -> Result<Vec<u8>, CaptureError> {
    let path = url::Url::parse(uri)
        .map_err(|e| CaptureError::InvalidResponse(format!("Invalid file URI '{}': {}", uri, e)))?
        .to_file_path()
        .map_err(|_| CaptureError::InvalidResponse(format!("Cannot convert URI to path: {}", uri)))?;

    let data = read_when_ready(&path)?;

    match fs::remove_file(&path) {
        Ok(()) => log::debug!("Removed portal temp file: {}", path.display()),
        Err(e) => log::warn!(
            "Failed to remove portal temp file {}: {}",
            path.display(),
            e
        ),
    }

    Ok(data)
}

fn read_when_ready(path: &Path) -> Result<Vec<u8>, CaptureError> {
    for attempt in 1..=READ_ATTEMPTS {
        match fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => return Ok(bytes),
            Ok(_) => log::trace!("{} still empty (attempt {attempt})", path.display()),
            Err(e) => log::trace!("{} not readable yet (attempt {attempt}): {e}", path.display()),
        }
        thread::sleep(READ_RETRY_DELAY);
    }

    Err(CaptureError::ImageError(format!(
        "Portal screenshot file {} not ready after {} attempts",
        path.display(),
        READ_ATTEMPTS
    )))
}
