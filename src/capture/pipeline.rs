use std::{path::PathBuf, sync::Arc};

use tokio::task;

use crate::capture::{
    dependencies::{CaptureClipboard, CaptureDependencies, CaptureFileSaver},
    file::FileSaveConfig,
    request::{CaptureMode, CaptureRequest, CaptureTask},
    sources::CaptureTarget,
    types::{CaptureError, CaptureResult},
};

/// Wait out the request delay, grab the image, then run each task in request order.
///
/// A failed save fails the whole request; every other task failure is logged and
/// the capture is still reported as taken.
pub(crate) async fn perform_capture(
    request: CaptureRequest,
    target: CaptureTarget,
    dependencies: Arc<CaptureDependencies>,
    save_config: FileSaveConfig,
) -> Result<CaptureResult, CaptureError> {
    log::info!("Starting capture {}: {:?}", request.id(), request.mode());

    if !request.delay().is_zero() {
        log::debug!("Delaying capture by {} ms", request.delay().as_millis());
        tokio::time::sleep(request.delay()).await;
    }

    let image = match dependencies.source.capture(target).await {
        Ok(image) => image,
        Err(CaptureError::Cancelled(reason)) => {
            log::info!("Capture cancelled: {}", reason);
            return Err(CaptureError::Cancelled(reason));
        }
        Err(err) => return Err(err),
    };

    log::info!("Obtained screenshot data ({} bytes)", image.data.len());

    let mut result = CaptureResult {
        image_data: image.data,
        selection: image.selection,
        saved_path: None,
        copied_to_clipboard: false,
    };

    // Interactive captures without any requested output fall back to the
    // chooser's own action: save to the configured location.
    let fallback_save = [CaptureTask::Save(None)];
    let tasks = if request.mode() == CaptureMode::Graphical && request.tasks().is_empty() {
        &fallback_save[..]
    } else {
        request.tasks()
    };

    let prints_raw = request.has_task(&CaptureTask::PrintRaw);
    for task in tasks {
        match task {
            CaptureTask::Save(target) => {
                let path = save_image(
                    Arc::clone(&dependencies.saver),
                    result.image_data.clone(),
                    target.clone(),
                    save_config.clone(),
                )
                .await?;
                log::info!("Saved screenshot to {}", path.display());
                result.saved_path = Some(path);
            }
            CaptureTask::Copy => {
                log::info!(
                    "Attempting to copy {} bytes to clipboard",
                    result.image_data.len()
                );
                result.copied_to_clipboard = copy_to_clipboard(
                    Arc::clone(&dependencies.clipboard),
                    result.image_data.clone(),
                )
                .await;
            }
            CaptureTask::PrintRaw => {
                if let Err(e) = dependencies.output.write_raw(&result.image_data) {
                    log::error!("Failed to write image to stdout: {}", e);
                }
            }
            CaptureTask::PrintGeometry => {
                // Raw bytes and a geometry line cannot share stdout.
                if prints_raw {
                    continue;
                }
                match result.selection {
                    Some(geometry) => {
                        if let Err(e) = dependencies.output.write_geometry(geometry) {
                            log::error!("Failed to print capture geometry: {}", e);
                        }
                    }
                    None => log::warn!("Capture geometry unknown; nothing to print"),
                }
            }
            CaptureTask::Pin => log::warn!("Pinning captures is not supported; skipping"),
            CaptureTask::Upload => log::warn!("Uploading captures is not supported; skipping"),
            CaptureTask::AcceptOnSelect => {}
        }
    }

    Ok(result)
}

async fn save_image(
    saver: Arc<dyn CaptureFileSaver>,
    image_data: Vec<u8>,
    target: Option<PathBuf>,
    config: FileSaveConfig,
) -> Result<PathBuf, CaptureError> {
    task::spawn_blocking(move || saver.save(&image_data, target.as_deref(), &config))
        .await
        .map_err(|e| CaptureError::ImageError(format!("Save task failed: {}", e)))?
}

async fn copy_to_clipboard(clipboard: Arc<dyn CaptureClipboard>, image_data: Vec<u8>) -> bool {
    match task::spawn_blocking(move || clipboard.copy(&image_data))
        .await
        .map_err(|e| CaptureError::ClipboardError(format!("Clipboard task failed: {}", e)))
    {
        Ok(Ok(())) => {
            log::info!("Successfully copied to clipboard");
            true
        }
        Ok(Err(e)) | Err(e) => {
            log::error!("Failed to copy to clipboard: {}", e);
            false
        }
    }
}
