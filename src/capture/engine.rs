//! The capture engine boundary.
//!
//! An engine accepts requests and later reports exactly one [`CaptureEvent`]
//! per request through the event loop. It owns every post-capture side effect;
//! callers only observe the terminal event.

use std::sync::Arc;

use crate::capture::{
    dependencies::CaptureDependencies,
    file::FileSaveConfig,
    pipeline::perform_capture,
    request::{CaptureMode, CaptureRequest},
    sources::CaptureTarget,
    state::LastRegionStore,
    types::{CaptureError, CaptureEvent},
};
use crate::event_loop::EventSender;
use crate::notification::Notifier;

pub trait CaptureEngine: Send + Sync {
    /// Start a capture. Must not block; the outcome arrives as a [`CaptureEvent`].
    fn request_capture(&self, request: CaptureRequest, events: EventSender);

    /// Open the interactive chooser. Reported like a capture with the given id.
    fn open_launcher(&self, id: u32, events: EventSender);

    /// True while the engine keeps a window (e.g. a pinned image) alive after a capture.
    fn has_external_widget(&self) -> bool {
        false
    }
}

/// Headless engine backed by grim/slurp with an xdg-desktop-portal fallback.
pub struct PortalEngine {
    runtime: tokio::runtime::Handle,
    dependencies: Arc<CaptureDependencies>,
    save_config: FileSaveConfig,
    last_region: LastRegionStore,
    notifier: Arc<dyn Notifier>,
    notify_saves: bool,
}

impl PortalEngine {
    pub fn new(
        runtime: tokio::runtime::Handle,
        dependencies: CaptureDependencies,
        save_config: FileSaveConfig,
        last_region: LastRegionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            runtime,
            dependencies: Arc::new(dependencies),
            save_config,
            last_region,
            notifier,
            notify_saves: true,
        }
    }

    /// Toggle the "Capture saved as" desktop notification.
    pub fn notify_saves(mut self, enabled: bool) -> Self {
        self.notify_saves = enabled;
        self
    }

    fn spawn(&self, request: CaptureRequest, target: CaptureTarget, events: EventSender) {
        let dependencies = Arc::clone(&self.dependencies);
        let save_config = self.save_config.clone();
        let last_region = self.last_region.clone();
        let notifier = Arc::clone(&self.notifier);
        let notify_saves = self.notify_saves;
        let id = request.id();

        self.runtime.spawn(async move {
            let event = match perform_capture(request, target, dependencies, save_config).await {
                Ok(result) => {
                    log::info!("Capture {} successful: {:?}", id, result.saved_path);
                    if let Some(rect) = result.selection
                        && let Err(e) = last_region.store(rect)
                    {
                        log::warn!("Failed to remember capture region: {:#}", e);
                    }
                    if notify_saves && let Some(path) = &result.saved_path {
                        notifier.notify(
                            "Screenshot saved",
                            &format!("Capture saved as {}", path.display()),
                        );
                    }
                    CaptureEvent::Taken { id, result }
                }
                Err(CaptureError::Cancelled(reason)) => {
                    log::info!("Capture {} cancelled: {}", id, reason);
                    CaptureEvent::Failed { id, reason }
                }
                Err(e) => {
                    log::error!("Capture {} failed: {}", id, e);
                    CaptureEvent::Failed {
                        id,
                        reason: e.to_string(),
                    }
                }
            };
            events.capture_event(event);
        });
    }
}

impl CaptureEngine for PortalEngine {
    fn request_capture(&self, request: CaptureRequest, events: EventSender) {
        log::debug!("Processing capture request: {:?}", request);
        let target = CaptureTarget::for_request(&request);
        self.spawn(request, target, events);
    }

    fn open_launcher(&self, id: u32, events: EventSender) {
        let request = CaptureRequest::builder(CaptureMode::Graphical)
            .id(id)
            .save_to(None)
            .build();
        self.spawn(request, CaptureTarget::Chooser, events);
    }
}
