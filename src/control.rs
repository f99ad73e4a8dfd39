//! D-Bus control interface of the long-lived instance.
//!
//! Exposes `org.shotwire.Shotwire` at `/` on the session bus. Every capture
//! method turns into a [`LoopEvent::Submit`] for the orchestrator, exactly as
//! the CLI path does; outcomes are broadcast as `CaptureTaken` /
//! `CaptureFailed` signals carrying the caller's request id.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;
use zbus::{Connection, interface, object_server::SignalContext};

use crate::capture::{CaptureEvent, CaptureMode, CaptureRequest, CaptureTask, ScreenTarget};
use crate::config::autostart;
use crate::event_loop::{EventSender, LoopEvent};

pub const BUS_NAME: &str = "org.shotwire.Shotwire";
pub const OBJECT_PATH: &str = "/";

const REGISTER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("Timed out connecting to the session bus")]
    Timeout,
}

pub struct ControlInterface {
    events: EventSender,
    tray_icon_enabled: bool,
}

impl ControlInterface {
    pub fn new(events: EventSender, tray_icon_enabled: bool) -> Self {
        Self {
            events,
            tray_icon_enabled,
        }
    }

    fn submit(&self, request: CaptureRequest) {
        debug!("Control interface request: {:?}", request);
        self.events.send(LoopEvent::Submit(request));
    }
}

#[interface(name = "org.shotwire.Shotwire")]
impl ControlInterface {
    /// Interactive capture. An empty `path` saves to the configured location.
    async fn graphic_capture(&self, path: String, delay: i32, id: u32) {
        self.submit(graphic_request(&path, delay, id));
    }

    async fn full_screen(&self, path: String, to_clipboard: bool, delay: i32, id: u32) {
        self.submit(output_request(
            CaptureMode::FullScreen,
            &path,
            to_clipboard,
            delay,
            id,
        ));
    }

    /// `number` < 0 captures the screen under the cursor.
    async fn capture_screen(
        &self,
        number: i32,
        path: String,
        to_clipboard: bool,
        delay: i32,
        id: u32,
    ) {
        let mode = CaptureMode::Screen(ScreenTarget::from_number(number));
        self.submit(output_request(mode, &path, to_clipboard, delay, id));
    }

    async fn open_launcher(&self) {
        let id = crate::capture::next_request_id();
        self.events.send(LoopEvent::OpenLauncher { id });
    }

    async fn open_config(&self) {
        self.events.send(LoopEvent::OpenConfig);
    }

    #[zbus(property)]
    async fn tray_icon_enabled(&self) -> bool {
        self.tray_icon_enabled
    }

    #[zbus(property)]
    async fn autostart_enabled(&self) -> bool {
        autostart::is_enabled()
    }

    #[zbus(signal)]
    async fn capture_taken(
        ctxt: &SignalContext<'_>,
        id: u32,
        path: &str,
        geometry: &str,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn capture_failed(ctxt: &SignalContext<'_>, id: u32) -> zbus::Result<()>;
}

fn delay_ms(delay: i32) -> u64 {
    u64::try_from(delay).unwrap_or(0)
}

fn non_empty_path(path: &str) -> Option<PathBuf> {
    (!path.is_empty()).then(|| PathBuf::from(path))
}

fn graphic_request(path: &str, delay: i32, id: u32) -> CaptureRequest {
    CaptureRequest::builder(CaptureMode::Graphical)
        .id(id)
        .delay_ms(delay_ms(delay))
        .save_to(non_empty_path(path))
        .build()
}

fn output_request(
    mode: CaptureMode,
    path: &str,
    to_clipboard: bool,
    delay: i32,
    id: u32,
) -> CaptureRequest {
    let mut builder = CaptureRequest::builder(mode).id(id).delay_ms(delay_ms(delay));
    if to_clipboard {
        builder = builder.task(CaptureTask::Copy);
    }
    let path = non_empty_path(path);
    if path.is_some() || !to_clipboard {
        builder = builder.save_to(path);
    }
    builder.build()
}

/// A registered control interface; used to broadcast capture outcomes.
pub struct ControlHandle {
    connection: Connection,
    runtime: tokio::runtime::Handle,
}

impl ControlHandle {
    pub fn emit(&self, event: &CaptureEvent) {
        let connection = self.connection.clone();
        let event = event.clone();
        self.runtime.spawn(async move {
            if let Err(e) = emit_signal(&connection, &event).await {
                warn!("Failed to emit capture signal for {}: {}", event.id(), e);
            }
        });
    }
}

async fn emit_signal(connection: &Connection, event: &CaptureEvent) -> zbus::Result<()> {
    let ctxt = SignalContext::new(connection, OBJECT_PATH)?;
    match event {
        CaptureEvent::Taken { id, result } => {
            let path = result
                .saved_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let geometry = result
                .selection
                .map(|rect| rect.to_string())
                .unwrap_or_default();
            ControlInterface::capture_taken(&ctxt, *id, &path, &geometry).await
        }
        CaptureEvent::Failed { id, .. } => ControlInterface::capture_failed(&ctxt, *id).await,
    }
}

async fn connect(interface: ControlInterface) -> Result<Connection, ControlError> {
    let connection = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, interface)?
        .build();
    tokio::time::timeout(REGISTER_TIMEOUT, connection)
        .await
        .map_err(|_| ControlError::Timeout)?
        .map_err(ControlError::from)
}

/// Registers the control interface. Failure is logged and leaves the instance without IPC.
///
/// Must be called from outside the runtime.
pub fn register(
    runtime: &tokio::runtime::Handle,
    events: EventSender,
    tray_icon_enabled: bool,
) -> Option<ControlHandle> {
    let interface = ControlInterface::new(events, tray_icon_enabled);
    match runtime.block_on(connect(interface)) {
        Ok(connection) => {
            info!("Control interface registered as {} at {}", BUS_NAME, OBJECT_PATH);
            Some(ControlHandle {
                connection,
                runtime: runtime.clone(),
            })
        }
        Err(e) => {
            error!("Failed to register control interface: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_to_clipboard_skips_default_save() {
        let request = output_request(CaptureMode::FullScreen, "", true, 0, 7);
        assert_eq!(request.id(), 7);
        assert_eq!(request.tasks(), &[CaptureTask::Copy]);
    }

    #[test]
    fn full_screen_without_outputs_saves_to_default() {
        let request = output_request(CaptureMode::FullScreen, "", false, 250, 8);
        assert_eq!(request.tasks(), &[CaptureTask::Save(None)]);
        assert_eq!(request.delay(), Duration::from_millis(250));
    }

    #[test]
    fn screen_capture_with_path_and_clipboard() {
        let mode = CaptureMode::Screen(ScreenTarget::from_number(-1));
        let request = output_request(mode, "/tmp/out.png", true, -5, 9);
        assert_eq!(request.mode(), CaptureMode::Screen(ScreenTarget::UnderCursor));
        assert_eq!(request.save_target(), Some(Some(std::path::Path::new("/tmp/out.png"))));
        assert!(request.has_task(&CaptureTask::Copy));
        assert_eq!(request.delay(), Duration::ZERO);
    }

    #[test]
    fn graphic_capture_always_saves() {
        let request = graphic_request("", 0, 1);
        assert_eq!(request.mode(), CaptureMode::Graphical);
        assert_eq!(request.save_target(), Some(None));
    }
}
