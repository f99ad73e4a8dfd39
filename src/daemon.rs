/// Background instance: tray icon, D-Bus control interface, captures on demand
use anyhow::{Result, anyhow};
use ksni::TrayMethods;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::app::{AppContext, long_version};
use crate::capture::{CaptureMode, CaptureRequest, next_request_id};
use crate::config;
use crate::control;
use crate::event_loop::{EventLoop, EventSender, LoopEvent, QuitReason};
use crate::instance::InstanceError;
use crate::orchestrator::ExitPolicy;

const TRAY_START_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct ShotwireTray {
    events: EventSender,
    quit_flag: Arc<AtomicBool>,
}

impl ShotwireTray {
    fn new(events: EventSender, quit_flag: Arc<AtomicBool>) -> Self {
        Self { events, quit_flag }
    }
}

impl ksni::Tray for ShotwireTray {
    fn id(&self) -> String {
        "shotwire".into()
    }

    fn title(&self) -> String {
        "Shotwire Screenshot".into()
    }

    fn icon_name(&self) -> String {
        "camera-photo".into()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            icon_name: "camera-photo".into(),
            icon_pixmap: vec![],
            title: format!("Shotwire {}", long_version()),
            description: "Left click to take a screenshot".into(),
        }
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn status(&self) -> ksni::Status {
        ksni::Status::Active
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        self.events.send(LoopEvent::Submit(tray_capture_request()));
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        use ksni::menu::*;

        vec![
            StandardItem {
                label: "Take Screenshot".to_string(),
                icon_name: "camera-photo".into(),
                activate: Box::new(|this: &mut Self| {
                    this.events
                        .send(LoopEvent::Submit(tray_capture_request()));
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Open Launcher".to_string(),
                icon_name: "view-grid".into(),
                activate: Box::new(|this: &mut Self| {
                    this.events.send(LoopEvent::OpenLauncher {
                        id: next_request_id(),
                    });
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Configuration".to_string(),
                icon_name: "preferences-desktop".into(),
                activate: Box::new(|this: &mut Self| {
                    this.events.send(LoopEvent::OpenConfig);
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Quit".to_string(),
                icon_name: "window-close".into(),
                activate: Box::new(|this: &mut Self| {
                    this.quit_flag.store(true, Ordering::Release);
                    this.events.send(LoopEvent::Quit(QuitReason::User));
                }),
                ..Default::default()
            }
            .into(),
        ]
    }
}

/// Interactive capture saved to the configured location.
fn tray_capture_request() -> CaptureRequest {
    CaptureRequest::builder(CaptureMode::Graphical)
        .save_to(None)
        .build()
}

/// Run the background instance until it is asked to quit. Returns the exit code.
pub fn run(ctx: &AppContext) -> i32 {
    let token = match ctx.daemon_instance_guard().acquire(false) {
        Ok(token) => Some(token),
        Err(InstanceError::Busy { pid }) => {
            info!(
                "Shotwire is already running{}",
                pid.map(|p| format!(" (pid {p})")).unwrap_or_default()
            );
            return 0;
        }
        Err(e) => {
            warn!("{}; continuing without single-instance check", e);
            None
        }
    };

    info!("Starting shotwire {}", long_version());

    let mut event_loop = EventLoop::new();
    if let Some(token) = token {
        event_loop.on_about_to_quit(move || token.release());
    }
    if let Err(e) = event_loop.install_signal_handlers() {
        error!("{:#}", e);
    }

    let sender = event_loop.sender();
    let tray_enabled = !ctx.config.general.disabled_tray_icon;
    if tray_enabled {
        let quit_flag = Arc::new(AtomicBool::new(false));
        match start_system_tray(sender.clone(), quit_flag.clone()) {
            Ok(tray_thread) => event_loop.on_about_to_quit(move || {
                quit_flag.store(true, Ordering::Release);
                match tray_thread.join() {
                    Ok(()) => info!("System tray thread joined"),
                    Err(err) => warn!("System tray thread panicked: {:?}", err),
                }
            }),
            Err(e) => warn!("Continuing without tray icon: {:#}", e),
        }
    } else {
        debug!("Tray icon disabled in configuration");
    }

    let mut orchestrator = ctx
        .orchestrator(ExitPolicy::Daemon)
        .on_open_config(config::launch_configurator);
    if let Some(handle) = control::register(ctx.runtime(), sender, tray_enabled) {
        orchestrator = orchestrator.on_capture_event(move |event| handle.emit(event));
    }

    info!("Shotwire ready");
    let code = event_loop.run(&mut orchestrator);
    info!("Shotwire shutting down");
    code
}

/// System tray implementation
fn start_system_tray(events: EventSender, quit_flag: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    let tray_quit_flag = quit_flag.clone();
    let tray = ShotwireTray::new(events, tray_quit_flag.clone());
    let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

    info!("Spawning system tray runtime thread...");

    let ready_thread_tx = ready_tx.clone();
    let tray_thread = thread::Builder::new()
        .name("shotwire-tray".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Failed to create Tokio runtime for system tray: {}", e);
                    report_tray_readiness(
                        &ready_thread_tx,
                        Err(anyhow!(
                            "Failed to create Tokio runtime for system tray: {e}"
                        )),
                    );
                    return;
                }
            };

            rt.block_on(async {
                match tray.spawn().await {
                    Ok(handle) => {
                        info!("System tray spawned successfully");
                        report_tray_readiness(&ready_thread_tx, Ok(()));

                        loop {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            if tray_quit_flag.load(Ordering::Acquire) {
                                info!("Shutting down system tray");
                                let _ = handle.shutdown().await;
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("System tray error: {}", e);
                        report_tray_readiness(
                            &ready_thread_tx,
                            Err(anyhow!("System tray error: {e}")),
                        );
                    }
                }
            });
        })?;

    drop(ready_tx);

    match ready_rx.recv_timeout(TRAY_START_TIMEOUT) {
        Ok(result) => {
            result?;
            info!("System tray thread started");
            Ok(tray_thread)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("Timed out waiting for system tray to start");
            quit_flag.store(true, Ordering::Release);
            let _ = tray_thread.join();
            Err(anyhow!("Timed out waiting for system tray to start"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = tray_thread.join();
            Err(anyhow!(
                "System tray thread exited before signaling readiness"
            ))
        }
    }
}

fn report_tray_readiness(tx: &mpsc::Sender<Result<()>>, result: Result<()>) {
    if let Err(err) = tx.send(result) {
        debug!(
            "System tray readiness receiver dropped before signal could be delivered: {}",
            err
        );
    }
}
