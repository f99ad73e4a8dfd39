//! Capture orchestration: submit one request, wait for its outcome, decide how to exit.
//!
//! The orchestrator is the only [`EventHandler`] the process runs. It forwards
//! requests to a [`CaptureEngine`], tracks the single in-flight request, and
//! turns the engine's terminal event into a loop decision according to an
//! [`ExitPolicy`].

use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::capture::{CaptureEngine, CaptureEvent, CaptureRequest};
use crate::event_loop::{EventHandler, EventLoop, EventSender, LoopControl, LoopEvent, QuitReason};
use crate::notification::Notifier;

pub const ABORT_MESSAGE: &str = "Screenshot aborted.";

/// What the process does after a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// CLI capture: stop after the outcome (0 on success, 1 on failure).
    OneShot,
    /// Long-lived instance: keep serving requests.
    Daemon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Requested { id: u32 },
    AwaitingOutcome { id: u32 },
    Completed { id: u32 },
    Failed { id: u32 },
}

impl OrchestratorState {
    fn in_flight(self) -> Option<u32> {
        match self {
            OrchestratorState::Requested { id } | OrchestratorState::AwaitingOutcome { id } => {
                Some(id)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Capture {in_flight} is still in progress; rejecting request {rejected}")]
    Busy { in_flight: u32, rejected: u32 },
}

type EventObserver = Box<dyn FnMut(&CaptureEvent)>;
type ConfigOpener = Box<dyn FnMut()>;

pub struct CaptureOrchestrator {
    engine: Arc<dyn CaptureEngine>,
    notifier: Arc<dyn Notifier>,
    policy: ExitPolicy,
    show_abort_notification: bool,
    state: OrchestratorState,
    observer: Option<EventObserver>,
    open_config: Option<ConfigOpener>,
}

impl CaptureOrchestrator {
    pub fn new(
        engine: Arc<dyn CaptureEngine>,
        notifier: Arc<dyn Notifier>,
        policy: ExitPolicy,
    ) -> Self {
        Self {
            engine,
            notifier,
            policy,
            show_abort_notification: true,
            state: OrchestratorState::Idle,
            observer: None,
            open_config: None,
        }
    }

    pub fn show_abort_notification(mut self, enabled: bool) -> Self {
        self.show_abort_notification = enabled;
        self
    }

    /// Called with every terminal event, including rejections of busy requests.
    pub fn on_capture_event(mut self, observer: impl FnMut(&CaptureEvent) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn on_open_config(mut self, opener: impl FnMut() + 'static) -> Self {
        self.open_config = Some(Box::new(opener));
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// `Idle -> Requested -> AwaitingOutcome`. Rejects a second in-flight request.
    pub fn submit(
        &mut self,
        request: CaptureRequest,
        events: &EventSender,
    ) -> Result<(), OrchestratorError> {
        let id = request.id();
        self.begin(id)?;
        info!("Submitting capture request {}", id);
        debug!("{:?}", request);
        self.engine.request_capture(request, events.clone());
        self.state = OrchestratorState::AwaitingOutcome { id };
        Ok(())
    }

    pub fn open_launcher(&mut self, id: u32, events: &EventSender) -> Result<(), OrchestratorError> {
        self.begin(id)?;
        info!("Opening capture launcher ({})", id);
        self.engine.open_launcher(id, events.clone());
        self.state = OrchestratorState::AwaitingOutcome { id };
        Ok(())
    }

    fn begin(&mut self, id: u32) -> Result<(), OrchestratorError> {
        if let Some(in_flight) = self.state.in_flight() {
            return Err(OrchestratorError::Busy {
                in_flight,
                rejected: id,
            });
        }
        self.state = OrchestratorState::Requested { id };
        Ok(())
    }

    fn reject(&mut self, err: OrchestratorError) {
        warn!("{}", err);
        let OrchestratorError::Busy { rejected, .. } = err;
        self.observe(&CaptureEvent::Failed {
            id: rejected,
            reason: "another capture is in progress".to_string(),
        });
    }

    fn observe(&mut self, event: &CaptureEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }

    /// `AwaitingOutcome -> Completed | Failed`, returning what the loop should do.
    fn finish(&mut self, event: CaptureEvent) -> LoopControl {
        let id = event.id();
        if self.state.in_flight() != Some(id) {
            debug!("Ignoring capture event for request {} ({:?})", id, self.state);
            return LoopControl::Continue;
        }
        self.observe(&event);

        match event {
            CaptureEvent::Taken { result, .. } => {
                info!("Capture {} completed: {:?}", id, result);
                self.state = OrchestratorState::Completed { id };
                match self.policy {
                    ExitPolicy::OneShot if !self.engine.has_external_widget() => {
                        LoopControl::Exit(0)
                    }
                    _ => LoopControl::Continue,
                }
            }
            CaptureEvent::Failed { reason, .. } => {
                info!("Capture {} failed: {}", id, reason);
                self.state = OrchestratorState::Failed { id };
                eprintln!("{ABORT_MESSAGE}");
                if self.show_abort_notification {
                    self.notifier.notify("Shotwire", ABORT_MESSAGE);
                }
                match self.policy {
                    ExitPolicy::OneShot => LoopControl::Exit(1),
                    ExitPolicy::Daemon => LoopControl::Continue,
                }
            }
        }
    }
}

impl EventHandler for CaptureOrchestrator {
    fn handle(&mut self, event: LoopEvent, events: &EventSender) -> LoopControl {
        match event {
            LoopEvent::Submit(request) => {
                if let Err(err) = self.submit(request, events) {
                    self.reject(err);
                }
                LoopControl::Continue
            }
            LoopEvent::OpenLauncher { id } => {
                if let Err(err) = self.open_launcher(id, events) {
                    self.reject(err);
                }
                LoopControl::Continue
            }
            LoopEvent::OpenConfig => {
                match self.open_config.as_mut() {
                    Some(open) => open(),
                    None => debug!("No configuration editor in this instance"),
                }
                LoopControl::Continue
            }
            LoopEvent::Capture(event) => self.finish(event),
            LoopEvent::Quit(_) => LoopControl::Exit(0),
        }
    }

    fn quit_code(&self, reason: QuitReason) -> i32 {
        match (self.policy, self.state.in_flight()) {
            (ExitPolicy::OneShot, Some(id)) => {
                info!("Stopping with capture {} unfinished ({:?})", id, reason);
                1
            }
            _ => 0,
        }
    }
}

/// Runs `event_loop` until the capture submitted by `start` reaches a terminal event.
///
/// Returns the process exit code.
pub fn run_until_outcome(
    mut orchestrator: CaptureOrchestrator,
    event_loop: EventLoop,
    start: impl FnOnce(&mut CaptureOrchestrator, &EventSender) -> Result<(), OrchestratorError>,
) -> i32 {
    let sender = event_loop.sender();
    if let Err(err) = start(&mut orchestrator, &sender) {
        warn!("{}", err);
        return 1;
    }
    event_loop.run(&mut orchestrator)
}

/// Submit `request` and block until its outcome. Returns the process exit code.
pub fn request_capture_and_wait(
    orchestrator: CaptureOrchestrator,
    event_loop: EventLoop,
    request: CaptureRequest,
) -> i32 {
    run_until_outcome(orchestrator, event_loop, |orchestrator, sender| {
        orchestrator.submit(request, sender)
    })
}
