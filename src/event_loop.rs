//! Single-threaded event loop that parks the calling thread until an event arrives.
//!
//! Capture engines, the control interface, the tray and the signal bridge all
//! feed one channel; a single [`EventHandler`] consumes it on the thread that
//! called [`EventLoop::run`]. Hooks registered with
//! [`EventLoop::on_about_to_quit`] run on every exit route, including
//! signal-triggered shutdown and unwinding.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle as SignalHandle, Signals};

use crate::capture::{CaptureEvent, CaptureRequest};

/// Why the loop is being asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitReason {
    Signal(i32),
    /// Quit requested from the tray or control interface.
    User,
    /// The cancellation token was set before the next event was read.
    Cancelled,
}

#[derive(Debug)]
pub enum LoopEvent {
    /// Start a capture (CLI, tray, or control interface).
    Submit(CaptureRequest),
    /// Open the interactive capture chooser.
    OpenLauncher { id: u32 },
    /// Open the configuration editor.
    OpenConfig,
    /// Terminal event from the capture engine.
    Capture(CaptureEvent),
    Quit(QuitReason),
}

/// What the handler wants the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit(i32),
}

pub trait EventHandler {
    fn handle(&mut self, event: LoopEvent, events: &EventSender) -> LoopControl;

    /// Exit code used when the loop is stopped by a [`LoopEvent::Quit`] or cancellation.
    fn quit_code(&self, _reason: QuitReason) -> i32 {
        0
    }
}

/// Producer side of the loop channel. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<LoopEvent>,
}

impl EventSender {
    /// Queue an event. Returns false once the loop has gone away.
    pub fn send(&self, event: LoopEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::SendError(event)) => {
                debug!("Event loop stopped; dropping {:?}", event);
                false
            }
        }
    }

    pub fn capture_event(&self, event: CaptureEvent) -> bool {
        self.send(LoopEvent::Capture(event))
    }
}

/// Cooperative cancellation flag checked at the loop boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

type QuitHook = Box<dyn FnOnce() + Send>;

pub struct EventLoop {
    tx: mpsc::Sender<LoopEvent>,
    rx: mpsc::Receiver<LoopEvent>,
    token: CancellationToken,
    quit_hooks: Vec<QuitHook>,
    signal_handle: Option<SignalHandle>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            token: CancellationToken::default(),
            quit_hooks: Vec::new(),
            signal_handle: None,
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Register a hook that runs once when the loop stops, in registration order.
    pub fn on_about_to_quit(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.quit_hooks.push(Box::new(hook));
    }

    /// Translate SIGINT/SIGTERM into cancellation plus a wake-up event.
    pub fn install_signal_handlers(&mut self) -> Result<()> {
        let mut signals =
            Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handler")?;
        self.signal_handle = Some(signals.handle());

        let token = self.token.clone();
        let sender = self.sender();
        thread::Builder::new()
            .name("shotwire-signals".into())
            .spawn(move || {
                for sig in signals.forever() {
                    info!(
                        "Received {} - initiating graceful shutdown",
                        if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                    );
                    token.cancel();
                    if !sender.send(LoopEvent::Quit(QuitReason::Signal(sig))) {
                        break;
                    }
                }
            })
            .context("Failed to spawn signal handler thread")?;
        Ok(())
    }

    /// Block dispatching events to `handler` until it asks to exit or the loop is stopped.
    pub fn run(mut self, handler: &mut dyn EventHandler) -> i32 {
        let sender = self.sender();
        let code = loop {
            if self.token.is_cancelled() {
                break handler.quit_code(QuitReason::Cancelled);
            }
            let event = match self.rx.recv() {
                Ok(event) => event,
                // Unreachable while `self.tx` is alive; treat as a normal stop.
                Err(mpsc::RecvError) => break 0,
            };
            match event {
                LoopEvent::Quit(reason) => {
                    debug!("Event loop quitting: {:?}", reason);
                    break handler.quit_code(reason);
                }
                event => match handler.handle(event, &sender) {
                    LoopControl::Continue => {}
                    LoopControl::Exit(code) => break code,
                },
            }
        };
        self.run_quit_hooks();
        code
    }

    fn run_quit_hooks(&mut self) {
        for hook in self.quit_hooks.drain(..) {
            hook();
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.signal_handle.take() {
            handle.close();
        }
        if !self.quit_hooks.is_empty() {
            warn!("Event loop dropped without running; running shutdown hooks now");
            self.run_quit_hooks();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Vec<String>,
        exit_after: usize,
    }

    impl EventHandler for Recorder {
        fn handle(&mut self, event: LoopEvent, _events: &EventSender) -> LoopControl {
            self.seen.push(format!("{event:?}"));
            if self.seen.len() >= self.exit_after {
                LoopControl::Exit(7)
            } else {
                LoopControl::Continue
            }
        }

        fn quit_code(&self, reason: QuitReason) -> i32 {
            match reason {
                QuitReason::Signal(_) => 3,
                QuitReason::Cancelled => 4,
                QuitReason::User => 5,
            }
        }
    }

    #[test]
    fn handler_exit_code_stops_loop_and_runs_hooks() {
        let mut event_loop = EventLoop::new();
        let hooks_ran = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let log = hooks_ran.clone();
            event_loop.on_about_to_quit(move || log.lock().unwrap().push(name));
        }

        let sender = event_loop.sender();
        sender.send(LoopEvent::OpenConfig);
        sender.send(LoopEvent::OpenConfig);

        let mut handler = Recorder {
            seen: Vec::new(),
            exit_after: 2,
        };
        assert_eq!(event_loop.run(&mut handler), 7);
        assert_eq!(handler.seen.len(), 2);
        assert_eq!(*hooks_ran.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn quit_event_uses_handler_quit_code() {
        let event_loop = EventLoop::new();
        event_loop
            .sender()
            .send(LoopEvent::Quit(QuitReason::Signal(SIGTERM)));
        let mut handler = Recorder {
            seen: Vec::new(),
            exit_after: usize::MAX,
        };
        assert_eq!(event_loop.run(&mut handler), 3);
        assert!(handler.seen.is_empty());
    }

    #[test]
    fn cancellation_is_checked_before_waiting() {
        let event_loop = EventLoop::new();
        event_loop.cancellation_token().cancel();
        let mut handler = Recorder {
            seen: Vec::new(),
            exit_after: usize::MAX,
        };
        assert_eq!(event_loop.run(&mut handler), 4);
    }

    #[test]
    fn dropping_unrun_loop_still_runs_hooks() {
        let ran = Arc::new(AtomicBool::new(false));
        {
            let mut event_loop = EventLoop::new();
            let flag = ran.clone();
            event_loop.on_about_to_quit(move || flag.store(true, Ordering::SeqCst));
        }
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn sender_reports_closed_loop() {
        let sender = EventLoop::new().sender();
        assert!(!sender.send(LoopEvent::OpenConfig));
    }
}
