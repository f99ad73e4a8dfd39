//! Capture request model.
//!
//! A [`CaptureRequest`] describes one screenshot: where it comes from, how long
//! to wait before taking it, an optional pre-seeded selection, and the set of
//! side effects to run once the image exists. Requests are assembled through
//! [`CaptureRequestBuilder`] and are read-only afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::util::Rect;

static NEXT_REQUEST_ID: AtomicU32 = AtomicU32::new(1);

/// Allocates a process-unique request id.
pub fn next_request_id() -> u32 {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

/// Which monitor a screen capture targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenTarget {
    /// The monitor currently containing the pointer.
    UnderCursor,
    /// Zero-based monitor index.
    Index(u32),
}

impl ScreenTarget {
    /// Maps the wire/CLI convention (`-1` = under cursor) onto a target.
    pub fn from_number(number: i32) -> Self {
        u32::try_from(number).map_or(ScreenTarget::UnderCursor, ScreenTarget::Index)
    }
}

/// Capture source. Exactly one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Interactive selection on screen.
    Graphical,
    /// Every monitor at once.
    FullScreen,
    /// A single monitor.
    Screen(ScreenTarget),
}

/// Post-capture side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTask {
    Copy,
    PrintRaw,
    PrintGeometry,
    Pin,
    Upload,
    /// Save to the given file or directory, or to the configured location when `None`.
    Save(Option<PathBuf>),
    AcceptOnSelect,
}

impl CaptureTask {
    fn is_save(&self) -> bool {
        matches!(self, CaptureTask::Save(_))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    id: u32,
    mode: CaptureMode,
    delay: Duration,
    initial_selection: Option<Rect>,
    whole_desktop: bool,
    tasks: Vec<CaptureTask>,
}

impl CaptureRequest {
    pub fn builder(mode: CaptureMode) -> CaptureRequestBuilder {
        CaptureRequestBuilder {
            request: CaptureRequest {
                id: next_request_id(),
                mode,
                delay: Duration::ZERO,
                initial_selection: None,
                whole_desktop: false,
                tasks: Vec::new(),
            },
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn initial_selection(&self) -> Option<Rect> {
        self.initial_selection
    }

    /// True when the request covers every monitor regardless of its mode.
    pub fn selects_whole_desktop(&self) -> bool {
        self.whole_desktop
    }

    pub fn tasks(&self) -> &[CaptureTask] {
        &self.tasks
    }

    pub fn has_task(&self, task: &CaptureTask) -> bool {
        self.tasks.contains(task)
    }

    /// Returns the save target if a save task is present (`Some(None)` = default location).
    pub fn save_target(&self) -> Option<Option<&Path>> {
        self.tasks.iter().find_map(|task| match task {
            CaptureTask::Save(path) => Some(path.as_deref()),
            _ => None,
        })
    }
}

impl fmt::Debug for CaptureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureRequest")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("delay_ms", &self.delay.as_millis())
            .field(
                "initial_selection",
                &self.initial_selection.map(|r| r.to_string()),
            )
            .field("whole_desktop", &self.whole_desktop)
            .field("tasks", &self.tasks)
            .finish()
    }
}

/// Assembles a [`CaptureRequest`]; tasks form a set and at most one save target is kept.
#[derive(Debug, Clone)]
pub struct CaptureRequestBuilder {
    request: CaptureRequest,
}

impl CaptureRequestBuilder {
    /// Overrides the generated id, e.g. with one supplied by a control-interface caller.
    pub fn id(mut self, id: u32) -> Self {
        self.request.id = id;
        self
    }

    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.request.delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn initial_selection(mut self, selection: Rect) -> Self {
        self.request.initial_selection = Some(selection);
        self.request.whole_desktop = false;
        self
    }

    /// Capture every monitor without a crop, for `--region all` when the
    /// monitor layout is unknown.
    pub fn whole_desktop(mut self) -> Self {
        self.request.initial_selection = None;
        self.request.whole_desktop = true;
        self
    }

    pub fn task(mut self, task: CaptureTask) -> Self {
        self.add_task(task);
        self
    }

    /// Adds a save task; a later save replaces an earlier one.
    pub fn save_to(mut self, path: Option<PathBuf>) -> Self {
        self.add_task(CaptureTask::Save(path));
        self
    }

    /// True if any task other than [`CaptureTask::AcceptOnSelect`] is queued.
    pub fn has_output_task(&self) -> bool {
        self.request
            .tasks
            .iter()
            .any(|task| *task != CaptureTask::AcceptOnSelect)
    }

    fn add_task(&mut self, task: CaptureTask) {
        let tasks = &mut self.request.tasks;
        if task.is_save() {
            tasks.retain(|existing| !existing.is_save());
        } else if tasks.contains(&task) {
            return;
        }
        tasks.push(task);
    }

    pub fn build(self) -> CaptureRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_are_deduplicated() {
        let request = CaptureRequest::builder(CaptureMode::FullScreen)
            .task(CaptureTask::Copy)
            .task(CaptureTask::Copy)
            .task(CaptureTask::Pin)
            .build();
        assert_eq!(request.tasks(), &[CaptureTask::Copy, CaptureTask::Pin]);
    }

    #[test]
    fn later_save_replaces_earlier_one() {
        let request = CaptureRequest::builder(CaptureMode::Graphical)
            .save_to(Some(PathBuf::from("/tmp/a.png")))
            .task(CaptureTask::Copy)
            .save_to(None)
            .build();
        let saves = request
            .tasks()
            .iter()
            .filter(|t| matches!(t, CaptureTask::Save(_)))
            .count();
        assert_eq!(saves, 1);
        assert_eq!(request.save_target(), Some(None));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = CaptureRequest::builder(CaptureMode::Graphical).build();
        let b = CaptureRequest::builder(CaptureMode::Graphical).build();
        assert_ne!(a.id(), b.id());
        let c = CaptureRequest::builder(CaptureMode::Graphical).id(42).build();
        assert_eq!(c.id(), 42);
    }

    #[test]
    fn accept_on_select_is_not_an_output_task() {
        let builder =
            CaptureRequest::builder(CaptureMode::Graphical).task(CaptureTask::AcceptOnSelect);
        assert!(!builder.has_output_task());
        assert!(builder.task(CaptureTask::PrintGeometry).has_output_task());
    }

    #[test]
    fn whole_desktop_and_selection_exclude_each_other() {
        let rect = Rect::new(0, 0, 10, 10).unwrap();
        let request = CaptureRequest::builder(CaptureMode::Graphical)
            .initial_selection(rect)
            .whole_desktop()
            .build();
        assert!(request.selects_whole_desktop());
        assert_eq!(request.initial_selection(), None);

        let request = CaptureRequest::builder(CaptureMode::Graphical)
            .whole_desktop()
            .initial_selection(rect)
            .build();
        assert!(!request.selects_whole_desktop());
        assert_eq!(request.initial_selection(), Some(rect));
    }

    #[test]
    fn negative_screen_number_targets_cursor_screen() {
        assert_eq!(ScreenTarget::from_number(-1), ScreenTarget::UnderCursor);
        assert_eq!(ScreenTarget::from_number(2), ScreenTarget::Index(2));
    }
}
