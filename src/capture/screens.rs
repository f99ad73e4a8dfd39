//! Monitor layout discovery.
//!
//! Layouts come from the compositor's IPC tool: `hyprctl` on Hyprland,
//! `swaymsg` on sway and other i3-IPC compositors.

use std::process::{Command, Stdio};

use log::debug;
use serde_json::Value;

use crate::capture::request::ScreenTarget;
use crate::capture::types::CaptureError;
use crate::util::Rect;

/// One connected monitor in logical desktop coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub index: u32,
    pub name: String,
    pub geometry: Rect,
    pub focused: bool,
}

/// Source of the current monitor arrangement.
pub trait ScreenLayout: Send + Sync {
    fn screens(&self) -> Result<Vec<Screen>, CaptureError>;

    /// Bounding box of every monitor.
    fn desktop_geometry(&self) -> Result<Rect, CaptureError> {
        self.screens()?
            .iter()
            .map(|screen| screen.geometry)
            .reduce(Rect::union)
            .ok_or_else(|| CaptureError::InvalidResponse("no screens reported".into()))
    }

    fn find(&self, target: ScreenTarget) -> Result<Screen, CaptureError> {
        let screens = self.screens()?;
        let found = match target {
            ScreenTarget::UnderCursor => screens
                .iter()
                .find(|screen| screen.focused)
                .or_else(|| screens.first()),
            ScreenTarget::Index(index) => screens.iter().find(|screen| screen.index == index),
        };
        found.cloned().ok_or(match target {
            ScreenTarget::Index(index) => CaptureError::UnknownScreen(index),
            ScreenTarget::UnderCursor => {
                CaptureError::InvalidResponse("no screens reported".into())
            }
        })
    }
}

/// Runs a compositor query and returns its stdout.
fn query(program: &str, args: &[&str]) -> Result<Vec<u8>, CaptureError> {
    let command = format!("{program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CaptureError::ImageError(format!("Failed to run {command}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::ImageError(format!(
            "{command} failed: {}",
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

/// Queries `hyprctl monitors -j`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HyprlandLayout;

impl ScreenLayout for HyprlandLayout {
    fn screens(&self) -> Result<Vec<Screen>, CaptureError> {
        parse_monitors(&query("hyprctl", &["monitors", "-j"])?)
    }
}

/// Queries `swaymsg -t get_outputs -r`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwayLayout;

impl ScreenLayout for SwayLayout {
    fn screens(&self) -> Result<Vec<Screen>, CaptureError> {
        parse_sway_outputs(&query("swaymsg", &["-t", "get_outputs", "-r"])?)
    }
}

/// Tries each source in order and uses the first layout reported.
pub struct FallbackLayout {
    sources: Vec<Box<dyn ScreenLayout>>,
}

impl FallbackLayout {
    pub fn new(sources: Vec<Box<dyn ScreenLayout>>) -> Self {
        Self { sources }
    }

    /// Hyprland first, then sway.
    pub fn compositor() -> Self {
        Self::new(vec![Box::new(HyprlandLayout), Box::new(SwayLayout)])
    }
}

impl ScreenLayout for FallbackLayout {
    fn screens(&self) -> Result<Vec<Screen>, CaptureError> {
        let mut last_error = None;
        for source in &self.sources {
            match source.screens() {
                Ok(screens) => return Ok(screens),
                Err(e) => {
                    debug!("Screen layout source unavailable: {}", e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| CaptureError::InvalidResponse("no screen layout source".into())))
    }
}

/// Fixed layout, used when the compositor cannot be queried and in tests.
#[derive(Debug, Default, Clone)]
pub struct StaticLayout(pub Vec<Screen>);

impl ScreenLayout for StaticLayout {
    fn screens(&self) -> Result<Vec<Screen>, CaptureError> {
        Ok(self.0.clone())
    }
}

/// Parses hyprctl's monitor list, converting pixel sizes to logical sizes.
pub fn parse_monitors(json: &[u8]) -> Result<Vec<Screen>, CaptureError> {
    let monitors: Value = serde_json::from_slice(json).map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse hyprctl monitors output: {}", e))
    })?;

    let list = monitors.as_array().ok_or_else(|| {
        CaptureError::InvalidResponse("hyprctl monitors did not return an array".into())
    })?;

    let mut screens = Vec::with_capacity(list.len());
    for monitor in list {
        let int = |key: &str| {
            monitor.get(key).and_then(Value::as_i64).ok_or_else(|| {
                CaptureError::InvalidResponse(format!("Missing '{key}' in monitor entry"))
            })
        };
        let scale = monitor.get("scale").and_then(Value::as_f64).unwrap_or(1.0);
        let scale = if scale > 0.0 { scale } else { 1.0 };

        let width = (int("width")? as f64 / scale).round() as i32;
        let height = (int("height")? as f64 / scale).round() as i32;
        let geometry = Rect::new(int("x")? as i32, int("y")? as i32, width, height)
            .ok_or_else(|| {
                CaptureError::InvalidResponse("Monitor has non-positive dimensions".into())
            })?;

        screens.push(Screen {
            index: int("id")? as u32,
            name: monitor
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            geometry,
            focused: monitor
                .get("focused")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        });
    }

    screens.sort_by_key(|screen| screen.index);
    Ok(screens)
}

/// Parses sway's output list. Inactive outputs are skipped; the others are
/// numbered in the order sway reports them.
pub fn parse_sway_outputs(json: &[u8]) -> Result<Vec<Screen>, CaptureError> {
    let outputs: Value = serde_json::from_slice(json).map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse swaymsg outputs: {}", e))
    })?;

    let list = outputs.as_array().ok_or_else(|| {
        CaptureError::InvalidResponse("swaymsg get_outputs did not return an array".into())
    })?;

    let mut screens = Vec::with_capacity(list.len());
    for output in list {
        if !output.get("active").and_then(Value::as_bool).unwrap_or(true) {
            continue;
        }
        let rect = output.get("rect").ok_or_else(|| {
            CaptureError::InvalidResponse("Missing 'rect' in output entry".into())
        })?;
        let int = |key: &str| {
            rect.get(key)
                .and_then(Value::as_i64)
                .map(|v| v as i32)
                .ok_or_else(|| {
                    CaptureError::InvalidResponse(format!("Missing '{key}' in output rect"))
                })
        };
        let geometry = Rect::new(int("x")?, int("y")?, int("width")?, int("height")?)
            .ok_or_else(|| {
                CaptureError::InvalidResponse("Output has non-positive dimensions".into())
            })?;

        screens.push(Screen {
            index: screens.len() as u32,
            name: output
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            geometry,
            focused: output
                .get("focused")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        });
    }
    Ok(screens)
}
