//! Configuration section definitions.

use serde::{Deserialize, Serialize};

use crate::capture::file::DEFAULT_FILENAME_PATTERN;

/// Startup, notification and instance behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Start the background instance at login (mirrors the autostart entry).
    #[serde(default)]
    pub startup_launch: bool,

    /// Show "Capture saved as ..." after a save.
    #[serde(default = "default_true")]
    pub show_desktop_notification: bool,

    /// Show "Screenshot aborted." when a capture fails.
    #[serde(default = "default_true")]
    pub show_abort_notification: bool,

    #[serde(default)]
    pub disabled_tray_icon: bool,

    /// Show usage hints in the capture UI.
    #[serde(default = "default_true")]
    pub show_help: bool,

    /// Skip the instance guard so several GUI instances can run at once.
    #[serde(default)]
    pub allow_multiple_gui_instances: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            startup_launch: false,
            show_desktop_notification: true,
            show_abort_notification: true,
            disabled_tray_icon: false,
            show_help: true,
            allow_multiple_gui_instances: false,
        }
    }
}

/// Where screenshots go when a save task has no explicit path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Directory for saved captures. Defaults to `~/Pictures/Shotwire` when unset.
    /// A leading `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,

    /// chrono strftime pattern for file names, without extension.
    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_path: None,
            filename_pattern: default_filename_pattern(),
        }
    }
}

/// Capture UI colors, as color codes (`#RRGGBB`, named colors, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_ui_color")]
    pub ui_color: String,

    #[serde(default = "default_contrast_ui_color")]
    pub contrast_ui_color: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            ui_color: default_ui_color(),
            contrast_ui_color: default_contrast_ui_color(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_filename_pattern() -> String {
    DEFAULT_FILENAME_PATTERN.to_string()
}

pub(crate) fn default_ui_color() -> String {
    "#740096".to_string()
}

pub(crate) fn default_contrast_ui_color() -> String {
    "#270032".to_string()
}
