//! Configuration file support for shotwire.
//!
//! Settings live in `~/.config/shotwire/config.toml`. Capture commands load
//! them leniently (bad values are replaced with defaults and logged), while
//! `shotwire config --check` reports every problem without touching the file.
//!
//! If no config file exists, defaults are used.

pub mod autostart;
pub mod document;
pub mod types;

pub use document::ConfigDocument;
pub use types::{GeneralConfig, SaveConfig, UiConfig};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::capture::file::{self, FileSaveConfig};
use crate::color::Color;

const CONFIG_DIR_NAME: &str = "shotwire";
const CONFIGURATOR_ENV: &str = "SHOTWIRE_CONFIGURATOR";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Known keys per section, used by the strict check.
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    (
        "general",
        &[
            "startup_launch",
            "show_desktop_notification",
            "show_abort_notification",
            "disabled_tray_icon",
            "show_help",
            "allow_multiple_gui_instances",
        ],
    ),
    ("save", &["save_path", "filename_pattern"]),
    ("ui", &["ui_color", "contrast_ui_color"]),
];

/// Root configuration.
///
/// # Example TOML
/// ```toml
/// [general]
/// show_abort_notification = false
///
/// [save]
/// save_path = "~/Screenshots"
/// filename_pattern = "shot_%Y%m%d_%H%M%S"
///
/// [ui]
/// ui_color = "#740096"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub save: SaveConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Returns the path to the configuration file (`$XDG_CONFIG_HOME/shotwire/config.toml`).
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads the user's configuration, or defaults if there is none.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config.sanitize();

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Like [`Config::load`], falling back to defaults with a warning.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("Failed to load config: {:#}. Using defaults.", e);
            Self::default()
        })
    }

    /// Replaces values that would break capture with their defaults.
    fn sanitize(&mut self) {
        for (name, value, fallback) in [
            ("ui_color", &mut self.ui.ui_color, types::default_ui_color()),
            (
                "contrast_ui_color",
                &mut self.ui.contrast_ui_color,
                types::default_contrast_ui_color(),
            ),
        ] {
            if !Color::parse(value.as_str()).is_some_and(|c| c.is_opaque()) {
                warn!("Invalid {} '{}', falling back to '{}'", name, value, fallback);
                *value = fallback;
            }
        }

        if !file::is_valid_pattern(&self.save.filename_pattern) {
            warn!(
                "Invalid filename_pattern '{}', falling back to '{}'",
                self.save.filename_pattern,
                file::DEFAULT_FILENAME_PATTERN
            );
            self.save.filename_pattern = file::DEFAULT_FILENAME_PATTERN.to_string();
        }

        if self
            .save
            .save_path
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            self.save.save_path = None;
        }
    }

    /// Validates the user's configuration file. An empty result means no problems.
    pub fn check() -> Result<Vec<String>> {
        let path = Self::get_config_path()?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Ok(Self::check_str(&text))
    }

    /// Strict validation of config text; never mutates anything.
    pub fn check_str(text: &str) -> Vec<String> {
        let table: toml::Table = match toml::from_str(text) {
            Ok(table) => table,
            Err(e) => return vec![format!("Invalid TOML: {}", e.message())],
        };

        let mut issues = Vec::new();
        for (section, value) in &table {
            let Some((_, keys)) = KNOWN_KEYS.iter().find(|(name, _)| *name == section.as_str()) else {
                issues.push(format!("Unknown section [{section}]"));
                continue;
            };
            let Some(entries) = value.as_table() else {
                issues.push(format!("'{section}' must be a table"));
                continue;
            };
            for key in entries.keys() {
                if !keys.contains(&key.as_str()) {
                    issues.push(format!("Unknown key '{key}' in [{section}]"));
                }
            }
        }

        let config: Config = match toml::from_str(text) {
            Ok(config) => config,
            Err(e) => {
                issues.push(format!("Invalid value: {}", e.message()));
                return issues;
            }
        };

        for (name, value) in [
            ("ui.ui_color", &config.ui.ui_color),
            ("ui.contrast_ui_color", &config.ui.contrast_ui_color),
        ] {
            match Color::parse(value) {
                Some(color) if color.is_opaque() => {}
                Some(_) => issues.push(format!("{name} '{value}' must be fully opaque")),
                None => issues.push(format!("{name} '{value}' is not a valid color")),
            }
        }

        if !file::is_valid_pattern(&config.save.filename_pattern) {
            issues.push(format!(
                "save.filename_pattern '{}' is not a valid strftime pattern",
                config.save.filename_pattern
            ));
        }

        if let Some(save_path) = &config.save.save_path
            && !file::expand_tilde(save_path).is_dir()
        {
            issues.push(format!(
                "save.save_path '{save_path}' is not an existing directory"
            ));
        }

        issues
    }

    /// Writes the documented default config if no config file exists yet.
    ///
    /// Returns the config path either way.
    pub fn create_default_file() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Ok(config_path);
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = include_str!("../../config.example.toml");
        fs::write(&config_path, default_config)?;

        info!("Created default config at {}", config_path.display());
        Ok(config_path)
    }

    /// Save settings for captures that have no explicit target.
    pub fn file_save_config(&self) -> FileSaveConfig {
        let save_directory = self
            .save
            .save_path
            .as_deref()
            .map(file::expand_tilde)
            .unwrap_or_else(file::default_save_directory);
        FileSaveConfig {
            save_directory,
            filename_pattern: self.save.filename_pattern.clone(),
        }
    }
}

/// Command that opens the configuration editor on the user's config file.
///
/// Runs `$SHOTWIRE_CONFIGURATOR <config>` when set, `xdg-open <config>` otherwise.
/// The default config file is created first if missing.
pub fn configurator_command() -> Result<Command> {
    let config_path = Config::create_default_file()?;
    let program = std::env::var(CONFIGURATOR_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "xdg-open".to_string());

    let mut command = Command::new(&program);
    command
        .arg(&config_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    debug!("Configurator: {} {}", program, config_path.display());
    Ok(command)
}

/// Start the configuration editor without waiting for it.
pub fn launch_configurator() {
    let spawned = configurator_command().and_then(|mut command| {
        command
            .spawn()
            .with_context(|| format!("Failed to run {:?}", command.get_program()))
    });
    match spawned {
        Ok(child) => info!("Launched configuration editor (pid: {})", child.id()),
        Err(err) => {
            log::error!("Failed to launch configuration editor: {:#}", err);
            log::error!("Set {CONFIGURATOR_ENV} to override the editor command if needed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.general.show_abort_notification);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general]\nshow_abort_notification = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.general.show_abort_notification);
        assert!(config.general.show_desktop_notification);
        assert_eq!(config.ui.ui_color, "#740096");
    }

    #[test]
    fn lenient_load_replaces_bad_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[ui]\nui_color = \"#80FF0000\"\n[save]\nfilename_pattern = \"shot_%Q\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.ui.ui_color, "#740096");
        assert_eq!(config.save.filename_pattern, file::DEFAULT_FILENAME_PATTERN);
    }

    #[test]
    fn check_accepts_example_config() {
        let issues = Config::check_str(include_str!("../../config.example.toml"));
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn check_reports_each_problem() {
        let issues = Config::check_str(
            "[general]\nbogus = 1\n\n[ui]\nui_color = \"#80FF0000\"\ncontrast_ui_color = \"nope\"\n\n[save]\nfilename_pattern = \"x_%Q\"\nsave_path = \"/definitely/not/here\"\n",
        );
        assert_eq!(issues.len(), 5, "{issues:?}");
        assert!(issues[0].contains("bogus"));
    }

    #[test]
    fn check_reports_syntax_and_type_errors() {
        assert_eq!(Config::check_str("[general").len(), 1);
        let issues = Config::check_str("[general]\nshow_help = \"yes\"\n");
        assert!(issues[0].starts_with("Invalid value"), "{issues:?}");
    }

    #[test]
    fn file_save_config_expands_save_path() {
        let mut config = Config::default();
        config.save.save_path = Some("/srv/shots".into());
        assert_eq!(
            config.file_save_config().save_directory,
            PathBuf::from("/srv/shots")
        );
    }
}
