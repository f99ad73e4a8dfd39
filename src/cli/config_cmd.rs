//! `shotwire config`: edit, check, or open the configuration.

use anyhow::{Context, Result, bail};

use crate::capture::file;
use crate::config::{self, Config, ConfigDocument, autostart};

use super::ConfigArgs;

impl ConfigArgs {
    fn has_setting(&self) -> bool {
        self.autostart.is_some()
            || self.notifications.is_some()
            || self.filename.is_some()
            || self.trayicon.is_some()
            || self.showhelp.is_some()
            || self.maincolor.is_some()
            || self.contrastcolor.is_some()
    }
}

/// Runs the subcommand and returns the exit code.
pub fn run(args: &ConfigArgs) -> Result<i32> {
    if args.check {
        return Ok(check());
    }

    if !args.has_setting() {
        let status = config::configurator_command()?
            .status()
            .context("Failed to run the configuration editor")?;
        log::debug!("Configuration editor exited with {}", status);
        return Ok(0);
    }

    let mut doc = ConfigDocument::open(&Config::get_config_path()?)?;
    for line in apply(&mut doc, args)? {
        println!("{line}");
    }
    doc.save()?;

    if let Some(enabled) = args.autostart {
        autostart::set_enabled(enabled)?;
    }
    Ok(0)
}

fn check() -> i32 {
    match Config::check() {
        Ok(issues) if issues.is_empty() => {
            println!("No errors detected.");
            0
        }
        Ok(issues) => {
            for issue in issues {
                eprintln!("{issue}");
            }
            1
        }
        Err(e) => {
            eprintln!("{e:#}");
            1
        }
    }
}

/// Writes only the requested settings into `doc`; returns lines to show the user.
fn apply(doc: &mut ConfigDocument, args: &ConfigArgs) -> Result<Vec<String>> {
    let mut output = Vec::new();

    if let Some(pattern) = &args.filename {
        if !file::is_valid_pattern(pattern) {
            bail!("Invalid filename pattern '{pattern}'");
        }
        doc.set("save", "filename_pattern", pattern.as_str())?;
        output.push(format!(
            "The new pattern is '{pattern}'\nParsed pattern example: {}",
            file::generate_filename(pattern)
        ));
    }
    if let Some(enabled) = args.autostart {
        doc.set("general", "startup_launch", enabled)?;
    }
    if let Some(enabled) = args.notifications {
        doc.set("general", "show_desktop_notification", enabled)?;
    }
    if let Some(enabled) = args.trayicon {
        doc.set("general", "disabled_tray_icon", !enabled)?;
    }
    if let Some(enabled) = args.showhelp {
        doc.set("general", "show_help", enabled)?;
    }
    if let Some(color) = args.maincolor {
        doc.set("ui", "ui_color", color.to_hex())?;
    }
    if let Some(color) = args.contrastcolor {
        doc.set("ui", "contrast_ui_color", color.to_hex())?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn config_args(args: &[&str]) -> ConfigArgs {
        let argv = ["shotwire", "config"].into_iter().chain(args.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Command::Config(args)) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    /// Applies `args` to a document holding `existing`, returning the
    /// written text and the lines shown to the user.
    fn edit(existing: &str, args: &[&str]) -> Result<(String, Vec<String>)> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, existing).unwrap();
        let mut doc = ConfigDocument::open(&path)?;
        let output = apply(&mut doc, &config_args(args))?;
        doc.save()?;
        Ok((fs::read_to_string(&path).unwrap(), output))
    }

    fn parsed(text: &str) -> Config {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn no_flags_means_open_editor() {
        assert!(!config_args(&[]).has_setting());
        assert!(!config_args(&["--check"]).has_setting());
    }

    #[test]
    fn boolean_settings_are_applied() {
        let args = ["-n", "false", "-t", "false", "-s", "false", "-a", "true"];
        let (text, output) = edit("", &args).unwrap();
        let config = parsed(&text);

        assert!(output.is_empty());
        assert!(!config.general.show_desktop_notification);
        assert!(config.general.disabled_tray_icon);
        assert!(!config.general.show_help);
        assert!(config.general.startup_launch);
    }

    #[test]
    fn tray_icon_true_enables_tray() {
        let (text, _) = edit("[general]\ndisabled_tray_icon = true\n", &["--trayicon", "true"]).unwrap();
        assert!(!parsed(&text).general.disabled_tray_icon);
    }

    #[test]
    fn colors_are_stored_as_hex() {
        let (text, _) = edit("", &["-m", "red", "-k", "#00F"]).unwrap();
        let config = parsed(&text);
        assert_eq!(config.ui.ui_color, "#ff0000");
        assert_eq!(config.ui.contrast_ui_color, "#0000ff");
    }

    #[test]
    fn filename_pattern_prints_preview() {
        let (text, output) = edit("", &["-f", "shot_%Y"]).unwrap();
        assert_eq!(parsed(&text).save.filename_pattern, "shot_%Y");
        assert_eq!(output.len(), 1);
        assert!(output[0].starts_with("The new pattern is 'shot_%Y'\nParsed pattern example: shot_"));
        assert!(output[0].ends_with(".png"));
    }

    #[test]
    fn invalid_filename_pattern_is_rejected() {
        let err = edit("[save]\nfilename_pattern = \"old_%Y\"\n", &["-f", "shot_%Q"]).unwrap_err();
        assert!(err.to_string().contains("Invalid filename pattern 'shot_%Q'"));
    }

    #[test]
    fn untouched_settings_survive_an_edit() {
        let existing = "# personal tweaks\n[general]\nshow_help = false\nretired_option = \"x\"\n\n[ui]\nui_color = \"#80FF0000\"\n\n[save]\nfilename_pattern = \"shot_%Q\"\n";
        let (text, _) = edit(existing, &["-n", "false"]).unwrap();

        assert!(text.starts_with("# personal tweaks\n"), "{text}");
        assert!(text.contains("retired_option = \"x\""), "{text}");
        assert!(text.contains("ui_color = \"#80FF0000\""), "{text}");
        assert!(text.contains("filename_pattern = \"shot_%Q\""), "{text}");
        assert!(text.contains("show_help = false"), "{text}");
        assert!(text.contains("show_desktop_notification = false"), "{text}");
    }
}
