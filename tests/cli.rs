use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn shotwire_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shotwire").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("SHOTWIRE_CONFIGURATOR")
        .env_remove("RUST_LOG");
    cmd
}

fn config_file(config_home: &TempDir) -> std::path::PathBuf {
    config_home.path().join("shotwire").join("config.toml")
}

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Powerful yet simple to use screenshot software"))
        .stdout(predicate::str::contains("launcher"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_includes_package_version() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn negative_delay_is_rejected() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["full", "--delay", "-5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid delay, it must be a number greater than 0",
        ))
        .stderr(predicate::str::contains("See shotwire --help."));
}

#[test]
fn unknown_option_for_subcommand_is_rejected() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["full", "--accept-on-select"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("See shotwire --help."));
}

#[test]
fn screen_rejects_screen_region() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["screen", "--region", "screen0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "The 'screen' command does not support '--region screen<N>'.",
        ));
}

#[test]
fn invalid_region_syntax_is_rejected() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["gui", "--region", "100x100"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid region"));
}

#[test]
fn translucent_color_is_rejected() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["config", "--maincolor", "#80FF0000"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid color"));
    assert!(!config_file(&temp).exists());
}

#[test]
fn config_check_without_file_succeeds() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["config", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No errors detected."));
}

#[test]
fn config_check_reports_problems() {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[ui]\nui_color = \"#80FF0000\"\nbogus = true\n").unwrap();

    shotwire_cmd(&temp)
        .args(["config", "--check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ui_color"))
        .stderr(predicate::str::contains("bogus"));

    let unchanged = std::fs::read_to_string(&path).unwrap();
    assert!(unchanged.contains("bogus = true"));
}

#[test]
fn config_settings_are_persisted() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["config", "--notifications", "false", "--maincolor", "red"])
        .assert()
        .success();

    let written = std::fs::read_to_string(config_file(&temp)).unwrap();
    assert!(written.contains("show_desktop_notification = false"), "{written}");
    assert!(written.contains("ui_color = \"#ff0000\""), "{written}");

    shotwire_cmd(&temp)
        .args(["config", "--check"])
        .assert()
        .success();
}

#[test]
fn config_filename_prints_preview() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["config", "--filename", "shot_%Y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The new pattern is 'shot_%Y'"))
        .stdout(predicate::str::contains("Parsed pattern example: shot_"));
}

#[test]
fn config_boolean_requires_literal() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .args(["config", "--trayicon", "maybe"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid value, it must be defined as 'true' or 'false'",
        ));
}

#[test]
fn autostart_entry_follows_flag() {
    let temp = TempDir::new().unwrap();
    let entry = temp.path().join("autostart").join("shotwire.desktop");

    shotwire_cmd(&temp)
        .args(["config", "--autostart", "true"])
        .assert()
        .success();
    assert!(entry.exists());

    shotwire_cmd(&temp)
        .args(["config", "--autostart", "false"])
        .assert()
        .success();
    assert!(!entry.exists());
}

#[test]
fn config_edit_keeps_untouched_settings() {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "# tuned by hand\n[general]\nshow_help = false\n\n[ui]\nui_color = \"#80FF0000\"\nold_setting = 1\n\n[save]\nfilename_pattern = \"shot_%Q\"\n",
    )
    .unwrap();

    shotwire_cmd(&temp)
        .args(["config", "-n", "false"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("# tuned by hand"), "{written}");
    assert!(written.contains("show_help = false"), "{written}");
    assert!(written.contains("ui_color = \"#80FF0000\""), "{written}");
    assert!(written.contains("old_setting = 1"), "{written}");
    assert!(written.contains("filename_pattern = \"shot_%Q\""), "{written}");
    assert!(written.contains("show_desktop_notification = false"), "{written}");
}

#[test]
fn gui_unresolvable_region_exits_cleanly() {
    let temp = TempDir::new().unwrap();
    shotwire_cmd(&temp)
        .env("XDG_RUNTIME_DIR", temp.path())
        .env("XDG_CACHE_HOME", temp.path().join("cache"))
        .args(["gui", "--region", "screen99"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not resolve region 'screen99'"))
        .stderr(predicate::str::contains("Event loop dropped").not());
}
