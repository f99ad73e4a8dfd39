//! XDG autostart entry for the background instance.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const DESKTOP_FILE_NAME: &str = "shotwire.desktop";

/// `$XDG_CONFIG_HOME/autostart/shotwire.desktop`.
pub fn desktop_entry_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not find config directory")?
        .join("autostart")
        .join(DESKTOP_FILE_NAME))
}

pub fn is_enabled() -> bool {
    desktop_entry_path().is_ok_and(|path| path.exists())
}

/// Writes or removes the autostart entry.
pub fn set_enabled(enabled: bool) -> Result<()> {
    let path = desktop_entry_path()?;
    if enabled {
        write_entry(&path)
    } else {
        remove_entry(&path)
    }
}

fn write_entry(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let exec = std::env::current_exe()
        .map(|exe| exe.display().to_string())
        .unwrap_or_else(|_| "shotwire".to_string());
    fs::write(path, desktop_entry(&exec))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Installed autostart entry at {}", path.display());
    Ok(())
}

fn remove_entry(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::info!("Removed autostart entry {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn desktop_entry(exec: &str) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Shotwire\n\
         Comment=Screenshot capture tool\n\
         Exec={exec}\n\
         Icon=camera-photo\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_runs_given_executable() {
        let entry = desktop_entry("/usr/bin/shotwire");
        assert!(entry.starts_with("[Desktop Entry]\n"));
        assert!(entry.contains("\nExec=/usr/bin/shotwire\n"));
    }

    #[test]
    fn removing_missing_entry_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_entry(&dir.path().join(DESKTOP_FILE_NAME)).is_ok());
    }

    #[test]
    fn write_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autostart").join(DESKTOP_FILE_NAME);
        write_entry(&path).unwrap();
        assert!(path.exists());
        remove_entry(&path).unwrap();
        assert!(!path.exists());
    }
}
