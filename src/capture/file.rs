//! File saving for captured screenshots.

use super::types::CaptureError;
use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSION: &str = "png";

/// Where and how screenshots are written when a save task has no explicit file.
#[derive(Debug, Clone)]
pub struct FileSaveConfig {
    pub save_directory: PathBuf,
    /// chrono strftime pattern for the file stem.
    pub filename_pattern: String,
}

impl Default for FileSaveConfig {
    fn default() -> Self {
        Self {
            save_directory: default_save_directory(),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_string(),
        }
    }
}

pub const DEFAULT_FILENAME_PATTERN: &str = "shotwire_%Y-%m-%d_%H%M%S";

pub fn default_save_directory() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Shotwire")
}

/// True if every specifier in `pattern` is understood by chrono.
pub fn is_valid_pattern(pattern: &str) -> bool {
    !pattern.trim().is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Expand `pattern` for the current local time and append the image extension.
pub fn generate_filename(pattern: &str) -> String {
    let stem = if is_valid_pattern(pattern) {
        Local::now().format(pattern).to_string()
    } else {
        log::warn!("Invalid filename pattern '{pattern}', using default");
        Local::now().format(DEFAULT_FILENAME_PATTERN).to_string()
    };
    format!("{stem}.{IMAGE_EXTENSION}")
}

/// Decide the final file for a save task.
///
/// `None` saves into the configured directory; an existing directory gets a
/// generated file name; anything else is taken as the file itself.
pub fn resolve_save_path(target: Option<&Path>, config: &FileSaveConfig) -> PathBuf {
    match target {
        None => config
            .save_directory
            .join(generate_filename(&config.filename_pattern)),
        Some(dir) if dir.is_dir() => dir.join(generate_filename(&config.filename_pattern)),
        Some(file) if file.extension().is_none() => file.with_extension(IMAGE_EXTENSION),
        Some(file) => file.to_path_buf(),
    }
}

/// Write `image_data` for a save task and return the path written.
pub fn save_screenshot(
    image_data: &[u8],
    target: Option<&Path>,
    config: &FileSaveConfig,
) -> Result<PathBuf, CaptureError> {
    let file_path = resolve_save_path(target, config);

    if let Some(parent) = file_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        log::info!("Creating screenshot directory: {}", parent.display());
        fs::create_dir_all(parent)?;
    }

    log::info!(
        "Saving screenshot to: {} ({} bytes)",
        file_path.display(),
        image_data.len()
    );
    fs::write(&file_path, image_data)?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&file_path, Permissions::from_mode(0o600))?;
    }

    Ok(file_path)
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> FileSaveConfig {
        FileSaveConfig {
            save_directory: dir.to_path_buf(),
            filename_pattern: "shot_%Y".to_string(),
        }
    }

    #[test]
    fn generated_names_carry_png_extension() {
        let filename = generate_filename("test_%Y%m%d");
        assert!(filename.starts_with("test_"));
        assert!(filename.ends_with(".png"));
    }

    #[test]
    fn pattern_validation_flags_unknown_specifiers() {
        assert!(is_valid_pattern("%F_%H-%M"));
        assert!(!is_valid_pattern("%Q broken"));
        assert!(!is_valid_pattern("   "));
    }

    #[test]
    fn resolve_save_path_handles_each_target_kind() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());

        let default = resolve_save_path(None, &config);
        assert_eq!(default.parent(), Some(temp.path()));

        let into_dir = resolve_save_path(Some(temp.path()), &config);
        assert!(into_dir.file_name().unwrap().to_string_lossy().starts_with("shot_"));

        let bare = temp.path().join("capture");
        assert_eq!(
            resolve_save_path(Some(&bare), &config),
            temp.path().join("capture.png")
        );

        let explicit = temp.path().join("capture.jpg");
        assert_eq!(resolve_save_path(Some(&explicit), &config), explicit);
    }

    #[test]
    fn save_screenshot_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp.path().join("nested"));

        let path = save_screenshot(b"png-bytes", None, &config).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"png-bytes");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths_alone() {
        assert!(!expand_tilde("~/Pictures").to_string_lossy().starts_with('~'));
        assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}
