//! Per-option value checks.
//!
//! Each function is a clap `value_parser`: it receives the raw token and either
//! returns the typed value or the user-facing message for that option.

use std::path::{Path, PathBuf};

use crate::capture::Region;
use crate::color::Color;

pub const COLOR_ERROR: &str = "Invalid color, this flag supports the following formats:\n\
- #RGB (each of R, G, and B is a single hex digit)\n\
- #RRGGBB\n\
- #RRRGGGBBB\n\
- #RRRRGGGGBBBB\n\
- Named colors like 'blue' or 'red'\n\
You may need to escape the '#' sign as in '\\#FFF'";
pub const DELAY_ERROR: &str = "Invalid delay, it must be a number greater than 0";
pub const SCREEN_NUMBER_ERROR: &str = "Invalid screen number, it must be non negative";
pub const REGION_ERROR: &str = "Invalid region, use 'WxH+X+Y' or 'all' or 'screen0/screen1/...'.";
pub const PATH_ERROR: &str =
    "Invalid path, must be an existing directory or a new file in an existing directory";
pub const BOOLEAN_ERROR: &str = "Invalid value, it must be defined as 'true' or 'false'";

/// A fully opaque color.
pub fn color(value: &str) -> Result<Color, String> {
    match Color::parse(value) {
        Some(color) if color.is_opaque() => Ok(color),
        _ => Err(COLOR_ERROR.to_string()),
    }
}

fn non_negative(value: &str) -> Option<u64> {
    value.trim().parse::<i64>().ok().and_then(|n| u64::try_from(n).ok())
}

/// Delay in milliseconds.
pub fn delay(value: &str) -> Result<u64, String> {
    non_negative(value).ok_or_else(|| DELAY_ERROR.to_string())
}

pub fn screen_number(value: &str) -> Result<u32, String> {
    non_negative(value)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| SCREEN_NUMBER_ERROR.to_string())
}

pub fn region(value: &str) -> Result<Region, String> {
    value.parse().map_err(|_| REGION_ERROR.to_string())
}

/// An existing directory, or a file whose parent directory exists.
pub fn path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if value.is_empty() {
        return Err(PATH_ERROR.to_string());
    }
    let parent_exists = match path.parent() {
        Some(parent) if parent != Path::new("") => parent.is_dir(),
        _ => true,
    };
    if path.is_dir() || parent_exists {
        Ok(path)
    } else {
        log::error!("{}", PATH_ERROR);
        Err(PATH_ERROR.to_string())
    }
}

/// Exactly `true` or `false`.
pub fn boolean(value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(BOOLEAN_ERROR.to_string()),
    }
}
