//! `--region` syntax: `WxH+X+Y`, `all`, or `screen<N>`.

use std::fmt;
use std::str::FromStr;

use crate::capture::request::ScreenTarget;
use crate::capture::screens::ScreenLayout;
use crate::capture::types::CaptureError;
use crate::util::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Explicit rectangle in desktop coordinates.
    Rect(Rect),
    /// The whole desktop across all monitors.
    All,
    /// One monitor by index.
    Screen(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid region")]
pub struct ParseRegionError(pub String);

impl Region {
    /// Maps the region onto absolute desktop coordinates.
    pub fn resolve(&self, layout: &dyn ScreenLayout) -> Result<Rect, CaptureError> {
        match self {
            Region::Rect(rect) => Ok(*rect),
            Region::All => layout.desktop_geometry(),
            Region::Screen(index) => Ok(layout.find(ScreenTarget::Index(*index))?.geometry),
        }
    }

    pub fn is_screen(&self) -> bool {
        matches!(self, Region::Screen(_))
    }
}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRegionError(s.to_string());
        let trimmed = s.trim();

        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Region::All);
        }
        if let Some(index) = trimmed.strip_prefix("screen") {
            return index.parse().map(Region::Screen).map_err(|_| err());
        }

        let (width, rest) = trimmed.split_once('x').ok_or_else(err)?;
        let offset_start = rest.find(['+', '-']).ok_or_else(err)?;
        let (height, offsets) = rest.split_at(offset_start);
        let second = offsets[1..].find(['+', '-']).ok_or_else(err)? + 1;
        let (x, y) = offsets.split_at(second);

        let number = |text: &str| -> Result<i32, ParseRegionError> {
            let digits = text.trim_start_matches(['+', '-']);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(err());
            }
            text.trim_start_matches('+').parse().map_err(|_| err())
        };

        Rect::new(number(x)?, number(y)?, number(width)?, number(height)?)
            .map(Region::Rect)
            .ok_or_else(err)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Rect(rect) => fmt::Display::fmt(rect, f),
            Region::All => f.write_str("all"),
            Region::Screen(index) => write!(f, "screen{index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::screens::{Screen, StaticLayout};

    fn layout() -> StaticLayout {
        StaticLayout(vec![
            Screen {
                index: 0,
                name: "DP-1".into(),
                geometry: Rect::new(0, 0, 1920, 1080).unwrap(),
                focused: true,
            },
            Screen {
                index: 1,
                name: "DP-2".into(),
                geometry: Rect::new(1920, 0, 1280, 1024).unwrap(),
                focused: false,
            },
        ])
    }

    #[test]
    fn parses_explicit_rectangles() {
        assert_eq!(
            "300x200+10+20".parse::<Region>().unwrap(),
            Region::Rect(Rect::new(10, 20, 300, 200).unwrap())
        );
        assert_eq!(
            "300x200-10+20".parse::<Region>().unwrap(),
            Region::Rect(Rect::new(-10, 20, 300, 200).unwrap())
        );
    }

    #[test]
    fn parses_keywords() {
        assert_eq!("all".parse::<Region>().unwrap(), Region::All);
        assert_eq!("screen1".parse::<Region>().unwrap(), Region::Screen(1));
    }

    #[test]
    fn rejects_malformed_regions() {
        for text in ["", "300x200", "0x200+0+0", "axb+1+2", "screen", "screen-1", "300x200+1", "300x200++1+2"] {
            assert!(text.parse::<Region>().is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn resolves_against_layout() {
        let layout = layout();
        assert_eq!(
            Region::All.resolve(&layout).unwrap(),
            Rect::new(0, 0, 3200, 1080).unwrap()
        );
        assert_eq!(
            Region::Screen(1).resolve(&layout).unwrap(),
            Rect::new(1920, 0, 1280, 1024).unwrap()
        );
        assert!(Region::Screen(4).resolve(&layout).is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let region = Region::Rect(Rect::new(5, -6, 70, 80).unwrap());
        assert_eq!(region.to_string().parse::<Region>().unwrap(), region);
    }
}
