//! RGBA color type and the color-code parser used by UI color settings.

use std::fmt;
use std::str::FromStr;

/// Represents an RGBA color with floating-point components.
///
/// All components are in the range 0.0 (minimum) to 1.0 (maximum).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    /// Alpha/transparency (0.0 = fully transparent, 1.0 = fully opaque)
    pub a: f64,
}

/// Named colors accepted in addition to hex codes (case-insensitive).
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("aqua", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("fuchsia", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("pink", [255, 192, 203]),
    ("purple", [128, 0, 128]),
    ("violet", [238, 130, 238]),
    ("indigo", [75, 0, 130]),
    ("brown", [165, 42, 42]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("darkgray", [169, 169, 169]),
    ("lightgray", [211, 211, 211]),
    ("silver", [192, 192, 192]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("gold", [255, 215, 0]),
    ("coral", [255, 127, 80]),
    ("crimson", [220, 20, 60]),
    ("salmon", [250, 128, 114]),
    ("turquoise", [64, 224, 208]),
    ("tomato", [255, 99, 71]),
];

/// Error returned when a color code cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid color code")]
pub struct ParseColorError(pub String);

impl Color {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        Self::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0, 1.0)
    }

    /// Parses `#RGB`, `#RRGGBB`, `#RRRGGGBBB`, `#RRRRGGGGBBBB`, `#AARRGGBB`,
    /// a named color, or `transparent`.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if let Some(hex) = code.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = code.to_ascii_lowercase();
        if lower == "transparent" {
            return Some(Self::new(0.0, 0.0, 0.0, 0.0));
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, rgb)| Self::from_rgb8(*rgb))
    }

    /// True when the color carries no transparency.
    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    /// Lower-case `#rrggbb` form used when persisting colors.
    pub fn to_hex(&self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channels = |width: usize| -> Option<Vec<f64>> {
        let max = (16u32.pow(width as u32) - 1) as f64;
        (0..hex.len() / width)
            .map(|i| {
                u32::from_str_radix(&hex[i * width..(i + 1) * width], 16)
                    .ok()
                    .map(|v| v as f64 / max)
            })
            .collect()
    };

    match hex.len() {
        3 | 6 | 9 | 12 => {
            let c = channels(hex.len() / 3)?;
            Some(Color::new(c[0], c[1], c[2], 1.0))
        }
        8 => {
            let c = channels(2)?;
            Some(Color::new(c[1], c[2], c[3], c[0]))
        }
        _ => None,
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseColorError(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse("#FFF").unwrap().to_hex(), "#ffffff");
        assert_eq!(Color::parse("#FF00FF").unwrap().to_hex(), "#ff00ff");
        assert_eq!(Color::parse("#fff000000").unwrap().to_hex(), "#ff0000");
        assert_eq!(Color::parse("#0000ffff0000").unwrap().to_hex(), "#00ff00");
    }

    #[test]
    fn parses_named_colors_case_insensitively() {
        assert_eq!(Color::parse("blue").unwrap().to_hex(), "#0000ff");
        assert_eq!(Color::parse("Red").unwrap().to_hex(), "#ff0000");
        assert!(Color::parse("chartreusey").is_none());
    }

    #[test]
    fn alpha_forms_report_transparency() {
        let half = Color::parse("#80FF0000").unwrap();
        assert!(!half.is_opaque());
        assert!(Color::parse("#FFFF0000").unwrap().is_opaque());
        assert!(!Color::parse("transparent").unwrap().is_opaque());
    }

    #[test]
    fn rejects_malformed_codes() {
        for code in ["", "#", "#12", "#12345", "#GGG", "FF00FF", "#1234567"] {
            assert!(Color::parse(code).is_none(), "{code} should be rejected");
        }
    }
}
