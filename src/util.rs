//! Geometry helpers shared by region parsing, screen layouts and capture output.

use std::fmt;

/// Axis-aligned rectangle in global (virtual desktop) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle. Returns `None` unless width and height are positive.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            None
        } else {
            Some(Self {
                x,
                y,
                width,
                height,
            })
        }
    }

    /// Returns the smallest rectangle covering both inputs.
    pub fn union(self, other: Rect) -> Rect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Geometry in the `x,y wxh` form understood by `grim -g`.
    pub fn to_grim_geometry(&self) -> String {
        format!("{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Formats as `WxH+X+Y`, the same syntax `--region` accepts.
impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}{:+}{:+}",
            self.width, self.height, self.x, self.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_rectangles() {
        assert!(Rect::new(0, 0, 0, 10).is_none());
        assert!(Rect::new(0, 0, 10, -1).is_none());
    }

    #[test]
    fn union_covers_both_rectangles() {
        let left = Rect::new(0, 0, 1920, 1080).unwrap();
        let right = Rect::new(1920, -200, 1280, 1024).unwrap();
        assert_eq!(
            left.union(right),
            Rect::new(0, -200, 3200, 1280).unwrap()
        );
    }

    #[test]
    fn display_uses_signed_offsets() {
        let rect = Rect::new(-10, 20, 300, 200).unwrap();
        assert_eq!(rect.to_string(), "300x200-10+20");
        assert_eq!(rect.to_grim_geometry(), "-10,20 300x200");
    }
}
