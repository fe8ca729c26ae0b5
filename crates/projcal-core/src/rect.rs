//! Axis-aligned pixel windows.
//!
//! Origin top-left, `y` down. The right and bottom edges are exclusive.
//!
//! ```rust
//! use projcal_core::Rect;
//!
//! // Metering window for exposure search: a square a fifth of the width
//! let roi = Rect::centered_square(1000, 800, 200);
//! assert_eq!((roi.x, roi.y, roi.right(), roi.bottom()), (400, 300, 600, 500));
//! assert!(roi.contains(500, 400));
//! ```

use serde::{Deserialize, Serialize};

/// Pixel window `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left column
    pub x: u32,
    /// Top row
    pub y: u32,
    /// Columns covered
    pub width: u32,
    /// Rows covered
    pub height: u32,
}

impl Rect {
    /// Window at `(x, y)` of the given size.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Window from its corners, empty when they are inverted.
    const fn from_edges(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    /// Square of side `side` in the middle of a frame, cut at the frame edge.
    pub fn centered_square(frame_width: u32, frame_height: u32, side: u32) -> Self {
        let left = (frame_width / 2).saturating_sub(side / 2);
        let top = (frame_height / 2).saturating_sub(side / 2);
        Self::from_edges(
            left,
            top,
            left.saturating_add(side).min(frame_width),
            top.saturating_add(side).min(frame_height),
        )
    }

    /// Pixels within `half_size` of a sub-pixel center, cut at the frame edge.
    pub fn around(cx: f32, cy: f32, half_size: f32, frame_width: u32, frame_height: u32) -> Self {
        // Float to int casts saturate, so negatives land on 0
        let edge = |v: f32, limit: u32| (v as u32).min(limit);
        Self::from_edges(
            edge((cx - half_size).floor(), frame_width),
            edge((cy - half_size).floor(), frame_height),
            edge((cx + half_size).ceil(), frame_width),
            edge((cy + half_size).ceil(), frame_height),
        )
    }

    /// One past the last column.
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the last row.
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Pixel count.
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether pixel `(px, py)` lies inside.
    pub const fn contains(&self, px: u32, py: u32) -> bool {
        self.x <= px && px < self.right() && self.y <= py && py < self.bottom()
    }

    /// Overlap of two windows; `None` when it has no pixels.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let overlap = Self::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        );
        (overlap.area() > 0).then_some(overlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_square_in_frame() {
        assert_eq!(Rect::centered_square(100, 60, 20), Rect::new(40, 20, 20, 20));
        // Larger than the frame
        assert_eq!(Rect::centered_square(10, 10, 40), Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_around_near_corner() {
        let r = Rect::around(2.0, 3.0, 5.0, 50, 50);
        assert_eq!(r, Rect::new(0, 0, 7, 8));

        let r = Rect::around(48.5, 10.0, 3.0, 50, 50);
        assert_eq!((r.x, r.right()), (45, 50));
    }

    #[test]
    fn test_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(&Rect::new(5, 5, 10, 10)), Some(Rect::new(5, 5, 5, 5)));
        // Touching edges share no pixel
        assert_eq!(a.intersect(&Rect::new(10, 0, 4, 4)), None);
        assert_eq!(a.intersect(&Rect::new(20, 20, 1, 1)), None);
    }
}
