//! Math utilities and types
//!
//! Provides the 2D types used by the simulation core. Positions are `f64`
//! so that large game spaces keep sub-pixel precision.

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f64>;

/// Axis-aligned rectangle anchored at its top-left corner
///
/// `x`/`y` grow right and down, matching screen space. Negative or zero
/// extents are representable; they simply never contain or overlap much.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle covering `(0, 0)` to `(width, height)`
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Whether both extents are strictly positive
    pub fn has_area(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Strict overlap test; rectangles that only share an edge do not overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Whether `point` lies inside (edges inclusive on the top/left side)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Translate by an offset
    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }

    /// Split into four equal quadrants, in NE, NW, SW, SE order
    pub fn quadrants(&self) -> [Rect; 4] {
        let half_w = self.w * 0.5;
        let half_h = self.h * 0.5;
        [
            Rect::new(self.x + half_w, self.y, half_w, half_h),
            Rect::new(self.x, self.y, half_w, half_h),
            Rect::new(self.x, self.y + half_h, half_w, half_h),
            Rect::new(self.x + half_w, self.y + half_h, half_w, half_h),
        ]
    }
}

/// Math utility functions
pub mod utils {
    /// Clamp a value between min and max
    ///
    /// Unlike `f64::clamp` this tolerates `min > max` (degenerate boxes),
    /// returning `min` in that case.
    pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Linear interpolation
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(9.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_quadrant_order() {
        let [ne, nw, sw, se] = Rect::from_size(100.0, 50.0).quadrants();
        assert_eq!(ne, Rect::new(50.0, 0.0, 50.0, 25.0));
        assert_eq!(nw, Rect::new(0.0, 0.0, 50.0, 25.0));
        assert_eq!(sw, Rect::new(0.0, 25.0, 50.0, 25.0));
        assert_eq!(se, Rect::new(50.0, 25.0, 50.0, 25.0));
    }

    #[test]
    fn test_clamp_degenerate_range() {
        assert_eq!(utils::clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(utils::clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(utils::clamp(3.0, 4.0, 2.0), 4.0);
    }
}
