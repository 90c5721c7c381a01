//! Collision shapes and the narrow-phase overlap predicate
//!
//! Shapes are stored relative to their owner (local space) and moved into
//! world space on demand, right before a test. Nothing here caches world
//! positions.

use crate::foundation::math::{utils, Rect, Vec2};

/// Discriminant of a [`CollisionShape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Axis-aligned box
    Box,
    /// Circle
    Circle,
}

/// Collision shape (box or circle)
///
/// For circles, `(x, y)` is the top-left corner of the bounding square, so
/// the centre sits at `(x + radius, y + radius)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    /// Axis-aligned box with top-left corner `(x, y)`
    Box {
        /// Left edge
        x: f64,
        /// Top edge
        y: f64,
        /// Width
        w: f64,
        /// Height
        h: f64,
    },
    /// Circle inscribed in the square `(x, y, 2r, 2r)`
    Circle {
        /// Left edge of the bounding square
        x: f64,
        /// Top edge of the bounding square
        y: f64,
        /// Radius
        radius: f64,
    },
}

impl CollisionShape {
    /// Creates a box shape
    pub const fn rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::Box { x, y, w, h }
    }

    /// Creates a circle whose bounding square starts at `(x, y)`
    pub const fn circle(x: f64, y: f64, radius: f64) -> Self {
        Self::Circle { x, y, radius }
    }

    /// Creates a circle from its centre point
    pub fn circle_centered(center: Vec2, radius: f64) -> Self {
        Self::Circle {
            x: center.x - radius,
            y: center.y - radius,
            radius,
        }
    }

    /// Shape kind
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Box { .. } => ShapeKind::Box,
            Self::Circle { .. } => ShapeKind::Circle,
        }
    }

    /// Top-left anchor of the shape
    pub fn origin(&self) -> Vec2 {
        match *self {
            Self::Box { x, y, .. } | Self::Circle { x, y, .. } => Vec2::new(x, y),
        }
    }

    /// Move the shape by `offset` (local → world space)
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        match *self {
            Self::Box { x, y, w, h } => Self::Box { x: x + offset.x, y: y + offset.y, w, h },
            Self::Circle { x, y, radius } => Self::Circle {
                x: x + offset.x,
                y: y + offset.y,
                radius,
            },
        }
    }

    /// Rectangle used for spatial partitioning
    pub fn bounding_rect(&self) -> Rect {
        match *self {
            Self::Box { x, y, w, h } => Rect::new(x, y, w, h),
            Self::Circle { x, y, radius } => Rect::new(x, y, radius * 2.0, radius * 2.0),
        }
    }

    /// Centre point
    pub fn center(&self) -> Vec2 {
        match *self {
            Self::Box { .. } => self.bounding_rect().center(),
            Self::Circle { x, y, radius } => Vec2::new(x + radius, y + radius),
        }
    }

    /// Test if this shape overlaps another (strict; touching is not overlap)
    pub fn intersects(&self, other: &CollisionShape) -> bool {
        match (*self, *other) {
            (Self::Box { x, y, w, h }, Self::Box { .. }) => {
                Rect::new(x, y, w, h).overlaps(&other.bounding_rect())
            }
            (Self::Circle { radius: ra, .. }, Self::Circle { radius: rb, .. }) => {
                let delta = self.center() - other.center();
                delta.x.hypot(delta.y) < ra + rb
            }
            (Self::Box { x, y, w, h }, Self::Circle { radius, .. })
            | (Self::Circle { radius, .. }, Self::Box { x, y, w, h }) => {
                let circle_center = if self.kind() == ShapeKind::Circle {
                    self.center()
                } else {
                    other.center()
                };
                box_circle_overlap(Rect::new(x, y, w, h), circle_center, radius)
            }
        }
    }
}

/// Nearest point of the box to the centre, compared against the radius
fn box_circle_overlap(rect: Rect, center: Vec2, radius: f64) -> bool {
    let nearest = Vec2::new(
        utils::clamp(center.x, rect.x, rect.right()),
        utils::clamp(center.y, rect.y, rect.bottom()),
    );
    (center - nearest).norm_squared() < radius * radius
}

/// Narrow-phase predicate over two world-space shapes
pub fn overlaps(a: &CollisionShape, b: &CollisionShape) -> bool {
    a.intersects(b)
}
