#![forbid(unsafe_code)]

//! Geometric primitives in normalized and reference-region space.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the two rectangle axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Horizontal (width / offset-X).
    X,
    /// Vertical (height / offset-Y).
    Y,
}

impl Axis {
    /// The perpendicular axis.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// A pair of `f64` components, used for both offsets and sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Create a new pair.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both components set to `v`.
    #[inline]
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v }
    }

    /// Component-wise product.
    #[inline]
    #[must_use]
    pub fn scale(self, by: Vec2) -> Self {
        Self::new(self.x * by.x, self.y * by.y)
    }

    /// Whether both components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle, origin at top-left.
///
/// Containment is half-open: the left and top edges are inside, the right
/// and bottom edges are not.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub const fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Whether `inner`, once shrunk by `inset` on every side, lies within
    /// this rectangle.
    ///
    /// Only the two shrunk corners are tested, so an `inner` that overshoots
    /// by less than `inset` still counts as contained.
    pub fn contains_inset(&self, inner: &Rect, inset: f64) -> bool {
        let top_left = Vec2::new(inner.left() + inset, inner.top() + inset);
        let bottom_right = Vec2::new(inner.right() - inset, inner.bottom() - inset);
        self.contains(top_left) && self.contains(bottom_right)
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, Rect, Vec2};

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert!(rect.contains(Vec2::new(2.0, 3.0)));
        assert!(rect.contains(Vec2::new(5.9, 7.9)));
        assert!(!rect.contains(Vec2::new(6.0, 3.0)));
        assert!(!rect.contains(Vec2::new(2.0, 8.0)));
        assert!(!rect.contains(Vec2::new(1.99, 3.0)));
    }

    #[test]
    fn contains_inset_accepts_exact_fit() {
        let outer = Rect::from_size(200.0, 200.0);
        assert!(outer.contains_inset(&Rect::from_size(200.0, 200.0), 1.0));
        assert!(outer.contains_inset(&Rect::new(1.0, 1.0, 198.0, 198.0), 1.0));
    }

    #[test]
    fn contains_inset_rejects_one_unit_overshoot() {
        let outer = Rect::from_size(200.0, 200.0);
        assert!(!outer.contains_inset(&Rect::new(0.0, 0.0, 201.0, 100.0), 1.0));
        assert!(!outer.contains_inset(&Rect::new(-2.0, 0.0, 100.0, 100.0), 1.0));
    }

    #[test]
    fn contains_inset_forgives_sub_unit_overshoot() {
        let outer = Rect::from_size(200.0, 200.0);
        assert!(outer.contains_inset(&Rect::new(-0.5, 0.0, 200.5, 200.0), 1.0));
    }

    #[test]
    fn axis_other_and_scale() {
        assert_eq!(Axis::X.other(), Axis::Y);
        assert_eq!(Axis::Y.other(), Axis::X);
        assert_eq!(
            Vec2::splat(0.5).scale(Vec2::new(200.0, 100.0)),
            Vec2::new(100.0, 50.0)
        );
        assert!(!Vec2::new(f64::NAN, 1.0).is_finite());
    }

    #[test]
    fn empty_rect() {
        assert!(Rect::from_size(0.0, 5.0).is_empty());
        assert!(!Rect::from_size(1.0, 1.0).is_empty());
    }
}
