#![forbid(unsafe_code)]

//! Reduced integer ratio label for an area size (`"16:9"`).

use std::fmt;

use crate::geometry::Vec2;

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

/// A `width:height` ratio reduced by the greatest common divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectLabel {
    pub width: u32,
    pub height: u32,
}

impl AspectLabel {
    /// Label for a normalized `size` drawn at `reference` scale.
    ///
    /// Each axis is truncated to whole reference units before reduction.
    pub fn from_size(size: Vec2, reference: Vec2) -> Self {
        let width = Self::whole_units(size.x * reference.x);
        let height = Self::whole_units(size.y * reference.y);
        Self::reduced(width, height)
    }

    /// Reduce `width:height`. `0:0` is returned as is.
    pub fn reduced(width: u32, height: u32) -> Self {
        match gcd(width, height) {
            0 | 1 => Self { width, height },
            divisor => Self {
                width: width / divisor,
                height: height / divisor,
            },
        }
    }

    fn whole_units(value: f64) -> u32 {
        if value.is_finite() && value > 0.0 {
            // Tolerate float noise just under a whole unit (0.45 * 200 = 89.999...).
            (value + 1e-9).trunc() as u32
        } else {
            0
        }
    }
}

impl fmt::Display for AspectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: Vec2 = Vec2::new(200.0, 200.0);

    #[test]
    fn gcd_basics() {
        assert_eq!(gcd(200, 200), 200);
        assert_eq!(gcd(160, 90), 10);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(gcd(0, 0), 0);
    }

    #[test]
    fn square_reduces_to_one_one() {
        let label = AspectLabel::from_size(Vec2::splat(1.0), REFERENCE);
        assert_eq!(label.to_string(), "1:1");
    }

    #[test]
    fn widescreen_reduces() {
        let label = AspectLabel::from_size(Vec2::new(0.8, 0.45), REFERENCE);
        assert_eq!(label, AspectLabel { width: 16, height: 9 });
        assert_eq!(label.to_string(), "16:9");
    }

    #[test]
    fn small_sizes_reduce() {
        let label = AspectLabel::from_size(Vec2::new(0.07, 0.05), REFERENCE);
        assert_eq!(label.to_string(), "7:5");
    }

    #[test]
    fn zero_pair_is_not_divided() {
        assert_eq!(AspectLabel::reduced(0, 0).to_string(), "0:0");
        assert_eq!(AspectLabel::reduced(12, 0).to_string(), "1:0");
    }
}
