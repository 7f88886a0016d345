#![forbid(unsafe_code)]

//! Range-clamped, precision-quantized scalars.
//!
//! # Invariants
//!
//! 1. After any write, `min <= value <= max`.
//! 2. Writes are snapped to the nearest multiple of `precision` before the
//!    clamp, so a range bound that is not itself a multiple of the step is
//!    still reachable.
//! 3. `quantize(quantize(v)) == quantize(v)` bit-for-bit.
//! 4. Non-finite writes are rejected and leave the value untouched.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    #[inline]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// The range `[1 / widest, widest]` for a widest supported ratio.
    #[inline]
    pub fn symmetric_ratio(widest: f64) -> Self {
        Self::new(1.0 / widest, widest)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Saturate `value` into the range.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Both bounds finite and `min <= max`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Snap `value` to the nearest multiple of `precision`.
///
/// A non-positive precision disables snapping.
#[inline]
pub fn quantize(value: f64, precision: f64) -> f64 {
    if precision > 0.0 {
        (value / precision).round() * precision
    } else {
        value
    }
}

/// A scalar held inside a [`ValueRange`] and snapped to a fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundedValue {
    value: f64,
    range: ValueRange,
    precision: f64,
    default: f64,
}

impl BoundedValue {
    /// Create a value starting at its (normalized) default.
    #[must_use]
    pub fn new(range: ValueRange, precision: f64, default: f64) -> Self {
        let mut bounded = Self {
            value: range.min,
            range,
            precision,
            default: range.min,
        };
        bounded.default = bounded.normalize(default).unwrap_or(range.min);
        bounded.value = bounded.default;
        bounded
    }

    #[inline]
    pub const fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub const fn min(&self) -> f64 {
        self.range.min
    }

    #[inline]
    pub const fn max(&self) -> f64 {
        self.range.max
    }

    #[inline]
    pub const fn range(&self) -> ValueRange {
        self.range
    }

    #[inline]
    pub const fn precision(&self) -> f64 {
        self.precision
    }

    #[inline]
    pub const fn default_value(&self) -> f64 {
        self.default
    }

    /// The value a write of `requested` would store, or `None` for
    /// non-finite input.
    pub fn normalize(&self, requested: f64) -> Option<f64> {
        if !requested.is_finite() {
            return None;
        }
        Some(self.range.clamp(quantize(requested, self.precision)))
    }

    /// Write `requested`. Returns `true` if the stored value changed.
    pub fn set(&mut self, requested: f64) -> bool {
        match self.normalize(requested) {
            Some(next) if next != self.value => {
                self.value = next;
                true
            }
            _ => false,
        }
    }

    /// Restore the default. Returns `true` if the stored value changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.value != self.default;
        self.value = self.default;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_axis() -> BoundedValue {
        BoundedValue::new(ValueRange::new(0.05, 1.0), 0.01, 1.0)
    }

    #[test]
    fn starts_at_default() {
        let v = size_axis();
        assert_eq!(v.value(), 1.0);
        assert_eq!(v.default_value(), 1.0);
    }

    #[test]
    fn default_is_normalized() {
        let v = BoundedValue::new(ValueRange::new(0.0, 1.0), 0.01, 7.0);
        assert_eq!(v.value(), 1.0);
    }

    #[test]
    fn write_saturates() {
        let mut v = size_axis();
        assert!(v.set(-3.0));
        assert_eq!(v.value(), 0.05);
        assert!(v.set(42.0));
        assert_eq!(v.value(), 1.0);
    }

    #[test]
    fn write_snaps_to_precision() {
        let mut v = size_axis();
        v.set(0.503);
        assert_eq!(v.value(), quantize(0.5, 0.01));
        v.set(0.506);
        assert_eq!(v.value(), quantize(0.51, 0.01));
    }

    #[test]
    fn unchanged_write_reports_false() {
        let mut v = size_axis();
        assert!(v.set(0.5));
        assert!(!v.set(0.5));
        assert!(!v.set(0.501));
    }

    #[test]
    fn non_finite_rejected() {
        let mut v = size_axis();
        assert!(!v.set(f64::NAN));
        assert!(!v.set(f64::INFINITY));
        assert_eq!(v.value(), 1.0);
        assert_eq!(v.normalize(f64::NEG_INFINITY), None);
    }

    #[test]
    fn off_grid_bound_is_reachable() {
        let range = ValueRange::symmetric_ratio(21.0 / 9.0);
        let mut ratio = BoundedValue::new(range, 0.01, 1.0);
        ratio.set(0.0);
        assert_eq!(ratio.value(), range.min);
        assert!((ratio.value() - 9.0 / 21.0).abs() < 1e-12);
        ratio.set(100.0);
        assert_eq!(ratio.value(), range.max);
    }

    #[test]
    fn reset_restores_default() {
        let mut v = size_axis();
        v.set(0.3);
        assert!(v.reset());
        assert_eq!(v.value(), 1.0);
        assert!(!v.reset());
    }

    #[test]
    fn zero_precision_disables_snapping() {
        assert_eq!(quantize(0.123_456, 0.0), 0.123_456);
    }

    #[test]
    fn range_well_formed() {
        assert!(ValueRange::new(0.0, 1.0).is_well_formed());
        assert!(ValueRange::new(0.5, 0.5).is_well_formed());
        assert!(!ValueRange::new(1.0, 0.0).is_well_formed());
        assert!(!ValueRange::new(f64::NAN, 1.0).is_well_formed());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_keeps_range() {
        let v = size_axis();
        let json = serde_json::to_string(&v).expect("serialize");
        let back: BoundedValue = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, v);
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn write_stays_in_range(requested in -10.0f64..10.0) {
                let mut v = BoundedValue::new(ValueRange::new(0.05, 1.0), 0.01, 1.0);
                v.set(requested);
                prop_assert!(v.value() >= v.min() && v.value() <= v.max());
            }

            #[test]
            fn quantize_is_idempotent(requested in -10.0f64..10.0) {
                let once = quantize(requested, 0.01);
                prop_assert_eq!(quantize(once, 0.01).to_bits(), once.to_bits());
            }
        }
    }
}
