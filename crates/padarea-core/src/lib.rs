#![forbid(unsafe_code)]

//! Core: bounded scalars and normalized geometry for usable-area calibration.
//!
//! # Role in padarea
//! `padarea-core` holds the plain data the calibration engine works on. It
//! has no notion of change notification or scheduling; those live in
//! `padarea-runtime`, which builds the area model and the aspect-ratio
//! controller on top of these types.
//!
//! # Primary responsibilities
//! - **BoundedValue**: a scalar clamped into a range and snapped to a step.
//! - **Geometry**: `Vec2`, `Rect` and the inset containment test
//!   used for the "within bounds" signal.
//! - **AspectLabel**: the reduced `w:h` text shown next to the area.

pub mod bounded;
pub mod geometry;
pub mod ratio;

pub use bounded::{BoundedValue, ValueRange, quantize};
pub use geometry::{Axis, Rect, Vec2};
pub use ratio::{AspectLabel, gcd};
