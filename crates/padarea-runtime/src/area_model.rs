#![forbid(unsafe_code)]

//! The usable-area rectangle: four bounded fields with change events.
//!
//! [`AreaModel`] owns offset-X, offset-Y, size-X and size-Y. Every write is
//! snapped and clamped by the field's [`BoundedValue`]; a write that does
//! not change the stored value emits nothing.
//!
//! # Event order
//!
//! A write first updates state, then refreshes the within-bounds flag
//! (which notifies only when it flips), then emits the offset or size
//! event. No borrow of the model is held while any callback runs, so
//! subscribers may read or write the model freely.

use std::cell::RefCell;
use std::rc::Rc;

use padarea_core::{Axis, BoundedValue, Rect, Vec2};

use crate::config::{AreaConfig, AreaConfigError};
use crate::reactive::{Observable, Signal, Subscription};

/// Which size axes a write changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeEdit {
    X,
    Y,
    Both,
}

impl SizeEdit {
    fn from_changes(x: bool, y: bool) -> Option<Self> {
        match (x, y) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::X),
            (false, true) => Some(Self::Y),
            (false, false) => None,
        }
    }

    /// The axis treated as edited last. A `Both` edit counts as Y.
    #[must_use]
    pub const fn anchor_axis(self) -> Axis {
        match self {
            Self::X => Axis::X,
            Self::Y | Self::Both => Axis::Y,
        }
    }
}

/// Payload of the size-changed event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeChange {
    /// Size after the write.
    pub size: Vec2,
    pub edited: SizeEdit,
}

#[derive(Debug, Clone, Copy)]
struct AreaState {
    offset_x: BoundedValue,
    offset_y: BoundedValue,
    size_x: BoundedValue,
    size_y: BoundedValue,
}

impl AreaState {
    fn offset(&self) -> Vec2 {
        Vec2::new(self.offset_x.value(), self.offset_y.value())
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.size_x.value(), self.size_y.value())
    }
}

struct AreaInner {
    state: RefCell<AreaState>,
    reference: Rect,
    inset: f64,
    offset_changed: Signal<Vec2>,
    size_changed: Signal<SizeChange>,
    within_bounds: Observable<bool>,
}

/// Shared handle to the area fields.
///
/// Cloning yields another handle to the same model.
#[derive(Clone)]
pub struct AreaModel {
    inner: Rc<AreaInner>,
}

impl std::fmt::Debug for AreaModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("AreaModel")
            .field("offset", &state.offset())
            .field("size", &state.size())
            .field("within_bounds", &self.inner.within_bounds.get())
            .finish()
    }
}

impl AreaModel {
    /// Build a model at the configured defaults.
    ///
    /// Refuses a config that fails [`AreaConfig::validate`].
    pub fn new(config: &AreaConfig) -> Result<Self, AreaConfigError> {
        config.check()?;
        Ok(Self::from_checked(config))
    }

    pub(crate) fn from_checked(config: &AreaConfig) -> Self {
        let offset = |v| BoundedValue::new(config.offset_range, config.precision, v);
        let size = |v| BoundedValue::new(config.size_range, config.precision, v);
        let state = AreaState {
            offset_x: offset(config.default_offset.x),
            offset_y: offset(config.default_offset.y),
            size_x: size(config.default_size.x),
            size_y: size(config.default_size.y),
        };
        let reference = config.reference_rect();
        let initial = bounds_check(&state, reference, config.bounds_inset);
        Self {
            inner: Rc::new(AreaInner {
                state: RefCell::new(state),
                reference,
                inset: config.bounds_inset,
                offset_changed: Signal::new(),
                size_changed: Signal::new(),
                within_bounds: Observable::new(initial),
            }),
        }
    }

    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.inner.state.borrow().offset()
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.inner.state.borrow().size()
    }

    /// The bounded field behind size on `axis` (a copy).
    #[must_use]
    pub fn size_field(&self, axis: Axis) -> BoundedValue {
        let state = self.inner.state.borrow();
        match axis {
            Axis::X => state.size_x,
            Axis::Y => state.size_y,
        }
    }

    /// `size.x / size.y`. Never divides by zero: the size minimum is
    /// strictly positive.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        let size = self.size();
        size.x / size.y
    }

    /// Write any provided offset components. Returns `true` if the offset
    /// changed (and an event was emitted).
    pub fn set_offset(&self, x: Option<f64>, y: Option<f64>) -> bool {
        let offset = {
            let mut state = self.inner.state.borrow_mut();
            let changed_x = write_field("offset_x", &mut state.offset_x, x);
            let changed_y = write_field("offset_y", &mut state.offset_y, y);
            if !(changed_x || changed_y) {
                return false;
            }
            state.offset()
        };
        self.refresh_bounds();
        self.inner.offset_changed.emit(&offset);
        true
    }

    pub fn set_offset_x(&self, x: f64) -> bool {
        self.set_offset(Some(x), None)
    }

    pub fn set_offset_y(&self, y: f64) -> bool {
        self.set_offset(None, Some(y))
    }

    /// Write any provided size components. Returns `true` if the size
    /// changed (and an event was emitted).
    pub fn set_size(&self, x: Option<f64>, y: Option<f64>) -> bool {
        let change = {
            let mut state = self.inner.state.borrow_mut();
            let changed_x = write_field("size_x", &mut state.size_x, x);
            let changed_y = write_field("size_y", &mut state.size_y, y);
            let Some(edited) = SizeEdit::from_changes(changed_x, changed_y) else {
                return false;
            };
            SizeChange {
                size: state.size(),
                edited,
            }
        };
        self.refresh_bounds();
        self.inner.size_changed.emit(&change);
        true
    }

    pub fn set_size_x(&self, x: f64) -> bool {
        self.set_size(Some(x), None)
    }

    pub fn set_size_y(&self, y: f64) -> bool {
        self.set_size(None, Some(y))
    }

    /// Write one size axis.
    pub fn set_size_axis(&self, axis: Axis, value: f64) -> bool {
        match axis {
            Axis::X => self.set_size_x(value),
            Axis::Y => self.set_size_y(value),
        }
    }

    /// Restore every field to its default, emitting the usual events.
    pub fn reset(&self) {
        let (offset, size) = {
            let mut state = self.inner.state.borrow_mut();
            let offset_x = state.offset_x.reset();
            let offset_y = state.offset_y.reset();
            let size_x = state.size_x.reset();
            let size_y = state.size_y.reset();
            let offset = (offset_x || offset_y).then(|| state.offset());
            let size = SizeEdit::from_changes(size_x, size_y).map(|edited| SizeChange {
                size: state.size(),
                edited,
            });
            (offset, size)
        };
        if offset.is_none() && size.is_none() {
            return;
        }
        tracing::debug!("area reset to defaults");
        self.refresh_bounds();
        if let Some(offset) = offset {
            self.inner.offset_changed.emit(&offset);
        }
        if let Some(change) = size {
            self.inner.size_changed.emit(&change);
        }
    }

    /// Whether the area, drawn at `outer`'s scale and shrunk by the
    /// configured inset, lies inside `outer`.
    #[must_use]
    pub fn is_within_bounds(&self, outer: Rect) -> bool {
        bounds_check(&self.inner.state.borrow(), outer, self.inner.inset)
    }

    /// Cached result of [`Self::is_within_bounds`] for the reference region.
    #[must_use]
    pub fn within_bounds(&self) -> bool {
        self.inner.within_bounds.get()
    }

    #[must_use]
    pub fn reference(&self) -> Rect {
        self.inner.reference
    }

    pub fn subscribe_offset(&self, callback: impl Fn(&Vec2) + 'static) -> Subscription {
        self.inner.offset_changed.subscribe(callback)
    }

    pub fn subscribe_size(&self, callback: impl Fn(&SizeChange) + 'static) -> Subscription {
        self.inner.size_changed.subscribe(callback)
    }

    /// Notified only when the within-bounds flag flips.
    pub fn subscribe_bounds(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.within_bounds.subscribe(callback)
    }

    fn refresh_bounds(&self) {
        let inside = self.is_within_bounds(self.inner.reference);
        if self.inner.within_bounds.set(inside) {
            tracing::debug!(within_bounds = inside, "bounds state changed");
        }
    }
}

fn write_field(field: &'static str, target: &mut BoundedValue, requested: Option<f64>) -> bool {
    let Some(requested) = requested else {
        return false;
    };
    if !requested.is_finite() {
        tracing::debug!(field, requested, "ignored non-finite input");
        return false;
    }
    let changed = target.set(requested);
    tracing::trace!(field, requested, stored = target.value(), changed, "area write");
    changed
}

fn bounds_check(state: &AreaState, outer: Rect, inset: f64) -> bool {
    let scale = outer.size();
    let origin = state.offset().scale(scale);
    let size = state.size().scale(scale);
    let selection = Rect::new(
        outer.x + origin.x,
        outer.y + origin.y,
        size.x,
        size.y,
    );
    outer.contains_inset(&selection, inset)
}
