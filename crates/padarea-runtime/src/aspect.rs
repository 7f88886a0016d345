#![forbid(unsafe_code)]

//! Aspect-ratio tracking and the lock that keeps it fixed.
//!
//! [`AspectRatioController`] owns the aspect-ratio value and the lock flag.
//! It listens to the area model's size events and writes corrections back.
//!
//! # Correction protocol
//!
//! A correction is never applied inside the event that asked for it. It is
//! queued on the [`Scheduler`] and stored in a [`PendingSlot`], so a burst
//! of edits within one turn yields one correction reflecting the last edit.
//!
//! - **Free float** (unlocked, `size.x / size.y` within the aspect range):
//!   the ratio is refreshed in place and nothing is queued.
//! - **Follow** (locked, or the free ratio left its range): the axis the
//!   user did not edit is rewritten to `size.x = size.y * ratio` or
//!   `size.y = size.x / ratio`. If that axis saturates, the edited axis is
//!   re-derived from the saturated value.
//! - **Force** (the user edited the ratio itself): the lock is released,
//!   size-Y is fitted to the new ratio (size-X if size-Y cannot take it),
//!   the ratio is recomputed from the result and the lock is engaged.
//!
//! # Invariants
//!
//! 1. Size writes made while a correction is being applied do not
//!    re-trigger the protocol.
//! 2. The pending slot is cleared after every applied correction.
//! 3. Refreshing the ratio from the model never queues a force.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use padarea_core::{Axis, BoundedValue, quantize};
use tracing::field::Empty;
use web_time::Instant;

use crate::area_model::{AreaModel, SizeChange};
use crate::config::{AreaConfig, AreaConfigError};
use crate::reactive::{Observable, Signal, Subscription};
use crate::scheduler::{PendingSlot, Scheduler};

/// Whether a correction is waiting for its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    CorrectionPending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Correction {
    /// Fit the other axis to the locked ratio after an edit on this axis.
    Follow(Axis),
    /// Fit the size to a ratio the user typed in.
    Force(f64),
}

impl Correction {
    const fn kind(self) -> &'static str {
        match self {
            Self::Follow(_) => "follow",
            Self::Force(_) => "force",
        }
    }
}

const fn axis_name(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "x",
        Axis::Y => "y",
    }
}

/// Sets a flag for the lifetime of the guard and restores it on drop.
struct ApplyingGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> ApplyingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for ApplyingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

struct ControllerInner {
    this: Weak<ControllerInner>,
    model: AreaModel,
    scheduler: Scheduler,
    aspect: Cell<BoundedValue>,
    aspect_changed: Signal<f64>,
    locked: Observable<bool>,
    pending: PendingSlot,
    applying: Cell<bool>,
    corrections_applied: Cell<u64>,
    _size_subscription: Subscription,
}

/// Shared handle to the aspect-ratio controller.
///
/// The controller stays subscribed to the model for as long as any handle
/// is alive.
#[derive(Clone)]
pub struct AspectRatioController {
    inner: Rc<ControllerInner>,
}

impl std::fmt::Debug for AspectRatioController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AspectRatioController")
            .field("aspect_ratio", &self.aspect_ratio())
            .field("locked", &self.is_locked())
            .field("state", &self.state())
            .field("corrections_applied", &self.corrections_applied())
            .finish()
    }
}

impl AspectRatioController {
    /// Attach a controller to `model`, deferring corrections on `scheduler`.
    ///
    /// The ratio starts at the model's current `size.x / size.y` and the
    /// lock starts released. Refuses a config that fails
    /// [`AreaConfig::validate`].
    pub fn new(
        model: AreaModel,
        scheduler: Scheduler,
        config: &AreaConfig,
    ) -> Result<Self, AreaConfigError> {
        config.check()?;
        Ok(Self::from_checked(model, scheduler, config))
    }

    pub(crate) fn from_checked(model: AreaModel, scheduler: Scheduler, config: &AreaConfig) -> Self {
        let aspect = BoundedValue::new(config.aspect_range, config.precision, model.aspect_ratio());
        let inner = Rc::new_cyclic(|this: &Weak<ControllerInner>| {
            let listener = this.clone();
            let size_subscription = model.subscribe_size(move |change| {
                if let Some(inner) = listener.upgrade() {
                    inner.on_size_changed(change);
                }
            });
            ControllerInner {
                this: this.clone(),
                model,
                scheduler,
                aspect: Cell::new(aspect),
                aspect_changed: Signal::new(),
                locked: Observable::new(false),
                pending: PendingSlot::new(),
                applying: Cell::new(false),
                corrections_applied: Cell::new(0),
                _size_subscription: size_subscription,
            }
        });
        Self { inner }
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.inner.aspect.get().value()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.locked.get()
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        if self.inner.pending.is_pending() {
            ControllerState::CorrectionPending
        } else {
            ControllerState::Idle
        }
    }

    /// Number of corrections applied since construction.
    #[must_use]
    pub fn corrections_applied(&self) -> u64 {
        self.inner.corrections_applied.get()
    }

    /// A user edit of the ratio. Queues a force correction if the stored
    /// ratio changed.
    pub fn set_aspect_ratio(&self, ratio: f64) -> bool {
        let inner = &self.inner;
        if !ratio.is_finite() {
            tracing::debug!(field = "aspect_ratio", requested = ratio, "ignored non-finite input");
            return false;
        }
        let Some(stored) = inner.store_aspect(ratio) else {
            return false;
        };
        inner.pending.cancel();
        inner.schedule(Correction::Force(stored));
        true
    }

    /// Engage or release the lock. No correction is queued.
    pub fn set_locked(&self, locked: bool) -> bool {
        self.inner.locked.set(locked)
    }

    /// Restore the model's defaults without triggering the protocol and
    /// recompute the ratio. The lock is left as it is.
    pub fn reset(&self) {
        let inner = &self.inner;
        {
            let _applying = ApplyingGuard::enter(&inner.applying);
            inner.model.reset();
        }
        inner.pending.cancel();
        inner.refresh_aspect();
    }

    pub fn subscribe_aspect_ratio(&self, callback: impl Fn(&f64) + 'static) -> Subscription {
        self.inner.aspect_changed.subscribe(callback)
    }

    pub fn subscribe_locked(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.locked.subscribe(callback)
    }
}

impl ControllerInner {
    fn on_size_changed(&self, change: &SizeChange) {
        if self.applying.get() {
            return;
        }
        self.pending.cancel();

        if !self.locked.get() {
            let candidate = change.size.x / change.size.y;
            if self.aspect.get().range().contains(candidate) {
                self.store_aspect(candidate);
                return;
            }
        }

        self.schedule(Correction::Follow(change.edited.anchor_axis()));
    }

    fn schedule(&self, correction: Correction) {
        tracing::debug!(kind = correction.kind(), ?correction, "correction scheduled");
        let this = self.this.clone();
        let handle = self.scheduler.schedule("aspect.correction", move || {
            if let Some(inner) = this.upgrade() {
                inner.apply(correction);
            }
        });
        self.pending.replace(handle);
    }

    fn apply(&self, correction: Correction) {
        let started = Instant::now();
        let span = tracing::debug_span!(
            "area.correction",
            kind = correction.kind(),
            axis = Empty,
            duration_us = Empty
        );
        let _entered = span.enter();

        let corrected = {
            let _applying = ApplyingGuard::enter(&self.applying);
            match correction {
                Correction::Follow(edited) => self.follow(edited),
                Correction::Force(ratio) => self.force(ratio),
            }
        };
        self.pending.cancel();
        self.corrections_applied
            .set(self.corrections_applied.get() + 1);

        span.record("axis", axis_name(corrected));
        span.record("duration_us", started.elapsed().as_micros() as u64);
    }

    /// Returns the axis that was fitted.
    fn follow(&self, edited: Axis) -> Axis {
        let size = self.model.size();
        let ratio = self.aspect.get().value();
        let target = edited.other();
        let proposed = match edited {
            Axis::X => size.x / ratio,
            Axis::Y => size.y * ratio,
        };

        let field = self.model.size_field(target);
        let snapped = quantize(proposed, field.precision());
        if field.range().contains(snapped) {
            self.model.set_size_axis(target, proposed);
        } else {
            let saturated = field.range().clamp(snapped);
            let rederived = match edited {
                Axis::X => saturated * ratio,
                Axis::Y => saturated / ratio,
            };
            tracing::trace!(
                axis = axis_name(target),
                proposed,
                saturated,
                rederived,
                "fitted axis saturated"
            );
            match target {
                Axis::X => self.model.set_size(Some(saturated), Some(rederived)),
                Axis::Y => self.model.set_size(Some(rederived), Some(saturated)),
            };
        }
        target
    }

    /// Returns the axis that was fitted.
    fn force(&self, ratio: f64) -> Axis {
        self.locked.set(false);

        let size = self.model.size();
        let field_y = self.model.size_field(Axis::Y);
        let proposed_y = size.x / ratio;
        let fitted = if field_y.range().contains(quantize(proposed_y, field_y.precision())) {
            self.model.set_size_y(proposed_y);
            Axis::Y
        } else {
            self.model.set_size_x(size.y * ratio);
            Axis::X
        };

        self.refresh_aspect();
        self.locked.set(true);
        fitted
    }

    fn refresh_aspect(&self) {
        self.store_aspect(self.model.aspect_ratio());
    }

    /// Store a ratio without scheduling anything. Returns the stored value
    /// if it changed.
    fn store_aspect(&self, requested: f64) -> Option<f64> {
        let mut aspect = self.aspect.get();
        if !aspect.set(requested) {
            return None;
        }
        self.aspect.set(aspect);
        let stored = aspect.value();
        tracing::trace!(field = "aspect_ratio", requested, stored, "aspect write");
        self.aspect_changed.emit(&stored);
        Some(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padarea_core::{ValueRange, Vec2};
    use std::cell::RefCell;

    struct Fixture {
        model: AreaModel,
        scheduler: Scheduler,
        controller: AspectRatioController,
    }

    fn fixture() -> Fixture {
        fixture_with(AreaConfig::default())
    }

    fn fixture_with(config: AreaConfig) -> Fixture {
        let model = AreaModel::new(&config).unwrap();
        let scheduler = Scheduler::new();
        let controller =
            AspectRatioController::new(model.clone(), scheduler.clone(), &config).unwrap();
        Fixture {
            model,
            scheduler,
            controller,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn starts_unlocked_at_model_ratio() {
        let f = fixture();
        assert!(!f.controller.is_locked());
        assert_eq!(f.controller.aspect_ratio(), 1.0);
        assert_eq!(f.controller.state(), ControllerState::Idle);
    }

    #[test]
    fn free_ratio_updates_in_place() {
        let f = fixture();
        f.model.set_size(Some(0.9), Some(0.9));
        f.model.set_size_x(1.0);

        assert_eq!(f.controller.state(), ControllerState::Idle);
        assert!(approx(f.controller.aspect_ratio(), 1.11));
        assert_eq!(f.scheduler.run_turn(), 0);
        assert_eq!(f.model.size().y, 0.9);
    }

    #[test]
    fn locked_edit_is_corrected_next_turn() {
        let f = fixture();
        f.model.set_size(Some(0.9), Some(0.9));
        f.controller.set_locked(true);

        f.model.set_size_x(0.5);
        assert_eq!(f.controller.state(), ControllerState::CorrectionPending);
        assert_eq!(f.model.size().y, 0.9);

        assert_eq!(f.scheduler.run_turn(), 1);
        assert!(approx(f.model.size().y, 0.5));
        assert_eq!(f.controller.aspect_ratio(), 1.0);
        assert_eq!(f.controller.state(), ControllerState::Idle);
        assert_eq!(f.controller.corrections_applied(), 1);
    }

    #[test]
    fn burst_of_edits_applies_once() {
        let f = fixture();
        f.controller.set_locked(true);
        f.model.set_size_x(0.3);
        f.model.set_size_x(0.4);
        f.model.set_size_x(0.6);

        assert_eq!(f.scheduler.queued(), 1);
        assert_eq!(f.scheduler.run_until_idle(8), 1);
        assert!(approx(f.model.size().x, 0.6));
        assert!(approx(f.model.size().y, 0.6));
        assert_eq!(f.controller.corrections_applied(), 1);
    }

    #[test]
    fn locked_y_edit_corrects_x() {
        let f = fixture();
        f.model.set_size(Some(0.8), Some(0.4));
        assert!(approx(f.controller.aspect_ratio(), 2.0));
        f.controller.set_locked(true);

        f.model.set_size_y(0.3);
        f.scheduler.run_turn();
        assert!(approx(f.model.size().x, 0.6));
    }

    #[test]
    fn saturated_axis_rederives_edited_axis() {
        let f = fixture();
        f.model.set_size(Some(0.8), Some(0.4));
        f.controller.set_locked(true);

        // 0.05 / 2 is under the size minimum, so Y saturates and X follows it.
        f.model.set_size_x(0.05);
        f.scheduler.run_turn();
        assert!(approx(f.model.size().y, 0.05));
        assert!(approx(f.model.size().x, 0.1));
        assert!(approx(f.controller.aspect_ratio(), 2.0));
    }

    #[test]
    fn unlocked_out_of_range_follows_last_ratio() {
        let f = fixture();
        f.model.set_size_y(0.3);
        // 1.0 / 0.3 exceeds 21/9: ratio stays at the last in-range value.
        let before = f.controller.aspect_ratio();
        assert_eq!(f.controller.state(), ControllerState::CorrectionPending);

        f.scheduler.run_turn();
        assert!(!f.controller.is_locked());
        assert!(approx(f.model.size().x, 0.3 * before));
    }

    #[test]
    fn force_fits_height_and_locks() {
        let f = fixture_with(AreaConfig {
            default_size: Vec2::new(1.0, 0.05),
            ..AreaConfig::default()
        });
        // 1.0 / 0.05 is out of range; the stored ratio starts clamped.
        assert!(approx(f.controller.aspect_ratio(), 21.0 / 9.0));
        f.controller.set_locked(true);

        let locks = Rc::new(RefCell::new(Vec::new()));
        let locks_clone = Rc::clone(&locks);
        let _sub = f.controller.subscribe_locked(move |v| locks_clone.borrow_mut().push(*v));

        assert!(f.controller.set_aspect_ratio(2.0));
        f.scheduler.run_until_idle(8);

        assert_eq!(f.model.size(), Vec2::new(1.0, 0.5));
        assert_eq!(f.controller.aspect_ratio(), 2.0);
        assert!(f.controller.is_locked());
        assert_eq!(*locks.borrow(), vec![false, true]);
    }

    #[test]
    fn force_falls_back_to_width() {
        let f = fixture();
        f.model.set_size(Some(0.6), Some(0.5));
        // 0.6 / 0.5 = 1.2 is above the size maximum.
        f.controller.set_aspect_ratio(0.5);
        f.scheduler.run_until_idle(8);

        assert!(approx(f.model.size().x, 0.25));
        assert!(approx(f.model.size().y, 0.5));
        assert_eq!(f.controller.aspect_ratio(), 0.5);
        assert!(f.controller.is_locked());
    }

    #[test]
    fn refreshing_ratio_never_forces() {
        let f = fixture();
        f.model.set_size_x(0.5);
        assert_eq!(f.controller.aspect_ratio(), 0.5);
        assert!(f.scheduler.is_idle());
    }

    #[test]
    fn same_ratio_is_not_an_edit() {
        let f = fixture();
        assert!(!f.controller.set_aspect_ratio(1.0));
        assert!(!f.controller.set_aspect_ratio(f64::NAN));
        assert!(f.scheduler.is_idle());
    }

    #[test]
    fn set_locked_queues_nothing() {
        let f = fixture();
        assert!(f.controller.set_locked(true));
        assert!(!f.controller.set_locked(true));
        assert!(f.scheduler.is_idle());
    }

    #[test]
    fn reset_cancels_pending_and_refreshes_ratio() {
        let f = fixture();
        f.controller.set_locked(true);
        f.model.set_size_x(0.4);
        assert_eq!(f.controller.state(), ControllerState::CorrectionPending);

        f.controller.reset();
        assert_eq!(f.controller.state(), ControllerState::Idle);
        assert_eq!(f.model.size(), Vec2::new(1.0, 1.0));
        assert_eq!(f.controller.aspect_ratio(), 1.0);
        assert!(f.controller.is_locked());
        assert_eq!(f.scheduler.run_turn(), 0);
    }

    #[test]
    fn dropped_controller_stops_listening() {
        let f = fixture();
        let Fixture {
            model,
            scheduler,
            controller,
        } = f;
        drop(controller);
        model.set_size_x(0.4);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn invalid_config_is_refused() {
        let model = AreaModel::new(&AreaConfig::default()).unwrap();
        let config = AreaConfig {
            aspect_range: ValueRange::new(2.0, 0.5),
            ..AreaConfig::default()
        };
        let err = AspectRatioController::new(model.clone(), Scheduler::new(), &config).unwrap_err();
        assert!(matches!(err, AreaConfigError::Validation(_)));

        // Nothing is attached to the model.
        model.set_size_x(0.4);
        assert_eq!(model.size().x, quantize(0.4, 0.01));
        assert_eq!(model.size().y, 1.0);
    }
}
