#![forbid(unsafe_code)]

//! The collaborator-facing surface of one calibration session.
//!
//! A [`CalibrationSession`] wires an [`AreaModel`], an
//! [`AspectRatioController`] and a [`Scheduler`] together from one
//! validated [`AreaConfig`]. Renderers read values and subscribe to
//! changes; input handlers call the setters; the host loop calls
//! [`CalibrationSession::run_turn`] once per iteration.
//!
//! ```
//! use padarea_core::Vec2;
//! use padarea_runtime::{AreaConfig, CalibrationSession};
//!
//! let session = CalibrationSession::new(AreaConfig::default())?;
//! session.set_aspect_ratio(2.0);
//! assert!(session.pending_correction());
//!
//! session.settle();
//! assert_eq!(session.current_size(), Vec2::new(1.0, 0.5));
//! assert!(session.is_locked());
//! assert_eq!(session.area_label().to_string(), "2:1");
//! # Ok::<(), padarea_runtime::AreaConfigError>(())
//! ```

use padarea_core::{AspectLabel, Rect, Vec2};

use crate::area_model::{AreaModel, SizeChange};
use crate::aspect::{AspectRatioController, ControllerState};
use crate::config::{AreaConfig, AreaConfigError};
use crate::reactive::Subscription;
use crate::scheduler::Scheduler;

/// One calibration session. Single-threaded (`!Send`).
#[derive(Debug)]
pub struct CalibrationSession {
    config: AreaConfig,
    scheduler: Scheduler,
    model: AreaModel,
    controller: AspectRatioController,
}

impl CalibrationSession {
    /// Validate `config` and build a session at its defaults.
    pub fn new(config: AreaConfig) -> Result<Self, AreaConfigError> {
        let config = config.validated()?;
        Ok(Self::build(config))
    }

    fn build(config: AreaConfig) -> Self {
        let scheduler = Scheduler::new();
        let model = AreaModel::from_checked(&config);
        let controller =
            AspectRatioController::from_checked(model.clone(), scheduler.clone(), &config);
        tracing::info!(
            offset_range = ?config.offset_range,
            size_range = ?config.size_range,
            aspect_range = ?config.aspect_range,
            precision = config.precision,
            "calibration session started"
        );
        Self {
            config,
            scheduler,
            model,
            controller,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AreaConfig {
        &self.config
    }

    #[must_use]
    pub fn model(&self) -> &AreaModel {
        &self.model
    }

    #[must_use]
    pub fn controller(&self) -> &AspectRatioController {
        &self.controller
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    // --- reads -------------------------------------------------------------

    #[must_use]
    pub fn current_offset(&self) -> Vec2 {
        self.model.offset()
    }

    #[must_use]
    pub fn current_size(&self) -> Vec2 {
        self.model.size()
    }

    #[must_use]
    pub fn current_aspect_ratio(&self) -> f64 {
        self.controller.aspect_ratio()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.controller.is_locked()
    }

    /// Whether the area fits `outer` (inset by the configured margin).
    #[must_use]
    pub fn is_within_bounds(&self, outer: Rect) -> bool {
        self.model.is_within_bounds(outer)
    }

    /// Whether the area fits the configured reference region.
    #[must_use]
    pub fn within_bounds(&self) -> bool {
        self.model.within_bounds()
    }

    #[must_use]
    pub fn pending_correction(&self) -> bool {
        self.controller.state() == ControllerState::CorrectionPending
    }

    /// Reduced `w:h` label of the area at reference scale.
    #[must_use]
    pub fn area_label(&self) -> AspectLabel {
        AspectLabel::from_size(self.model.size(), self.config.reference_size)
    }

    // --- writes ------------------------------------------------------------

    pub fn set_offset_x(&self, x: f64) -> bool {
        self.model.set_offset_x(x)
    }

    pub fn set_offset_y(&self, y: f64) -> bool {
        self.model.set_offset_y(y)
    }

    pub fn set_size_x(&self, x: f64) -> bool {
        self.model.set_size_x(x)
    }

    pub fn set_size_y(&self, y: f64) -> bool {
        self.model.set_size_y(y)
    }

    pub fn set_aspect_ratio(&self, ratio: f64) -> bool {
        self.controller.set_aspect_ratio(ratio)
    }

    pub fn set_locked(&self, locked: bool) -> bool {
        self.controller.set_locked(locked)
    }

    /// Put offset and size back to their defaults and drop any pending
    /// correction. The lock flag is kept.
    pub fn reset_to_defaults(&self) {
        self.controller.reset();
    }

    // --- turn driving ------------------------------------------------------

    /// Run one turn of deferred work. Returns how many tasks ran.
    pub fn run_turn(&self) -> usize {
        self.scheduler.run_turn()
    }

    /// Run turns until no correction is pending, up to the configured limit.
    pub fn settle(&self) -> usize {
        self.scheduler.run_until_idle(self.config.max_settle_turns)
    }

    // --- notifications -----------------------------------------------------

    pub fn subscribe_offset(&self, callback: impl Fn(&Vec2) + 'static) -> Subscription {
        self.model.subscribe_offset(callback)
    }

    pub fn subscribe_size(&self, callback: impl Fn(&SizeChange) + 'static) -> Subscription {
        self.model.subscribe_size(callback)
    }

    pub fn subscribe_bounds(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.model.subscribe_bounds(callback)
    }

    pub fn subscribe_aspect_ratio(&self, callback: impl Fn(&f64) + 'static) -> Subscription {
        self.controller.subscribe_aspect_ratio(callback)
    }

    pub fn subscribe_locked(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.controller.subscribe_locked(callback)
    }
}

impl Default for CalibrationSession {
    fn default() -> Self {
        Self::build(AreaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padarea_core::ValueRange;

    #[test]
    fn default_session_is_idle_at_full_area() {
        let session = CalibrationSession::default();
        assert_eq!(session.current_offset(), Vec2::new(0.0, 0.0));
        assert_eq!(session.current_size(), Vec2::new(1.0, 1.0));
        assert_eq!(session.current_aspect_ratio(), 1.0);
        assert!(!session.is_locked());
        assert!(session.within_bounds());
        assert!(!session.pending_correction());
        assert_eq!(session.area_label().to_string(), "1:1");
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = AreaConfig {
            size_range: ValueRange::new(0.0, 1.0),
            ..AreaConfig::default()
        };
        let err = CalibrationSession::new(config).unwrap_err();
        assert!(matches!(err, AreaConfigError::Validation(_)));
    }

    #[test]
    fn pending_correction_tracks_the_turn() {
        let session = CalibrationSession::default();
        session.set_locked(true);
        session.set_size_x(0.5);
        assert!(session.pending_correction());
        assert_eq!(session.run_turn(), 1);
        assert!(!session.pending_correction());
        assert_eq!(session.settle(), 0);
    }

    #[test]
    fn label_reduces_wide_area() {
        let session = CalibrationSession::default();
        session.set_size_y(0.45);
        session.set_size_x(0.8);
        assert_eq!(session.area_label().to_string(), "16:9");
    }
}
