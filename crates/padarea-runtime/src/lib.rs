#![forbid(unsafe_code)]

//! padarea Runtime
//!
//! The reactive half of padarea: the usable-area model, the aspect-ratio
//! lock controller and the turn scheduler that defers their corrections.
//!
//! # Key Components
//!
//! - [`AreaModel`] - Offset and size fields with change events and a
//!   within-bounds flag
//! - [`AspectRatioController`] - Keeps the aspect ratio and the size pair
//!   consistent, with or without the lock
//! - [`Scheduler`] / [`PendingSlot`] - Cancellable tasks deferred to the
//!   next turn of the host loop
//! - [`CalibrationSession`] - The three above wired from one [`AreaConfig`]
//! - [`Observable`] / [`Signal`] / [`Subscription`] - Observer plumbing
//!
//! # Role in padarea
//! `padarea-runtime` builds on the plain value types of `padarea-core`. It
//! renders nothing: a host feeds user input into a session, calls
//! [`CalibrationSession::run_turn`] once per loop iteration and redraws from
//! the session's notifications.
//!
//! Everything here is single-threaded and `!Send`.

pub mod area_model;
pub mod aspect;
pub mod cancellation;
pub mod config;
pub mod reactive;
pub mod scheduler;
pub mod session;

pub use area_model::{AreaModel, SizeChange, SizeEdit};
pub use aspect::{AspectRatioController, ControllerState};
pub use cancellation::{CancellationSource, CancellationToken, TaskState};
pub use config::{
    AreaConfig, AreaConfigError, DEFAULT_PRECISION, MAX_ASPECT_RATIO, MIN_AREA_SIZE,
    REFERENCE_EXTENT,
};
pub use reactive::{Observable, Signal, Subscription};
pub use scheduler::{PendingSlot, Scheduler, TaskHandle, TaskId};
pub use session::CalibrationSession;
