#![forbid(unsafe_code)]

//! padarea public facade crate.
//!
//! Re-exports the calibration session and the value types it works with,
//! and offers a lightweight prelude for day-to-day usage.
//!
//! ```
//! use padarea::prelude::*;
//!
//! fn build() -> padarea::Result<CalibrationSession> {
//!     Ok(CalibrationSession::new(AreaConfig::default())?)
//! }
//!
//! let session = build()?;
//! session.set_locked(true);
//! session.set_size_x(0.5);
//! session.run_turn();
//! assert_eq!(session.current_size(), Vec2::new(0.5, 0.5));
//! # Ok::<(), padarea::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use padarea_core::{AspectLabel, Axis, BoundedValue, Rect, ValueRange, Vec2, quantize};

// --- Runtime re-exports ----------------------------------------------------

pub use padarea_runtime::{
    AreaConfig, AreaConfigError, AreaModel, AspectRatioController, CalibrationSession,
    ControllerState, Scheduler, SizeChange, SizeEdit, Subscription,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for padarea hosts.
#[derive(Debug)]
pub enum Error {
    /// The area configuration could not be loaded or was rejected.
    Config(AreaConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
        }
    }
}

impl From<AreaConfigError> for Error {
    fn from(err: AreaConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for padarea APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AreaConfig, AspectLabel, CalibrationSession, Error, Rect, Result, SizeChange, SizeEdit,
        Subscription, Vec2,
    };

    pub use crate::{core, runtime};
}

pub use padarea_core as core;
pub use padarea_runtime as runtime;
