#![forbid(unsafe_code)]

//! Policy-as-data configuration for a calibration session.
//!
//! [`AreaConfig`] carries every range, step and default the area model and
//! aspect-ratio controller use. `AreaConfig::default()` reproduces the stock
//! tablet-area panel: offsets in `[0, 1]`, sizes in `[0.05, 1]`, aspect ratio
//! in `[9/21, 21/9]`, a step of `0.01` and a 200x200 reference region.
//!
//! # Loading
//!
//! ```toml
//! # padarea.toml
//! precision = 0.01
//! default_size = { x = 0.8, y = 0.45 }
//!
//! [size_range]
//! min = 0.1
//! max = 1.0
//! ```
//!
//! ```rust,ignore
//! let config = AreaConfig::from_toml_file("padarea.toml")?;
//! let config = AreaConfig::from_json_str(json)?;
//! ```
//!
//! Every loader validates before returning.

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use padarea_core::{Rect, ValueRange, Vec2};

/// Widest supported aspect ratio (and the inverse of the narrowest).
pub const MAX_ASPECT_RATIO: f64 = 21.0 / 9.0;
/// Default quantization step for every field.
pub const DEFAULT_PRECISION: f64 = 0.01;
/// Smallest normalized size on either axis.
pub const MIN_AREA_SIZE: f64 = 0.05;
/// Side length of the square reference region, in device units.
pub const REFERENCE_EXTENT: f64 = 200.0;

/// Ranges, steps and defaults for one calibration session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct AreaConfig {
    /// Range of both offset components.
    pub offset_range: ValueRange,
    /// Range of both size components. `min` must be strictly positive.
    pub size_range: ValueRange,
    /// Range of the aspect ratio.
    pub aspect_range: ValueRange,
    /// Quantization step shared by all fields.
    pub precision: f64,
    pub default_offset: Vec2,
    pub default_size: Vec2,
    /// Size of the outer region used by the within-bounds signal.
    pub reference_size: Vec2,
    /// Margin the area may overshoot the reference region by.
    pub bounds_inset: f64,
    /// Turn limit for `CalibrationSession::settle`.
    pub max_settle_turns: u32,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            offset_range: ValueRange::new(0.0, 1.0),
            size_range: ValueRange::new(MIN_AREA_SIZE, 1.0),
            aspect_range: ValueRange::symmetric_ratio(MAX_ASPECT_RATIO),
            precision: DEFAULT_PRECISION,
            default_offset: Vec2::splat(0.0),
            default_size: Vec2::splat(1.0),
            reference_size: Vec2::splat(REFERENCE_EXTENT),
            bounds_inset: 1.0,
            max_settle_turns: 16,
        }
    }
}

impl AreaConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, AreaConfigError> {
        let config: Self = toml::from_str(s).map_err(AreaConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, AreaConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AreaConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, AreaConfigError> {
        let config: Self = serde_json::from_str(s).map_err(AreaConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AreaConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AreaConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        check_range(&mut errors, "offset_range", self.offset_range);
        check_range(&mut errors, "size_range", self.size_range);
        check_range(&mut errors, "aspect_range", self.aspect_range);

        if !(self.size_range.min > 0.0) {
            errors.push(format!(
                "size_range.min must be > 0, got {}",
                self.size_range.min
            ));
        }
        if !(self.aspect_range.min > 0.0) {
            errors.push(format!(
                "aspect_range.min must be > 0, got {}",
                self.aspect_range.min
            ));
        }
        if !(self.precision.is_finite() && self.precision > 0.0) {
            errors.push(format!("precision must be > 0, got {}", self.precision));
        }
        if !self.default_offset.is_finite() {
            errors.push(format!(
                "default_offset must be finite, got {:?}",
                self.default_offset
            ));
        }
        if !self.default_size.is_finite() {
            errors.push(format!(
                "default_size must be finite, got {:?}",
                self.default_size
            ));
        }
        let reference = self.reference_rect();
        if !self.reference_size.is_finite() || reference.is_empty() {
            errors.push(format!(
                "reference_size must be positive on both axes, got {:?}",
                self.reference_size
            ));
        }
        if !(self.bounds_inset.is_finite() && self.bounds_inset >= 0.0) {
            errors.push(format!(
                "bounds_inset must be >= 0, got {}",
                self.bounds_inset
            ));
        }
        if self.max_settle_turns == 0 {
            errors.push("max_settle_turns must be > 0".into());
        }

        errors
    }

    /// `self` if valid, otherwise the collected validation errors.
    pub fn validated(self) -> Result<Self, AreaConfigError> {
        self.check()?;
        Ok(self)
    }

    /// Borrowing form of [`AreaConfig::validated`].
    pub fn check(&self) -> Result<(), AreaConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AreaConfigError::Validation(errors))
        }
    }

    /// The outer region at the origin, sized by `reference_size`.
    #[must_use]
    pub fn reference_rect(&self) -> Rect {
        Rect::from_size(self.reference_size.x, self.reference_size.y)
    }
}

fn check_range(errors: &mut Vec<String>, name: &str, range: ValueRange) {
    if !range.is_well_formed() {
        errors.push(format!(
            "{name} must be finite with min <= max, got [{}, {}]",
            range.min, range.max
        ));
    }
}

/// Errors that can occur when building or loading an area configuration.
#[derive(Debug)]
pub enum AreaConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for AreaConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "invalid area config: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for AreaConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let errors = AreaConfig::default().validate();
        assert!(errors.is_empty(), "default config invalid: {errors:?}");
    }

    #[test]
    fn default_matches_constants() {
        let config = AreaConfig::default();
        assert_eq!(config.size_range, ValueRange::new(0.05, 1.0));
        assert_eq!(config.aspect_range.max, 21.0 / 9.0);
        assert!((config.aspect_range.min - 9.0 / 21.0).abs() < 1e-12);
        assert_eq!(config.precision, 0.01);
        assert_eq!(config.reference_rect(), Rect::from_size(200.0, 200.0));
    }

    #[test]
    fn zero_size_minimum_is_refused() {
        let config = AreaConfig {
            size_range: ValueRange::new(0.0, 1.0),
            ..AreaConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors, vec!["size_range.min must be > 0, got 0".to_string()]);
    }

    #[test]
    fn inverted_range_is_refused() {
        let config = AreaConfig {
            offset_range: ValueRange::new(1.0, 0.0),
            ..AreaConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("offset_range"));
    }

    #[test]
    fn every_problem_is_listed() {
        let config = AreaConfig {
            precision: 0.0,
            aspect_range: ValueRange::new(-1.0, 2.0),
            reference_size: Vec2::new(200.0, 0.0),
            max_settle_turns: 0,
            ..AreaConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("precision")));
        assert!(errors.iter().any(|e| e.starts_with("aspect_range.min")));
        assert!(errors.iter().any(|e| e.starts_with("reference_size")));
        assert!(errors.iter().any(|e| e.starts_with("max_settle_turns")));
    }

    #[test]
    fn nan_precision_is_refused() {
        let config = AreaConfig {
            precision: f64::NAN,
            ..AreaConfig::default()
        };
        assert!(matches!(
            config.validated(),
            Err(AreaConfigError::Validation(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn validation_error_display_joins_messages() {
        let err = AreaConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "invalid area config: a; b");
        assert!(std::error::Error::source(&err).is_none());
    }
}
