//! Configuration errors reported by session setup and the between-run setters.
//!
//! Tracing itself never fails: rays that do not converge are kept and flagged,
//! receivers without eigenrays get an empty list. Only malformed input is an
//! error, and it is always reported before any ray is launched.

use thiserror::Error;

/// Errors raised while validating an environment or run configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A sound-speed profile needs at least two samples.
    #[error("sound speed profile has {count} samples, at least 2 are required")]
    TooFewSamples { count: usize },

    /// Depths, ranges or grid axes must increase strictly.
    #[error("{what} must be strictly increasing (index {index}: {previous} then {value})")]
    NotIncreasing {
        what: &'static str,
        index: usize,
        previous: f64,
        value: f64,
    },

    /// A value that must be positive and finite was not.
    #[error("{what} must be positive and finite, got {value}")]
    NotPositive { what: &'static str, value: f64 },

    /// A value that must be finite was NaN or infinite.
    #[error("{what} must be finite, got {value}")]
    NotFinite { what: &'static str, value: f64 },

    /// The sound-speed profile does not span the water column.
    #[error(
        "sound speed profile covers {ssp_top}..{ssp_bottom} m but boundaries span {water_top}..{water_bottom} m"
    )]
    ProfileTooShallow {
        ssp_top: f64,
        ssp_bottom: f64,
        water_top: f64,
        water_bottom: f64,
    },

    /// The top boundary sits on or below the bottom boundary.
    #[error("top boundary ({top} m) is not above bottom boundary ({bottom} m) at {location}")]
    BoundariesCross {
        top: f64,
        bottom: f64,
        location: String,
    },

    /// A collection that must have content was empty.
    #[error("{what} must not be empty")]
    Empty { what: &'static str },

    /// Array lengths that must agree do not.
    #[error("{what}: expected {expected} values, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The profile type is not available for this boundary geometry.
    #[error("{profile} sound speed profile is not supported with {geometry} boundaries")]
    UnsupportedProfile {
        profile: &'static str,
        geometry: &'static str,
    },

    /// A source or receiver lies outside the water column.
    #[error("{what} at depth {depth} m lies outside the water column ({top}..{bottom} m)")]
    OutsideWaterColumn {
        what: &'static str,
        depth: f64,
        top: f64,
        bottom: f64,
    },

    /// A parameter is outside its accepted range.
    #[error("invalid {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-parameter error.
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    /// Require `value` to be positive and finite.
    pub fn check_positive(what: &'static str, value: f64) -> Result<(), Self> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::NotPositive { what, value })
        }
    }

    /// Require `value` to be finite.
    pub fn check_finite(what: &'static str, value: f64) -> Result<(), Self> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self::NotFinite { what, value })
        }
    }

    /// Require `values` to be finite and strictly increasing.
    pub fn check_increasing(what: &'static str, values: &[f64]) -> Result<(), Self> {
        for (index, value) in values.iter().enumerate() {
            Self::check_finite(what, *value)?;
            if index > 0 && *value <= values[index - 1] {
                return Err(Self::NotIncreasing {
                    what,
                    index,
                    previous: values[index - 1],
                    value: *value,
                });
            }
        }
        Ok(())
    }
}
