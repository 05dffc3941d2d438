//! Per-session motion parameters for the jet search.
//!
//! The UI (or a settings file) owns these values and may change them between
//! ticks; every search tick receives a snapshot and validates it before use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a [`SessionConfig`] snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionConfigError {
    /// A limit, step size or tolerance is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite {
        /// Offending field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Step size or tolerance is zero or negative.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Offending field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Motor limits and search resolution for one search session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lower motor limit (mm)
    pub low_limit: f64,
    /// Upper motor limit (mm)
    pub high_limit: f64,
    /// Linear scan step (mm)
    pub step_size: f64,
    /// Bracket width at which ternary search stops (mm)
    pub tolerance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            low_limit: -0.1,
            high_limit: 0.1,
            step_size: 0.01,
            tolerance: 0.001,
        }
    }
}

impl SessionConfig {
    pub fn new(low_limit: f64, high_limit: f64, step_size: f64, tolerance: f64) -> Self {
        Self {
            low_limit,
            high_limit,
            step_size,
            tolerance,
        }
    }

    /// Returns a copy with swapped limits if `low_limit > high_limit`.
    pub fn normalized(&self) -> Self {
        Self {
            low_limit: self.low_limit.min(self.high_limit),
            high_limit: self.low_limit.max(self.high_limit),
            ..*self
        }
    }

    /// Normalizes the limits and checks step size and tolerance.
    pub fn validated(&self) -> Result<Self, SessionConfigError> {
        for (field, value) in [
            ("low_limit", self.low_limit),
            ("high_limit", self.high_limit),
            ("step_size", self.step_size),
            ("tolerance", self.tolerance),
        ] {
            if !value.is_finite() {
                return Err(SessionConfigError::NotFinite { field, value });
            }
        }
        for (field, value) in [("step_size", self.step_size), ("tolerance", self.tolerance)] {
            if value <= 0.0 {
                return Err(SessionConfigError::NotPositive { field, value });
            }
        }
        Ok(self.normalized())
    }

    /// Width of the search range.
    pub fn span(&self) -> f64 {
        (self.high_limit - self.low_limit).abs()
    }

    /// Clamp a position into the (normalized) limits.
    pub fn clamp(&self, position: f64) -> f64 {
        let n = self.normalized();
        position.clamp(n.low_limit, n.high_limit)
    }

    /// Returns a copy whose limits are `[center - half_width, center + half_width]`
    /// intersected with the current limits.
    pub fn narrowed_around(&self, center: f64, half_width: f64) -> Self {
        let n = self.normalized();
        let half_width = half_width.abs();
        Self {
            low_limit: (center - half_width).max(n.low_limit),
            high_limit: (center + half_width).min(n.high_limit),
            ..n
        }
    }
}
