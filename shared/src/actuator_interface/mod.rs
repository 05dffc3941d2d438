//! Actuator abstraction layer for the jet search controller
//!
//! Provides a single-axis motion interface that can be backed by a mock
//! (for unit tests), the harness simulator, or a real motor driver.

pub mod mock;

use thiserror::Error;

pub use mock::MockActuator;

/// Error type for actuator operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActuatorError {
    /// Controller or motor reported a fault
    #[error("hardware fault: {0}")]
    HardwareFault(String),

    /// Target lies outside the physical travel range
    #[error("target {target:.4} outside travel range [{min:.4}, {max:.4}]")]
    OutOfRange {
        /// Requested target position
        target: f64,
        /// Lower travel bound
        min: f64,
        /// Upper travel bound
        max: f64,
    },

    /// Move did not settle in time
    #[error("move to {target:.4} timed out")]
    Timeout {
        /// Requested target position
        target: f64,
    },
}

/// Result type for actuator operations
pub type ActuatorResult<T> = Result<T, ActuatorError>;

/// Single-axis linear actuator ("motor") capability.
///
/// Moves are blocking: `move_to` returns only after the motor has settled and
/// reports the position it settled at, which may differ slightly from the
/// requested target.
pub trait ActuatorInterface {
    /// Move to an absolute position and wait for the move to complete.
    fn move_to(&mut self, target: f64) -> ActuatorResult<f64>;

    /// Current position reading.
    fn position(&self) -> ActuatorResult<f64>;
}

impl<T: ActuatorInterface + ?Sized> ActuatorInterface for Box<T> {
    fn move_to(&mut self, target: f64) -> ActuatorResult<f64> {
        (**self).move_to(target)
    }

    fn position(&self) -> ActuatorResult<f64> {
        (**self).position()
    }
}
