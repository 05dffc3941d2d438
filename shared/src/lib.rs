//! Shared components for the jet search crates.
//!
//! This crate contains the actuator capability, the measurement log and the
//! session configuration that both the search core and the simulation
//! harness depend on, plus small numeric and storage utilities.

pub mod actuator_interface;
pub mod algo;
pub mod config_storage;
pub mod limits_arg;
pub mod measurement_log;
pub mod session_config;

pub use actuator_interface::{ActuatorError, ActuatorInterface, ActuatorResult, MockActuator};
pub use measurement_log::{Measurement, MeasurementLog};
pub use session_config::{SessionConfig, SessionConfigError};
