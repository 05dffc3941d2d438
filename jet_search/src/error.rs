use shared::{ActuatorError, SessionConfigError};
use thiserror::Error;

/// Errors produced by the jet search controller.
///
/// Search outcomes such as "no improvement found" are not errors; they finish
/// the session and are reported through [`SearchEvent`](crate::SearchEvent)s.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The actuator failed to report or reach a position.
    #[error("actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// Session configuration validation failure.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Algorithm name does not match any known search.
    #[error("unknown search algorithm: {0:?}")]
    UnknownAlgorithm(String),
}

impl From<SessionConfigError> for SearchError {
    fn from(err: SessionConfigError) -> Self {
        SearchError::InvalidConfig(err.to_string())
    }
}
