use crate::config::AlgorithmKind;
use std::fmt;
use std::sync::Arc;

/// Status events emitted for the UI / event bus layer
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The motor settled at a new position
    PositionChanged { position: f64 },
    /// A scan exhausted its step budget without beating the baseline
    NoImprovement { original_position: f64 },
    /// A scan is restarting with a smaller step
    Retrying { attempt: u32, step_size: f64 },
    /// The active search finished on its own
    SearchCompleted {
        algorithm: AlgorithmKind,
        best_position: f64,
        best_intensity: Option<f64>,
    },
    /// The operator stopped the search
    SearchCancelled {
        algorithm: AlgorithmKind,
        best_position: f64,
    },
}

impl fmt::Display for SearchEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchEvent::PositionChanged { position } => {
                write!(f, "position changed to {position:.4}")
            }
            SearchEvent::NoImprovement { original_position } => write!(
                f,
                "no improvement found, reverting to original position {original_position:.4}"
            ),
            SearchEvent::Retrying { attempt, step_size } => write!(
                f,
                "retrying with smaller step, attempt {attempt} (step size {step_size:.4})"
            ),
            SearchEvent::SearchCompleted {
                algorithm,
                best_position,
                best_intensity,
            } => match best_intensity {
                Some(intensity) => write!(
                    f,
                    "{algorithm} complete at {best_position:.4} (intensity {intensity:.3})"
                ),
                None => write!(f, "{algorithm} complete at {best_position:.4}"),
            },
            SearchEvent::SearchCancelled {
                algorithm,
                best_position,
            } => write!(f, "{algorithm} stopped at {best_position:.4}"),
        }
    }
}

/// Callback ID for registration/deregistration
pub type CallbackId = u64;

/// Callback function type
pub type SearchCallback = Arc<dyn Fn(&SearchEvent) + Send + Sync>;
