//! Stepwise search algorithms for single-axis intensity maximization
//!
//! Each algorithm is a resumable state machine advanced by one
//! [`StepSearch::step`] call per poll tick. A step issues at most one
//! actuator move; the caller records the resulting intensity in the
//! [`MeasurementLog`] before the next step.
//!
//! - [`ternary`] - Bracket-shrinking ternary search
//! - [`basic_scan`] - Linear sweep with shrink-and-retry
//! - [`linear_ternary`] - Coarse sweep followed by ternary refinement
//! - [`dynamic_linear`] - Index-driven sweep with incremental best tracking

pub mod basic_scan;
pub mod dynamic_linear;
pub mod linear_ternary;
pub mod ternary;

pub use basic_scan::BasicScan;
pub use dynamic_linear::DynamicLinearScan;
pub use linear_ternary::LinearThenTernary;
pub use ternary::{TernarySearch, TernaryStep};

use crate::callback::SearchEvent;
use crate::config::AlgorithmKind;
use crate::error::SearchError;
use shared::{ActuatorInterface, MeasurementLog, SessionConfig};
use tracing::{debug, warn};

/// Amount a failed linear sweep shrinks its step by (mm)
pub const STEP_SHRINK: f64 = 0.02;

/// Step size at or below which a linear scan gives up (mm)
pub const MIN_STEP_SIZE: f64 = 0.02;

/// Absorbs rounding from repeated subtraction of [`STEP_SHRINK`]
pub(crate) const STEP_EPSILON: f64 = 1e-9;

/// Everything an algorithm may touch during one tick
pub struct SearchContext<'a> {
    /// Motor being positioned
    pub actuator: &'a mut dyn ActuatorInterface,
    /// Measurements for the current session (read, cleared on fresh runs)
    pub log: &'a mut MeasurementLog,
    /// Validated configuration snapshot for this tick
    pub config: SessionConfig,
    /// Outbound status events
    pub events: &'a mut Vec<SearchEvent>,
}

impl SearchContext<'_> {
    /// Move to `target` clamped to the session limits and wait for it to settle.
    ///
    /// Emits [`SearchEvent::PositionChanged`] with the settled position.
    pub fn command_move(&mut self, target: f64) -> Result<f64, SearchError> {
        let clamped = self.config.clamp(target);
        if clamped != target {
            warn!(
                "Target {:.4} outside limits [{:.4}, {:.4}], clamped to {:.4}",
                target, self.config.low_limit, self.config.high_limit, clamped
            );
        }
        let settled = self.actuator.move_to(clamped)?;
        debug!("Moved to {:.4} (commanded {:.4})", settled, clamped);
        self.events
            .push(SearchEvent::PositionChanged { position: settled });
        Ok(settled)
    }

    /// Position of the newest logged reading, or the actuator reading if the
    /// log is empty.
    pub fn last_position(&self) -> Result<f64, SearchError> {
        match self.log.last() {
            Some(m) => Ok(m.position),
            None => Ok(self.actuator.position()?),
        }
    }
}

/// A resumable single-step search
pub trait StepSearch {
    /// Advance by one logical action (at most one move).
    fn step(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError>;

    /// Finish the session now with the best-known result.
    fn cancel(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError>;

    /// Return to the beginning; the next step starts a fresh run.
    fn restart(&mut self);

    fn is_done(&self) -> bool;

    /// Best position known so far, if any.
    fn best_position(&self, log: &MeasurementLog) -> Option<f64>;

    /// Intensity observed at the best position, if any.
    fn best_intensity(&self, log: &MeasurementLog) -> Option<f64>;
}

/// The active algorithm's state, one variant per [`AlgorithmKind`]
#[derive(Debug, Clone)]
pub enum SearchAlgorithm {
    TernarySearch(TernarySearch),
    BasicScan(BasicScan),
    LinearThenTernary(LinearThenTernary),
    DynamicLinearScan(DynamicLinearScan),
}

impl SearchAlgorithm {
    /// Fresh state for `kind`
    pub fn new(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::TernarySearch => SearchAlgorithm::TernarySearch(TernarySearch::new()),
            AlgorithmKind::BasicScan => SearchAlgorithm::BasicScan(BasicScan::new()),
            AlgorithmKind::LinearThenTernary => {
                SearchAlgorithm::LinearThenTernary(LinearThenTernary::new())
            }
            AlgorithmKind::DynamicLinearScan => {
                SearchAlgorithm::DynamicLinearScan(DynamicLinearScan::new())
            }
        }
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            SearchAlgorithm::TernarySearch(_) => AlgorithmKind::TernarySearch,
            SearchAlgorithm::BasicScan(_) => AlgorithmKind::BasicScan,
            SearchAlgorithm::LinearThenTernary(_) => AlgorithmKind::LinearThenTernary,
            SearchAlgorithm::DynamicLinearScan(_) => AlgorithmKind::DynamicLinearScan,
        }
    }

    pub fn as_search(&self) -> &dyn StepSearch {
        match self {
            SearchAlgorithm::TernarySearch(s) => s,
            SearchAlgorithm::BasicScan(s) => s,
            SearchAlgorithm::LinearThenTernary(s) => s,
            SearchAlgorithm::DynamicLinearScan(s) => s,
        }
    }

    pub fn as_search_mut(&mut self) -> &mut dyn StepSearch {
        match self {
            SearchAlgorithm::TernarySearch(s) => s,
            SearchAlgorithm::BasicScan(s) => s,
            SearchAlgorithm::LinearThenTernary(s) => s,
            SearchAlgorithm::DynamicLinearScan(s) => s,
        }
    }
}
