//! Ternary search over the motor range
//!
//! Each cycle samples two interior points of the current bracket and keeps the
//! two thirds that must contain the peak of a unimodal signal:
//!
//! 1. `ComputeMids` - place `mid1`/`mid2` at the bracket thirds, finish if the
//!    bracket is narrower than the tolerance
//! 2. `MoveToMid1` - move to `mid1`
//! 3. `MoveToMid2` - move to `mid2`
//! 4. `Compare` - compare the two readings and drop the losing third
//!
//! A cycle costs two moves and shrinks the bracket to 2/3 of its width, so a
//! noise-free search finishes within `ceil(log_1.5(range / tolerance))` cycles.

use super::{SearchContext, StepSearch};
use crate::error::SearchError;
use crate::state::Lifecycle;
use shared::{MeasurementLog, SessionConfig};
use tracing::{debug, info, warn};

/// Inward shrink applied to the limits when the signal has drifted (mm)
pub const DRIFT_MARGIN: f64 = 0.0005;

/// Consecutive tied comparisons tolerated before narrowing to `[mid1, mid2]`
pub const MAX_CONSECUTIVE_TIES: u32 = 3;

/// Sub-state of a ternary search cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TernaryStep {
    ComputeMids,
    MoveToMid1,
    MoveToMid2,
    Compare,
}

/// Ternary search state
#[derive(Debug, Clone)]
pub struct TernarySearch {
    lifecycle: Lifecycle,
    step: TernaryStep,
    low: f64,
    high: f64,
    mid1: f64,
    mid2: f64,
    max_value: Option<f64>,
    max_position: Option<f64>,
    final_position: Option<f64>,
    /// Winning intensity of every completed comparison, oldest first
    smart_check_vals: Vec<f64>,
    consecutive_ties: u32,
    cycles: usize,
}

impl Default for TernarySearch {
    fn default() -> Self {
        Self::new()
    }
}

impl TernarySearch {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Beginning,
            step: TernaryStep::ComputeMids,
            low: 0.0,
            high: 0.0,
            mid1: 0.0,
            mid2: 0.0,
            max_value: None,
            max_position: None,
            final_position: None,
            smart_check_vals: Vec::new(),
            consecutive_ties: 0,
            cycles: 0,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn current_step(&self) -> TernaryStep {
        self.step
    }

    /// Current `(low, high)` bracket
    pub fn bracket(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    /// Current `(mid1, mid2)` sample points
    pub fn mids(&self) -> (f64, f64) {
        (self.mid1, self.mid2)
    }

    pub fn smart_check_vals(&self) -> &[f64] {
        &self.smart_check_vals
    }

    /// Number of completed comparisons this session
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    fn start_fresh(&mut self, ctx: &mut SearchContext<'_>) {
        info!(
            "Starting ternary search over [{:.4}, {:.4}], tolerance {:.4}",
            ctx.config.low_limit, ctx.config.high_limit, ctx.config.tolerance
        );
        ctx.log.clear();
        self.step = TernaryStep::ComputeMids;
        self.low = ctx.config.low_limit;
        self.high = ctx.config.high_limit;
        self.max_value = None;
        self.max_position = None;
        self.final_position = None;
        self.smart_check_vals.clear();
        self.consecutive_ties = 0;
        self.cycles = 0;
        self.lifecycle = Lifecycle::Running;
    }

    /// Limits the bracket is clamped into this cycle.
    ///
    /// When the first recorded winning intensity is above the newest reading
    /// the signal has drifted; the limits are pulled in by [`DRIFT_MARGIN`].
    fn effective_limits(&self, config: &SessionConfig, log: &MeasurementLog) -> (f64, f64) {
        let (low, high) = (config.low_limit, config.high_limit);
        let drifted = match (self.smart_check_vals.first(), log.last()) {
            (Some(&first), Some(latest)) => first > latest.intensity,
            _ => false,
        };
        if drifted && high - low > 2.0 * DRIFT_MARGIN {
            debug!(
                "Signal drift detected, narrowing limits by {} to [{:.4}, {:.4}]",
                DRIFT_MARGIN,
                low + DRIFT_MARGIN,
                high - DRIFT_MARGIN
            );
            (low + DRIFT_MARGIN, high - DRIFT_MARGIN)
        } else {
            (low, high)
        }
    }

    fn compute_mids(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        let (abs_low, abs_high) = self.effective_limits(&ctx.config, ctx.log);
        self.low = self.low.clamp(abs_low, abs_high);
        self.high = self.high.clamp(abs_low, abs_high);

        let third = (self.high - self.low).abs() / 3.0;
        self.mid1 = self.low + third;
        self.mid2 = self.high - third;
        debug!(
            "Bracket [{:.5}, {:.5}], mids {:.5} / {:.5}",
            self.low, self.high, self.mid1, self.mid2
        );

        if (self.high - self.low).abs() < ctx.config.tolerance {
            let center = (self.high + self.low) * 0.5;
            let settled = ctx.command_move(center)?;
            self.final_position = Some(settled);
            self.lifecycle = Lifecycle::Done;
            info!(
                "Ternary search converged at {:.5} after {} cycles",
                settled, self.cycles
            );
            return Ok(());
        }

        self.step = TernaryStep::MoveToMid1;
        Ok(())
    }

    fn compare(&mut self, log: &MeasurementLog) {
        let Some((at_mid1, at_mid2)) = log.last_two() else {
            warn!("Fewer than two readings logged, keeping bracket unchanged");
            return;
        };
        let (i1, i2) = (at_mid1.intensity, at_mid2.intensity);
        self.cycles += 1;

        if i1 > i2 {
            self.high = self.mid2;
            self.record_winner(i1, at_mid1.position);
        } else if i1 < i2 {
            self.low = self.mid1;
            self.record_winner(i2, at_mid2.position);
        } else {
            self.consecutive_ties += 1;
            debug!("Tied readings ({i1}), attempt {}", self.consecutive_ties);
            if self.consecutive_ties >= MAX_CONSECUTIVE_TIES {
                debug!("Repeated ties, narrowing bracket to the middle third");
                self.low = self.mid1;
                self.high = self.mid2;
                self.consecutive_ties = 0;
            }
        }
    }

    fn record_winner(&mut self, intensity: f64, position: f64) {
        self.consecutive_ties = 0;
        self.max_value = Some(intensity);
        self.max_position = Some(position);
        self.smart_check_vals.push(intensity);
    }
}

impl StepSearch for TernarySearch {
    fn step(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        match self.lifecycle {
            Lifecycle::Done => return Ok(()),
            Lifecycle::Beginning => self.start_fresh(ctx),
            Lifecycle::Running => {}
        }

        match self.step {
            TernaryStep::Compare => {
                self.compare(ctx.log);
                self.step = TernaryStep::ComputeMids;
                self.compute_mids(ctx)
            }
            TernaryStep::ComputeMids => self.compute_mids(ctx),
            TernaryStep::MoveToMid1 => {
                ctx.command_move(self.mid1)?;
                self.step = TernaryStep::MoveToMid2;
                Ok(())
            }
            TernaryStep::MoveToMid2 => {
                ctx.command_move(self.mid2)?;
                self.step = TernaryStep::Compare;
                Ok(())
            }
        }
    }

    fn cancel(&mut self, _ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        if !self.lifecycle.is_done() {
            self.final_position = self.max_position;
            self.lifecycle = Lifecycle::Done;
        }
        Ok(())
    }

    fn restart(&mut self) {
        self.lifecycle = Lifecycle::Beginning;
    }

    fn is_done(&self) -> bool {
        self.lifecycle.is_done()
    }

    fn best_position(&self, _log: &MeasurementLog) -> Option<f64> {
        self.final_position.or(self.max_position)
    }

    fn best_intensity(&self, _log: &MeasurementLog) -> Option<f64> {
        self.max_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::Bench;
    use approx::assert_relative_eq;
    use shared::ActuatorInterface;

    fn parabola(x: f64) -> f64 {
        -(x - 6.0).powi(2)
    }

    #[test]
    fn test_first_step_computes_mids_without_moving() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 9.0, 2.0, 0.1), 0.0);
        let mut search = TernarySearch::new();

        bench.tick(&mut search, parabola).unwrap();

        assert_eq!(search.current_step(), TernaryStep::MoveToMid1);
        assert_eq!(search.bracket(), (0.0, 9.0));
        assert_relative_eq!(search.mids().0, 3.0);
        assert_relative_eq!(search.mids().1, 6.0);
        assert_eq!(bench.motor.move_count(), 0);
        assert!(bench.log.is_empty());
    }

    #[test]
    fn test_cycle_moves_to_mids_and_keeps_winning_side() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 9.0, 2.0, 0.1), 0.0);
        let mut search = TernarySearch::new();

        bench.tick(&mut search, parabola).unwrap();
        bench.tick(&mut search, parabola).unwrap();
        bench.tick(&mut search, parabola).unwrap();
        assert_eq!(bench.motor.moves(), &[3.0, 6.0]);
        assert_eq!(search.current_step(), TernaryStep::Compare);

        // f(3) = -9 < f(6) = 0, so the low third is dropped
        bench.tick(&mut search, parabola).unwrap();
        assert_eq!(search.bracket(), (3.0, 9.0));
        assert_eq!(search.best_intensity(&bench.log), Some(0.0));
        assert_eq!(search.best_position(&bench.log), Some(6.0));
        assert_eq!(search.smart_check_vals(), &[0.0]);
        assert_eq!(search.cycles(), 1);
        assert_eq!(search.current_step(), TernaryStep::MoveToMid1);
    }

    #[test]
    fn test_converges_on_parabola_peak() {
        let config = SessionConfig::new(0.0, 10.0, 2.0, 0.1);
        let mut bench = Bench::new(config, 0.0);
        let mut search = TernarySearch::new();

        bench.run(&mut search, parabola, 200);

        let position = search.best_position(&bench.log).unwrap();
        assert!((position - 6.0).abs() <= 0.1, "converged to {position}");
        let bound = ((10.0_f64 / 0.1).ln() / 1.5_f64.ln()).ceil() as usize;
        assert!(search.cycles() <= bound, "{} cycles", search.cycles());
        assert_eq!(bench.motor.position().unwrap(), position);
    }

    #[test]
    fn test_narrow_range_finishes_immediately() {
        let mut bench = Bench::new(SessionConfig::new(2.0, 2.05, 0.01, 0.1), 0.0);
        let mut search = TernarySearch::new();

        bench.tick(&mut search, parabola).unwrap();

        assert!(search.is_done());
        assert_eq!(bench.motor.move_count(), 1);
        assert_relative_eq!(bench.motor.position().unwrap(), 2.025);
    }

    #[test]
    fn test_drift_narrows_limits() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 1.0, 0.1, 0.01), 0.0);
        let mut search = TernarySearch::new();
        bench.tick(&mut search, |_| 0.0).unwrap();

        search.smart_check_vals = vec![10.0];
        search.low = 0.0;
        search.high = 1.0;
        search.step = TernaryStep::ComputeMids;
        bench.log.push(7.0, 1.0);

        let mut ctx = bench.ctx();
        search.step(&mut ctx).unwrap();

        assert_relative_eq!(search.bracket().0, DRIFT_MARGIN);
        assert_relative_eq!(search.bracket().1, 1.0 - DRIFT_MARGIN);
        let third = (1.0 - 2.0 * DRIFT_MARGIN) / 3.0;
        assert_relative_eq!(search.mids().0, DRIFT_MARGIN + third);
    }

    #[test]
    fn test_no_drift_when_signal_holds() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 1.0, 0.1, 0.01), 0.0);
        let mut search = TernarySearch::new();
        bench.tick(&mut search, |_| 0.0).unwrap();

        search.smart_check_vals = vec![10.0];
        search.step = TernaryStep::ComputeMids;
        bench.log.push(12.0, 1.0);

        let mut ctx = bench.ctx();
        search.step(&mut ctx).unwrap();
        assert_eq!(search.bracket(), (0.0, 1.0));
    }

    #[test]
    fn test_repeated_ties_narrow_to_middle_third() {
        // Flat signal ties on every comparison
        let mut bench = Bench::new(SessionConfig::new(0.0, 12.0, 1.0, 0.5), 0.0);
        let mut search = TernarySearch::new();
        let flat = |_: f64| 1.0;

        for _ in 0..(1 + 3 * MAX_CONSECUTIVE_TIES as usize) {
            bench.tick(&mut search, flat).unwrap();
        }
        assert_eq!(search.bracket(), (4.0, 8.0));

        bench.run(&mut search, flat, 500);
        assert!(search.is_done());
    }

    #[test]
    fn test_done_is_idempotent_until_restart() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 10.0, 2.0, 0.1), 0.0);
        let mut search = TernarySearch::new();
        bench.run(&mut search, parabola, 200);

        let moves = bench.motor.move_count();
        let best = search.best_position(&bench.log);
        for _ in 0..5 {
            bench.tick(&mut search, parabola).unwrap();
        }
        assert_eq!(bench.motor.move_count(), moves);
        assert_eq!(search.best_position(&bench.log), best);

        search.restart();
        bench.tick(&mut search, parabola).unwrap();
        assert_eq!(search.lifecycle(), Lifecycle::Running);
        assert_eq!(search.cycles(), 0);
    }

    #[test]
    fn test_cancel_keeps_best_known_position() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 9.0, 2.0, 0.1), 0.0);
        let mut search = TernarySearch::new();
        for _ in 0..4 {
            bench.tick(&mut search, parabola).unwrap();
        }
        let moves = bench.motor.move_count();

        let mut ctx = bench.ctx();
        search.cancel(&mut ctx).unwrap();

        assert!(search.is_done());
        assert_eq!(search.best_position(&bench.log), Some(6.0));
        assert_eq!(bench.motor.move_count(), moves);
    }

    #[test]
    fn test_failed_move_can_be_retried() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 9.0, 2.0, 0.1), 0.0);
        let mut search = TernarySearch::new();
        bench.tick(&mut search, parabola).unwrap();

        bench.motor.set_fault(Some("stalled".to_string()));
        assert!(bench.tick(&mut search, parabola).is_err());
        assert_eq!(search.current_step(), TernaryStep::MoveToMid1);

        bench.motor.set_fault(None);
        bench.tick(&mut search, parabola).unwrap();
        assert_eq!(search.current_step(), TernaryStep::MoveToMid2);
        assert_eq!(bench.motor.moves(), &[3.0]);
    }
}
