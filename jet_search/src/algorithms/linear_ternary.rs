//! Coarse linear sweep followed by a ternary refinement
//!
//! The [`BasicScan`] locates the peak to within one step; the
//! [`TernarySearch`] then runs over `[best - step, best + step]` (clamped to
//! the session limits) until the bracket is narrower than the tolerance.

use super::{BasicScan, SearchContext, StepSearch, TernarySearch};
use crate::error::SearchError;
use crate::state::Lifecycle;
use shared::{MeasurementLog, SessionConfig};
use tracing::info;

#[derive(Debug, Clone)]
pub struct LinearThenTernary {
    lifecycle: Lifecycle,
    scan: BasicScan,
    ternary: TernarySearch,
    /// Narrowed limits for the refinement, fixed once the scan finishes
    refine_config: Option<SessionConfig>,
    /// Best known position and intensity pinned by a cancel
    result_position: Option<f64>,
    result_intensity: Option<f64>,
}

impl Default for LinearThenTernary {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearThenTernary {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Beginning,
            scan: BasicScan::new(),
            ternary: TernarySearch::new(),
            refine_config: None,
            result_position: None,
            result_intensity: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn scan(&self) -> &BasicScan {
        &self.scan
    }

    pub fn ternary(&self) -> &TernarySearch {
        &self.ternary
    }

    /// Limits the ternary refinement runs over, once the scan has finished
    pub fn refine_config(&self) -> Option<SessionConfig> {
        self.refine_config
    }

    fn start_fresh(&mut self) {
        self.scan = BasicScan::new();
        self.ternary = TernarySearch::new();
        self.refine_config = None;
        self.result_position = None;
        self.result_intensity = None;
        self.lifecycle = Lifecycle::Running;
    }

    fn refine_config_for(&mut self, ctx: &SearchContext<'_>) -> Result<SessionConfig, SearchError> {
        if let Some(config) = self.refine_config {
            return Ok(config);
        }
        let center = match self.scan.best_position(ctx.log) {
            Some(position) => position,
            None => ctx.last_position()?,
        };
        let half_width = self.scan.step_size().max(ctx.config.tolerance);
        let config = ctx.config.narrowed_around(center, half_width);
        info!(
            "Scan finished at {:.4}, refining over [{:.4}, {:.4}]",
            center, config.low_limit, config.high_limit
        );
        self.refine_config = Some(config);
        Ok(config)
    }
}

impl StepSearch for LinearThenTernary {
    fn step(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        match self.lifecycle {
            Lifecycle::Done => return Ok(()),
            Lifecycle::Beginning => self.start_fresh(),
            Lifecycle::Running => {}
        }

        if !self.scan.is_done() {
            return self.scan.step(ctx);
        }

        let refine = self.refine_config_for(ctx)?;
        let session = ctx.config;
        ctx.config = refine;
        let result = self.ternary.step(ctx);
        ctx.config = session;
        result?;

        if self.ternary.is_done() {
            self.lifecycle = Lifecycle::Done;
        }
        Ok(())
    }

    fn cancel(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        if self.lifecycle.is_done() {
            return Ok(());
        }
        let position = match self.best_position(ctx.log) {
            Some(position) => position,
            None => ctx.last_position()?,
        };
        self.result_intensity = self.best_intensity(ctx.log);
        self.result_position = Some(position);
        self.lifecycle = Lifecycle::Done;
        Ok(())
    }

    fn restart(&mut self) {
        self.lifecycle = Lifecycle::Beginning;
    }

    fn is_done(&self) -> bool {
        self.lifecycle.is_done()
    }

    fn best_position(&self, log: &MeasurementLog) -> Option<f64> {
        self.result_position
            .or_else(|| self.ternary.best_position(log))
            .or_else(|| self.scan.best_position(log))
    }

    fn best_intensity(&self, log: &MeasurementLog) -> Option<f64> {
        self.result_intensity
            .or_else(|| self.ternary.best_intensity(log))
            .or_else(|| self.scan.best_intensity(log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::Bench;
    use approx::assert_relative_eq;
    use shared::ActuatorInterface;

    fn peak_at(center: f64) -> impl Fn(f64) -> f64 {
        move |x| -(x - center).powi(2)
    }

    #[test]
    fn test_refines_between_grid_points() {
        let config = SessionConfig::new(0.0, 10.0, 2.0, 0.05);
        let mut bench = Bench::new(config, 0.0);
        let mut search = LinearThenTernary::new();

        bench.run(&mut search, peak_at(6.7), 500);

        assert!(search.scan().is_done());
        assert_eq!(search.scan().best_position(&bench.log), Some(6.0));
        let refine = search.refine_config().unwrap();
        assert_relative_eq!(refine.low_limit, 4.0);
        assert_relative_eq!(refine.high_limit, 8.0);

        let best = search.best_position(&bench.log).unwrap();
        assert!((best - 6.7).abs() <= 0.05, "refined to {best}");
        assert_eq!(bench.motor.position().unwrap(), best);
    }

    #[test]
    fn test_refinement_stays_inside_session_limits() {
        let config = SessionConfig::new(0.0, 10.0, 2.0, 0.05);
        let mut bench = Bench::new(config, 5.0);
        let mut search = LinearThenTernary::new();

        bench.run(&mut search, peak_at(-3.0), 500);

        let refine = search.refine_config().unwrap();
        assert_eq!(refine.low_limit, 0.0);
        assert_relative_eq!(refine.high_limit, 2.0);
        for &target in bench.motor.moves() {
            assert!((0.0..=10.0).contains(&target));
        }
        assert!(search.best_position(&bench.log).unwrap() < 0.05);
    }

    #[test]
    fn test_best_falls_back_to_scan_before_refinement() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 10.0, 2.0, 0.05), 0.0);
        let mut search = LinearThenTernary::new();
        for _ in 0..4 {
            bench.tick(&mut search, peak_at(4.0)).unwrap();
        }
        assert!(!search.scan().is_done());
        assert_eq!(search.best_position(&bench.log), Some(4.0));

        let mut ctx = bench.ctx();
        search.cancel(&mut ctx).unwrap();
        assert!(search.is_done());
        assert_eq!(search.best_position(&bench.log), Some(4.0));
    }

    #[test]
    fn test_cancel_pins_best_position() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 10.0, 2.0, 0.05), 0.0);
        let mut search = LinearThenTernary::new();
        for _ in 0..3 {
            bench.tick(&mut search, peak_at(2.0)).unwrap();
        }
        let mut ctx = bench.ctx();
        search.cancel(&mut ctx).unwrap();
        assert_eq!(search.best_position(&bench.log), Some(2.0));
        assert_eq!(search.best_intensity(&bench.log), Some(0.0));

        // A brighter reading arriving after the cancel changes nothing
        let parked = bench.motor.position().unwrap();
        bench.log.push(50.0, parked);
        assert_eq!(search.best_position(&bench.log), Some(2.0));
        assert_eq!(search.best_intensity(&bench.log), Some(0.0));

        search.restart();
        bench.tick(&mut search, peak_at(2.0)).unwrap();
        assert!(!search.is_done());
        assert_eq!(search.result_position, None);
    }

    #[test]
    fn test_restart_runs_scan_again() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 10.0, 2.0, 0.05), 0.0);
        let mut search = LinearThenTernary::new();
        bench.run(&mut search, peak_at(6.0), 500);

        search.restart();
        bench.tick(&mut search, peak_at(6.0)).unwrap();

        assert!(!search.scan().is_done());
        assert_eq!(search.refine_config(), None);
        assert_eq!(bench.motor.position().unwrap(), 0.0);
    }
}
