//! Index-driven linear sweep
//!
//! Samples the same grid as [`BasicScan`](super::BasicScan) but plans each
//! target from the sweep index instead of the last logged position, so
//! readings taken while the operator jogs the motor between ticks do not
//! shift the grid. The best reading is folded in as entries arrive and
//! survives retries.

use super::{SearchContext, StepSearch, MIN_STEP_SIZE, STEP_EPSILON, STEP_SHRINK};
use crate::callback::SearchEvent;
use crate::error::SearchError;
use crate::state::Lifecycle;
use shared::MeasurementLog;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DynamicLinearScan {
    lifecycle: Lifecycle,
    step: usize,
    step_size: f64,
    retries: u32,
    original_intensity: f64,
    original_position: f64,
    max_value: Option<f64>,
    max_location: Option<f64>,
    /// Number of log entries already folded into the running maximum
    folded: usize,
    result_position: Option<f64>,
}

impl Default for DynamicLinearScan {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicLinearScan {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Beginning,
            step: 1,
            step_size: 0.0,
            retries: 0,
            original_intensity: f64::NEG_INFINITY,
            original_position: 0.0,
            max_value: None,
            max_location: None,
            folded: 0,
            result_position: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Best `(intensity, position)` seen this session
    pub fn max(&self) -> Option<(f64, f64)> {
        self.max_value.zip(self.max_location)
    }

    fn start_fresh(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        let (original_intensity, original_position) = match ctx.log.last() {
            Some(m) => (m.intensity, m.position),
            None => (f64::NEG_INFINITY, ctx.actuator.position()?),
        };
        ctx.command_move(ctx.config.low_limit)?;

        info!(
            "Starting dynamic linear scan over [{:.4}, {:.4}] with step {:.4}",
            ctx.config.low_limit, ctx.config.high_limit, ctx.config.step_size
        );
        ctx.log.clear();
        self.original_intensity = original_intensity;
        self.original_position = original_position;
        self.step = 1;
        self.step_size = ctx.config.step_size;
        self.retries = 0;
        self.max_value = None;
        self.max_location = None;
        self.folded = 0;
        self.result_position = None;
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Fold log entries added since the last tick into the running maximum.
    fn fold_new_readings(&mut self, log: &MeasurementLog) {
        let start = self.folded.min(log.len());
        for m in &log.as_slice()[start..] {
            if m.intensity.is_nan() {
                continue;
            }
            if self.max_value.map_or(true, |best| m.intensity > best) {
                self.max_value = Some(m.intensity);
                self.max_location = Some(m.position);
            }
        }
        self.folded = log.len();
    }

    fn finish_sweep(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        if let Some((value, location)) = self
            .max()
            .filter(|(value, _)| *value > self.original_intensity)
        {
            let settled = ctx.command_move(location)?;
            self.result_position = Some(settled);
            self.lifecycle = Lifecycle::Done;
            info!(
                "Dynamic linear scan found {:.3} at {:.4} after {} retries",
                value, settled, self.retries
            );
            return Ok(());
        }

        let next_step = self.step_size - STEP_SHRINK;
        if next_step <= MIN_STEP_SIZE + STEP_EPSILON {
            let settled = ctx.command_move(self.original_position)?;
            ctx.events.push(SearchEvent::NoImprovement {
                original_position: self.original_position,
            });
            self.result_position = Some(settled);
            self.lifecycle = Lifecycle::Done;
            info!(
                "Dynamic linear scan found no improvement over {:.3}, restored {:.4}",
                self.original_intensity, settled
            );
            return Ok(());
        }

        // The low limit was sampled on the first pass; continue at the next point
        ctx.command_move(ctx.config.low_limit + next_step)?;
        self.step_size = next_step;
        self.retries += 1;
        self.step = 2;
        info!(
            "No improvement after sweep, retrying with step {:.4}",
            next_step
        );
        ctx.events.push(SearchEvent::Retrying {
            attempt: self.retries + 1,
            step_size: next_step,
        });
        Ok(())
    }
}

impl StepSearch for DynamicLinearScan {
    fn step(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        match self.lifecycle {
            Lifecycle::Done => return Ok(()),
            Lifecycle::Beginning => return self.start_fresh(ctx),
            Lifecycle::Running => {}
        }

        self.fold_new_readings(ctx.log);
        if self.retries == 0 {
            self.step_size = ctx.config.step_size;
        }

        let target = ctx.config.low_limit + self.step as f64 * self.step_size;
        if target < ctx.config.high_limit {
            debug!("Sweep point {} at {:.4}", self.step, target);
            ctx.command_move(target)?;
            self.step += 1;
            return Ok(());
        }

        self.finish_sweep(ctx)
    }

    fn cancel(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        if self.lifecycle.is_done() {
            return Ok(());
        }
        self.fold_new_readings(ctx.log);
        self.result_position = self.max_location;
        self.lifecycle = Lifecycle::Done;
        Ok(())
    }

    fn restart(&mut self) {
        self.lifecycle = Lifecycle::Beginning;
    }

    fn is_done(&self) -> bool {
        self.lifecycle.is_done()
    }

    fn best_position(&self, _log: &MeasurementLog) -> Option<f64> {
        self.result_position.or(self.max_location)
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
    use shared::{ActuatorInterface, SessionConfig};

    fn parabola(x: f64) -> f64 {
        -(x - 6.0).powi(2)
    }

    #[test]
    fn test_samples_grid_and_picks_peak() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 10.0, 2.0, 0.1), 0.0);
        let mut scan = DynamicLinearScan::new();

        bench.run(&mut scan, parabola, 50);

        assert_eq!(bench.motor.moves(), &[0.0, 2.0, 4.0, 6.0, 8.0, 6.0]);
        assert_eq!(scan.max(), Some((0.0, 6.0)));
        assert_eq!(scan.best_position(&bench.log), Some(6.0));
    }

    #[test]
    fn test_jog_between_ticks_keeps_grid() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 10.0, 2.0, 0.1), 0.0);
        let mut scan = DynamicLinearScan::new();
        bench.tick(&mut scan, parabola).unwrap();
        bench.tick(&mut scan, parabola).unwrap();
        assert_eq!(bench.motor.position().unwrap(), 2.0);

        // Operator nudges the motor; the reading there still counts
        bench.motor.jog_to(5.5);
        bench.tick(&mut scan, parabola).unwrap();
        assert_eq!(bench.motor.position().unwrap(), 4.0);
        assert_eq!(scan.max(), Some((-0.25, 5.5)));

        bench.run(&mut scan, parabola, 50);
        assert_eq!(scan.best_position(&bench.log), Some(6.0));
    }

    #[test]
    fn test_retry_continues_without_returning_to_low() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 1.0, 0.3, 0.01), 0.5);
        let mut scan = DynamicLinearScan::new();
        bench.log.push(100.0, 0.5);
        let mut ctx = bench.ctx();
        scan.step(&mut ctx).unwrap();

        // 0.0, 0.3, 0.6, 0.9 then the first retry
        for _ in 0..4 {
            bench.tick(&mut scan, |x| x).unwrap();
        }
        assert_eq!(scan.retries(), 1);
        assert_relative_eq!(scan.step_size(), 0.28);
        assert_relative_eq!(bench.motor.position().unwrap(), 0.28);
        assert_eq!(
            bench.motor.moves().iter().filter(|&&m| m == 0.0).count(),
            1
        );
        assert!(matches!(
            bench.events.last(),
            Some(SearchEvent::Retrying { attempt: 2, .. })
        ));
    }

    #[test]
    fn test_max_survives_retries_and_gives_up() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 1.0, 0.08, 0.01), 0.5);
        let mut scan = DynamicLinearScan::new();
        bench.log.push(100.0, 0.5);
        let mut ctx = bench.ctx();
        scan.step(&mut ctx).unwrap();

        bench.run(&mut scan, |x| x, 1000);

        assert_eq!(scan.retries(), 2);
        let (value, location) = scan.max().unwrap();
        assert_relative_eq!(value, location);
        assert!(location > 0.9);
        assert_eq!(bench.motor.position().unwrap(), 0.5);
        assert!(bench.events.contains(&SearchEvent::NoImprovement {
            original_position: 0.5
        }));
    }

    #[test]
    fn test_cancel_does_not_move() {
        let mut bench = Bench::new(SessionConfig::new(0.0, 10.0, 2.0, 0.1), 0.0);
        let mut scan = DynamicLinearScan::new();
        for _ in 0..4 {
            bench.tick(&mut scan, parabola).unwrap();
        }
        bench.log.push(parabola(6.0), 6.0);
        let moves = bench.motor.move_count();

        let mut ctx = bench.ctx();
        scan.cancel(&mut ctx).unwrap();

        assert!(scan.is_done());
        assert_eq!(bench.motor.move_count(), moves);
        assert_eq!(scan.best_position(&bench.log), Some(6.0));
    }
}
