//! Forward linear sweep with shrink-and-retry
//!
//! The scan walks from the low limit towards the high limit in `step_size`
//! increments, one move per tick. At the end of a sweep it moves to the best
//! logged reading if that beats the baseline captured at the start. Otherwise
//! the step shrinks by [`STEP_SHRINK`] and the sweep repeats from the low
//! limit, until the step would fall to [`MIN_STEP_SIZE`] and the motor is
//! returned to where it started.

use super::{SearchContext, StepSearch, MIN_STEP_SIZE, STEP_EPSILON, STEP_SHRINK};
use crate::callback::SearchEvent;
use crate::error::SearchError;
use crate::state::Lifecycle;
use shared::MeasurementLog;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BasicScan {
    lifecycle: Lifecycle,
    /// Index of the next sweep point
    step: usize,
    step_size: f64,
    retries: u32,
    original_intensity: f64,
    original_position: f64,
    max_value: Option<f64>,
    max_position: Option<f64>,
    /// Where the scan left the motor when it finished
    result_position: Option<f64>,
}

impl Default for BasicScan {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicScan {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Beginning,
            step: 1,
            step_size: 0.0,
            retries: 0,
            original_intensity: f64::NEG_INFINITY,
            original_position: 0.0,
            max_value: None,
            max_position: None,
            result_position: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Step size of the current sweep
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Number of shrink-and-retry passes so far
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Baseline `(intensity, position)` captured when the session started
    pub fn original(&self) -> (f64, f64) {
        (self.original_intensity, self.original_position)
    }

    /// Park the motor at the best logged reading.
    ///
    /// Stays put when nothing has been logged yet.
    pub fn move_to_max(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        let Some(best) = ctx.log.arg_max() else {
            debug!("No readings logged, staying at current position");
            return Ok(());
        };
        let settled = ctx.command_move(best.position)?;
        self.max_value = Some(best.intensity);
        self.max_position = Some(best.position);
        self.result_position = Some(settled);
        Ok(())
    }

    fn start_fresh(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        let (original_intensity, original_position) = match ctx.log.last() {
            Some(m) => (m.intensity, m.position),
            None => (f64::NEG_INFINITY, ctx.actuator.position()?),
        };
        ctx.command_move(ctx.config.low_limit)?;

        info!(
            "Starting basic scan over [{:.4}, {:.4}] with step {:.4}, baseline {:.3} at {:.4}",
            ctx.config.low_limit,
            ctx.config.high_limit,
            ctx.config.step_size,
            original_intensity,
            original_position
        );
        ctx.log.clear();
        self.original_intensity = original_intensity;
        self.original_position = original_position;
        self.step = 1;
        self.step_size = ctx.config.step_size;
        self.retries = 0;
        self.max_value = None;
        self.max_position = None;
        self.result_position = None;
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    fn finish_sweep(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        let best = ctx.log.arg_max();
        if let Some(best) = best.filter(|b| b.intensity > self.original_intensity) {
            let settled = ctx.command_move(best.position)?;
            self.max_value = Some(best.intensity);
            self.max_position = Some(best.position);
            self.result_position = Some(settled);
            self.lifecycle = Lifecycle::Done;
            info!(
                "Basic scan found {:.3} at {:.4} after {} retries",
                best.intensity, settled, self.retries
            );
            return Ok(());
        }

        let next_step = self.step_size - STEP_SHRINK;
        if next_step <= MIN_STEP_SIZE + STEP_EPSILON {
            let settled = ctx.command_move(self.original_position)?;
            ctx.events.push(SearchEvent::NoImprovement {
                original_position: self.original_position,
            });
            self.max_value = Some(self.original_intensity).filter(|v| v.is_finite());
            self.max_position = Some(self.original_position);
            self.result_position = Some(settled);
            self.lifecycle = Lifecycle::Done;
            info!(
                "Basic scan found no improvement over {:.3}, restored {:.4}",
                self.original_intensity, settled
            );
            return Ok(());
        }

        ctx.command_move(ctx.config.low_limit)?;
        self.step_size = next_step;
        self.retries += 1;
        self.step = 1;
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

impl StepSearch for BasicScan {
    fn step(&mut self, ctx: &mut SearchContext<'_>) -> Result<(), SearchError> {
        match self.lifecycle {
            Lifecycle::Done => return Ok(()),
            Lifecycle::Beginning => return self.start_fresh(ctx),
            Lifecycle::Running => {}
        }

        if self.retries == 0 {
            self.step_size = ctx.config.step_size;
        }

        let last_position = ctx.last_position()?;
        if last_position + self.step_size < ctx.config.high_limit {
            let target = ctx.config.low_limit + self.step as f64 * self.step_size;
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
        self.move_to_max(ctx)?;
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
            .or_else(|| log.arg_max().map(|m| m.position))
    }

    fn best_intensity(&self, log: &MeasurementLog) -> Option<f64> {
        self.max_value.or_else(|| log.arg_max().map(|m| m.intensity))
    }
}
