//! Common utilities for jet search tests

use jet_search::{SearchController, SearchError, SearchOutcome};
use shared::{ActuatorInterface, MeasurementLog, MockActuator, SessionConfig};

/// Route library logs to the test harness
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Downward parabola peaking at `center`
pub fn parabola(center: f64) -> impl Fn(f64) -> f64 {
    move |x| -(x - center).powi(2)
}

/// The `[0, 10]` session used throughout the tests
pub fn test_config() -> SessionConfig {
    SessionConfig::new(0.0, 10.0, 2.0, 0.1)
}

/// Mock motor and log driven by a signal function
pub struct Rig<F: Fn(f64) -> f64> {
    pub motor: MockActuator,
    pub log: MeasurementLog,
    pub config: SessionConfig,
    pub signal: F,
}

impl<F: Fn(f64) -> f64> Rig<F> {
    pub fn new(config: SessionConfig, start: f64, signal: F) -> Self {
        Self {
            motor: MockActuator::new(start),
            log: MeasurementLog::new(),
            config,
            signal,
        }
    }

    /// Log a reading at the motor position and execute one tick.
    pub fn tick(&mut self, controller: &mut SearchController) -> Result<SearchOutcome, SearchError> {
        let position = self.motor.position()?;
        self.log.push((self.signal)(position), position);
        controller.execute(&mut self.motor, &mut self.log, &self.config)
    }

    /// Tick until the controller reports completion.
    pub fn run(&mut self, controller: &mut SearchController, max_ticks: usize) -> SearchOutcome {
        for _ in 0..max_ticks {
            let outcome = self.tick(controller).unwrap();
            if outcome.completed {
                return outcome;
            }
        }
        panic!("search did not complete within {max_ticks} ticks");
    }
}
