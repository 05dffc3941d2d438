//! Runner for executing a jet search against a simulated jet
//!
//! Provides the poll loop a beamline GUI would run: take a reading, append it
//! to the measurement log, tick the controller, until the search finishes or
//! the tick budget runs out.

use crate::simulated_jet::SimulatedJet;
use jet_search::{SearchController, SearchError, SearchEvent, SearchSettings};
use shared::algo::safe_div;
use shared::{ActuatorInterface, MeasurementLog};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Results from a runner execution
#[derive(Debug, Clone)]
pub struct RunnerResults {
    /// Ticks executed
    pub ticks: usize,
    /// Actuator moves commanded during the run
    pub moves: usize,
    /// Whether the search finished within the tick budget
    pub completed: bool,
    /// Best position reported by the last tick
    pub best_position: f64,
    /// Averaged reading at the final motor position
    pub final_intensity: f64,
    /// Averaged reading at the starting position
    pub original_intensity: f64,
    /// `final_intensity / original_intensity`, 0 when undefined
    pub improvement: f64,
    /// All events emitted during the run
    pub events: Vec<SearchEvent>,
}

/// Run a search to completion or until `settings.max_ticks`
///
/// # Arguments
/// * `controller` - Search controller with the algorithm already selected
/// * `jet` - Simulated jet acting as actuator and detector
/// * `log` - Measurement log shared with the controller
/// * `settings` - Session limits, samples per move and tick budget
pub fn run_search(
    controller: &mut SearchController,
    jet: &mut SimulatedJet,
    log: &mut MeasurementLog,
    settings: &SearchSettings,
) -> Result<RunnerResults, SearchError> {
    run_search_with_callback(controller, jet, log, settings, |_, _| {})
}

/// Extended runner with callback support
///
/// `callback` is called after every tick with the tick number and the
/// controller, and may request cancellation through it.
pub fn run_search_with_callback<F>(
    controller: &mut SearchController,
    jet: &mut SimulatedJet,
    log: &mut MeasurementLog,
    settings: &SearchSettings,
    mut callback: F,
) -> Result<RunnerResults, SearchError>
where
    F: FnMut(usize, &SearchController),
{
    settings.validate()?;

    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let callback_id = controller.register_callback(move |event| {
        events_clone
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    });

    let original_intensity = jet.measure(settings.samples_per_move);
    let moves_before = jet.move_count();
    info!(
        "Running {} from {:.4}, baseline {:.3}",
        controller.algorithm_kind(),
        jet.position()?,
        original_intensity
    );

    let mut completed = false;
    let mut best_position = jet.position()?;
    let mut ticks = 0;
    let mut pending = Some(original_intensity);

    let outcome = loop {
        if ticks >= settings.max_ticks {
            warn!("Search did not finish within {} ticks", settings.max_ticks);
            break Ok(());
        }

        let intensity = match pending.take() {
            Some(reading) => reading,
            None => jet.measure(settings.samples_per_move),
        };
        log.push(intensity, jet.position()?);

        match controller.execute(jet, log, &settings.session) {
            Ok(result) => {
                ticks += 1;
                best_position = result.best_position;
                completed = result.completed;
            }
            Err(e) => break Err(e),
        }
        callback(ticks, controller);
        if completed {
            break Ok(());
        }
    };

    controller.deregister_callback(callback_id);
    outcome?;

    let final_intensity = jet.measure(settings.samples_per_move);
    let events = Arc::try_unwrap(events)
        .map(|mutex| mutex.into_inner().unwrap_or_else(|e| e.into_inner()))
        .unwrap_or_else(|arc| arc.lock().unwrap_or_else(|e| e.into_inner()).clone());

    Ok(RunnerResults {
        ticks,
        moves: jet.move_count() - moves_before,
        completed,
        best_position,
        final_intensity,
        original_intensity,
        improvement: safe_div(final_intensity, original_intensity),
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intensity_profiles::{FlatProfile, GaussianJet};
    use approx::assert_relative_eq;
    use jet_search::AlgorithmKind;
    use shared::SessionConfig;

    fn settings(algorithm: AlgorithmKind) -> SearchSettings {
        SearchSettings {
            algorithm,
            session: SessionConfig::new(-0.1, 0.1, 0.01, 0.001),
            samples_per_move: 1,
            max_ticks: 500,
        }
    }

    #[test]
    fn test_ternary_finds_jet() {
        let profile = GaussianJet::new(0.023, 0.01, 100.0, 5.0);
        let mut jet = SimulatedJet::new(Box::new(profile), -0.08);
        let mut log = MeasurementLog::new();
        let settings = settings(AlgorithmKind::TernarySearch);
        let mut controller = SearchController::from_settings(&settings);

        let results = run_search(&mut controller, &mut jet, &mut log, &settings).unwrap();

        assert!(results.completed);
        assert_relative_eq!(results.best_position, 0.023, epsilon = 0.001);
        assert!(results.improvement > 1.0);
        assert_eq!(controller.callback_count(), 0);
        assert!(matches!(
            results.events.last(),
            Some(SearchEvent::SearchCompleted { .. })
        ));
    }

    #[test]
    fn test_tick_budget_stops_run() {
        let mut jet = SimulatedJet::new(Box::new(FlatProfile::new(1.0)), 0.0);
        let mut log = MeasurementLog::new();
        let settings = SearchSettings {
            max_ticks: 5,
            ..settings(AlgorithmKind::BasicScan)
        };
        let mut controller = SearchController::from_settings(&settings);

        let results = run_search(&mut controller, &mut jet, &mut log, &settings).unwrap();

        assert!(!results.completed);
        assert_eq!(results.ticks, 5);
        assert_eq!(results.moves, 5);
    }

    #[test]
    fn test_callback_can_stop_search() {
        let profile = GaussianJet::new(0.05, 0.01, 100.0, 5.0);
        let mut jet = SimulatedJet::new(Box::new(profile), 0.0);
        let mut log = MeasurementLog::new();
        let settings = settings(AlgorithmKind::BasicScan);
        let mut controller = SearchController::from_settings(&settings);

        let results = run_search_with_callback(
            &mut controller,
            &mut jet,
            &mut log,
            &settings,
            |tick, controller| {
                if tick == 4 {
                    controller.stop_the_search();
                }
            },
        )
        .unwrap();

        assert!(results.completed);
        assert_eq!(results.ticks, 5);
        assert!(results
            .events
            .iter()
            .any(|e| matches!(e, SearchEvent::SearchCancelled { .. })));
    }
}
