//! Jet search - stepwise single-axis intensity maximization
//!
//! Drives one motor axis to the position of maximum measured signal (for
//! example a liquid jet crossing a beam). The caller owns the poll loop:
//! each tick it records an intensity reading in the [`MeasurementLog`] and
//! calls [`SearchController::execute`], which advances the active algorithm
//! by at most one actuator move.

use shared::{ActuatorInterface, MeasurementLog, SessionConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

pub mod algorithms;
pub mod callback;
pub mod config;
pub mod error;
pub mod state;

use crate::algorithms::{SearchAlgorithm, SearchContext};
use crate::callback::{CallbackId, SearchCallback};

pub use crate::callback::SearchEvent;
pub use crate::config::{AlgorithmKind, SearchSettings};
pub use crate::error::SearchError;
pub use crate::state::Lifecycle;

/// Result of one [`SearchController::execute`] tick
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// The session has finished (on its own or by cancellation)
    pub completed: bool,
    /// Best position known so far, or the actuator position if none yet
    pub best_position: f64,
    /// Intensity at the best position, if one has been measured
    pub best_intensity: Option<f64>,
    /// Events raised during this tick, in order
    pub events: Vec<SearchEvent>,
}

impl SearchOutcome {
    /// `(completed, best_position)` as reported to the UI
    pub fn as_tuple(&self) -> (bool, f64) {
        (self.completed, self.best_position)
    }
}

/// Cloneable handle that requests cancellation from any thread
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop_requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the search to finish on its next tick.
    pub fn stop_the_search(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

/// Owns the active search algorithm and dispatches ticks to it
pub struct SearchController {
    algorithm: SearchAlgorithm,
    /// Set by `stop_the_search`, consumed by the next `execute`
    stop_requested: Arc<AtomicBool>,
    /// Registered callbacks
    callbacks: Arc<Mutex<HashMap<CallbackId, SearchCallback>>>,
    /// Next callback ID
    next_callback_id: Arc<Mutex<CallbackId>>,
    /// `SearchCompleted` / `SearchCancelled` already sent for this session
    completion_reported: bool,
    /// Ticks executed since the last restart
    ticks: usize,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(AlgorithmKind::default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SearchController {
    pub fn new(kind: AlgorithmKind) -> Self {
        Self {
            algorithm: SearchAlgorithm::new(kind),
            stop_requested: Arc::new(AtomicBool::new(false)),
            callbacks: Arc::new(Mutex::new(HashMap::new())),
            next_callback_id: Arc::new(Mutex::new(0)),
            completion_reported: false,
            ticks: 0,
        }
    }

    /// Controller for the algorithm named in `settings`
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(settings.algorithm)
    }

    /// Select the active algorithm.
    ///
    /// Switching to a different kind discards the previous algorithm's state;
    /// selecting the active kind keeps it.
    pub fn set_algorithm(&mut self, kind: AlgorithmKind) {
        if self.algorithm.kind() == kind {
            return;
        }
        info!(
            "Switching search algorithm from {} to {}",
            self.algorithm.kind(),
            kind
        );
        self.algorithm = SearchAlgorithm::new(kind);
        self.completion_reported = false;
        self.ticks = 0;
    }

    pub fn algorithm_kind(&self) -> AlgorithmKind {
        self.algorithm.kind()
    }

    /// Active algorithm state
    pub fn algorithm(&self) -> &SearchAlgorithm {
        &self.algorithm
    }

    pub fn is_done(&self) -> bool {
        self.algorithm.as_search().is_done()
    }

    /// Ticks executed since the session started
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Start a new session on the next tick.
    ///
    /// Clears any pending stop request.
    pub fn restart(&mut self) {
        debug!("Restarting {}", self.algorithm.kind());
        self.algorithm.as_search_mut().restart();
        self.stop_requested.store(false, Ordering::SeqCst);
        self.completion_reported = false;
        self.ticks = 0;
    }

    /// Ask the search to finish on its next tick.
    pub fn stop_the_search(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Handle for requesting cancellation from another thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop_requested: Arc::clone(&self.stop_requested),
        }
    }

    /// Register a callback for search events
    pub fn register_callback<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&SearchEvent) + Send + Sync + 'static,
    {
        let mut callbacks = lock(&self.callbacks);
        let mut next_id = lock(&self.next_callback_id);

        let callback_id = *next_id;
        *next_id += 1;

        callbacks.insert(callback_id, Arc::new(callback));
        callback_id
    }

    /// Deregister a callback
    pub fn deregister_callback(&self, callback_id: CallbackId) -> bool {
        lock(&self.callbacks).remove(&callback_id).is_some()
    }

    /// Get the number of registered callbacks
    pub fn callback_count(&self) -> usize {
        lock(&self.callbacks).len()
    }

    fn emit_events(&self, events: &[SearchEvent]) {
        if events.is_empty() {
            return;
        }
        let callbacks: Vec<SearchCallback> = lock(&self.callbacks).values().cloned().collect();
        for event in events {
            for callback in &callbacks {
                callback(event);
            }
        }
    }

    /// Advance the active search by one tick.
    ///
    /// The caller records the reading for the current motor position in `log`
    /// before each call. At most one actuator move is issued. Once the session
    /// is done, further calls report the same result without moving until
    /// [`restart`](Self::restart).
    ///
    /// Actuator faults are returned unchanged; the algorithm resumes from the
    /// failed step on the next call.
    pub fn execute(
        &mut self,
        actuator: &mut dyn ActuatorInterface,
        log: &mut MeasurementLog,
        config: &SessionConfig,
    ) -> Result<SearchOutcome, SearchError> {
        let config = config.validated()?;
        let kind = self.algorithm.kind();
        let mut events = Vec::new();
        let stop = self.stop_requested.swap(false, Ordering::SeqCst);

        {
            let mut ctx = SearchContext {
                actuator: &mut *actuator,
                log: &mut *log,
                config,
                events: &mut events,
            };
            let search = self.algorithm.as_search_mut();
            if stop {
                if !search.is_done() {
                    info!("Stop requested, finishing {}", kind);
                    if let Err(err) = search.cancel(&mut ctx) {
                        // Keep the request pending so the next tick retries it
                        self.stop_requested.store(true, Ordering::SeqCst);
                        return Err(err);
                    }
                }
            } else {
                search.step(&mut ctx)?;
            }
        }
        self.ticks += 1;

        let search = self.algorithm.as_search();
        let completed = search.is_done();
        let best_position = match search.best_position(log) {
            Some(position) => position,
            None => actuator.position()?,
        };
        let best_intensity = search.best_intensity(log);

        if completed && !self.completion_reported {
            self.completion_reported = true;
            let event = if stop {
                SearchEvent::SearchCancelled {
                    algorithm: kind,
                    best_position,
                }
            } else {
                SearchEvent::SearchCompleted {
                    algorithm: kind,
                    best_position,
                    best_intensity,
                }
            };
            info!("{}", event);
            events.push(event);
        }

        self.emit_events(&events);
        Ok(SearchOutcome {
            completed,
            best_position,
            best_intensity,
            events,
        })
    }
}
