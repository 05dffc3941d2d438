//! Ordered log of `(intensity, position)` readings for one search session.
//!
//! The caller appends one measurement per poll tick; search algorithms read
//! the tail for pairwise comparisons and scan the whole log for the arg-max.
//! Entries are only removed when a search starts a fresh run.

use std::slice::Iter;

use serde::{Deserialize, Serialize};

/// A single intensity reading taken at a motor position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measured signal intensity
    pub intensity: f64,
    /// Motor position the reading was taken at
    pub position: f64,
}

impl Measurement {
    pub fn new(intensity: f64, position: f64) -> Self {
        Self {
            intensity,
            position,
        }
    }
}

/// Append-only measurement history for the current search session.
#[derive(Debug, Clone, Default)]
pub struct MeasurementLog {
    entries: Vec<Measurement>,
}

impl MeasurementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reading to the end of the log.
    pub fn push(&mut self, intensity: f64, position: f64) {
        self.entries.push(Measurement::new(intensity, position));
    }

    /// Returns the most recent reading.
    pub fn last(&self) -> Option<Measurement> {
        self.entries.last().copied()
    }

    /// Returns the two most recent readings as `(older, newer)`.
    pub fn last_two(&self) -> Option<(Measurement, Measurement)> {
        match self.entries.as_slice() {
            [.., older, newer] => Some((*older, *newer)),
            _ => None,
        }
    }

    /// Returns the reading with the greatest intensity.
    ///
    /// Ties resolve to the earliest reading. NaN intensities are skipped;
    /// returns `None` if no finite-comparable reading exists.
    pub fn arg_max(&self) -> Option<Measurement> {
        self.entries
            .iter()
            .filter(|m| !m.intensity.is_nan())
            .fold(None, |best: Option<Measurement>, m| match best {
                Some(b) if b.intensity >= m.intensity => Some(b),
                _ => Some(*m),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> Iter<'_, Measurement> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Measurement] {
        &self.entries
    }

    /// Removes all readings. Called when a search starts a fresh run.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a MeasurementLog {
    type Item = &'a Measurement;
    type IntoIter = Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
