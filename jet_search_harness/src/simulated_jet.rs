//! Simulated jet actuator for testing
//!
//! Provides an ActuatorInterface implementation whose intensity readings come
//! from an [`IntensityProfile`] with Gaussian read noise and randomly dropped
//! shots, so the search algorithms can be exercised without a beamline.

use crate::intensity_profiles::IntensityProfile;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};
use shared::algo::{mean, skim, std_dev};
use shared::{ActuatorInterface, ActuatorResult};
use tracing::debug;

/// Motor plus detector over a simulated jet.
pub struct SimulatedJet {
    /// Signal shape versus motor position
    profile: Box<dyn IntensityProfile>,
    /// Current motor position (mm)
    position: f64,
    /// Hard travel limits; moves beyond them stop at the limit
    travel_range: (f64, f64),
    /// Additive read noise, `None` for a noise-free detector
    noise: Option<Normal<f64>>,
    /// Probability that a shot misses the jet and reads background only
    dropped_fraction: f64,
    /// Reading reported for a dropped shot
    background: f64,
    rng: StdRng,
    /// Shots taken so far; drives time-dependent profiles
    readings: u64,
    moves: usize,
}

impl SimulatedJet {
    /// Noise-free jet with the motor at `position` and unlimited travel.
    pub fn new(profile: Box<dyn IntensityProfile>, position: f64) -> Self {
        Self {
            profile,
            position,
            travel_range: (f64::NEG_INFINITY, f64::INFINITY),
            noise: None,
            dropped_fraction: 0.0,
            background: 0.0,
            rng: StdRng::seed_from_u64(42),
            readings: 0,
            moves: 0,
        }
    }

    pub fn with_travel_range(mut self, min: f64, max: f64) -> Self {
        self.travel_range = (min.min(max), min.max(max));
        self
    }

    /// Add Gaussian read noise with standard deviation `sigma`.
    pub fn with_noise(mut self, sigma: f64) -> Result<Self, NormalError> {
        self.noise = if sigma == 0.0 {
            None
        } else {
            Some(Normal::new(0.0, sigma.abs())?)
        };
        Ok(self)
    }

    /// Drop `fraction` of shots, reporting `background` for them.
    pub fn with_dropped_shots(mut self, fraction: f64, background: f64) -> Self {
        self.dropped_fraction = fraction.clamp(0.0, 1.0);
        self.background = background;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn profile(&self) -> &dyn IntensityProfile {
        self.profile.as_ref()
    }

    /// Moves commanded so far
    pub fn move_count(&self) -> usize {
        self.moves
    }

    /// Shots taken so far
    pub fn reading_count(&self) -> u64 {
        self.readings
    }

    /// Noise-free signal at the current position for the next shot
    pub fn true_intensity(&self) -> f64 {
        self.profile.intensity(self.position, self.readings)
    }

    /// Take one shot; returns the reading and whether the shot was dropped.
    pub fn shot(&mut self) -> (f64, bool) {
        let index = self.readings;
        self.readings += 1;

        if self.dropped_fraction > 0.0 && self.rng.gen::<f64>() < self.dropped_fraction {
            return (self.background, true);
        }
        let signal = self.profile.intensity(self.position, index);
        let noise = match &self.noise {
            Some(dist) => dist.sample(&mut self.rng),
            None => 0.0,
        };
        (signal + noise, false)
    }

    /// Average `samples` shots at the current position.
    ///
    /// Dropped shots are left out of the average unless every shot dropped.
    pub fn measure(&mut self, samples: usize) -> f64 {
        self.measure_with_spread(samples).0
    }

    /// Like [`measure`](Self::measure), also returning the standard deviation
    /// of the shots that went into the average.
    pub fn measure_with_spread(&mut self, samples: usize) -> (f64, f64) {
        let (values, dropped): (Vec<f64>, Vec<bool>) =
            (0..samples.max(1)).map(|_| self.shot()).unzip();
        let kept = skim(&values, &dropped);
        let used = if kept.is_empty() { values } else { kept };
        let (average, spread) = (mean(&used), std_dev(&used));
        debug!(
            "Averaged {} of {} shots at {:.4}: {:.3} +/- {:.3}",
            used.len(),
            samples.max(1),
            self.position,
            average,
            spread
        );
        (average, spread)
    }
}

impl ActuatorInterface for SimulatedJet {
    fn move_to(&mut self, target: f64) -> ActuatorResult<f64> {
        let (min, max) = self.travel_range;
        let settled = target.clamp(min, max);
        if settled != target {
            debug!("Travel limit reached, stopped at {:.4}", settled);
        }
        self.position = settled;
        self.moves += 1;
        Ok(settled)
    }

    fn position(&self) -> ActuatorResult<f64> {
        Ok(self.position)
    }
}
