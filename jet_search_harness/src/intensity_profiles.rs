//! Test signal shapes for jet search testing
//!
//! Provides intensity-versus-position functions for driving the search
//! algorithms, including a clean parabola, a Gaussian jet, a jet that drifts
//! while the search runs, and a flat signal with no peak.

/// Trait for intensity profiles
pub trait IntensityProfile: Send + Sync {
    /// Noise-free intensity at `position` for the `reading_index`-th reading
    fn intensity(&self, position: f64, reading_index: u64) -> f64;

    /// Get profile description
    fn description(&self) -> &str;
}

/// Downward parabola `peak - curvature * (x - center)^2`
pub struct Parabola {
    center: f64,
    peak: f64,
    curvature: f64,
}

impl Parabola {
    pub fn new(center: f64, peak: f64, curvature: f64) -> Self {
        Self {
            center,
            peak,
            curvature,
        }
    }
}

impl IntensityProfile for Parabola {
    fn intensity(&self, position: f64, _reading_index: u64) -> f64 {
        self.peak - self.curvature * (position - self.center).powi(2)
    }

    fn description(&self) -> &str {
        "Parabola"
    }
}

/// Gaussian jet cross-section on a constant background
#[derive(Debug, Clone, Copy)]
pub struct GaussianJet {
    /// Jet center (mm)
    pub center: f64,
    /// Gaussian sigma of the jet cross-section (mm)
    pub radius: f64,
    /// Signal above background at the jet center
    pub peak: f64,
    /// Signal far from the jet
    pub background: f64,
}

impl GaussianJet {
    pub fn new(center: f64, radius: f64, peak: f64, background: f64) -> Self {
        Self {
            center,
            radius,
            peak,
            background,
        }
    }

    /// Intensity with the jet centered at `center`
    pub fn at_center(&self, position: f64, center: f64) -> f64 {
        if self.radius <= 0.0 {
            return self.background;
        }
        let offset = position - center;
        self.background + self.peak * (-offset * offset / (2.0 * self.radius * self.radius)).exp()
    }
}

impl IntensityProfile for GaussianJet {
    fn intensity(&self, position: f64, _reading_index: u64) -> f64 {
        self.at_center(position, self.center)
    }

    fn description(&self) -> &str {
        "Gaussian jet"
    }
}

/// Gaussian jet whose center moves a fixed distance per reading
pub struct DriftingJet {
    jet: GaussianJet,
    /// Center displacement per reading (mm)
    drift_per_reading: f64,
}

impl DriftingJet {
    pub fn new(jet: GaussianJet, drift_per_reading: f64) -> Self {
        Self {
            jet,
            drift_per_reading,
        }
    }

    /// Jet center at the `reading_index`-th reading
    pub fn center_at(&self, reading_index: u64) -> f64 {
        self.jet.center + self.drift_per_reading * reading_index as f64
    }
}

impl IntensityProfile for DriftingJet {
    fn intensity(&self, position: f64, reading_index: u64) -> f64 {
        self.jet.at_center(position, self.center_at(reading_index))
    }

    fn description(&self) -> &str {
        "Drifting Gaussian jet"
    }
}

/// Constant signal (no jet in range)
pub struct FlatProfile {
    level: f64,
}

impl FlatProfile {
    pub fn new(level: f64) -> Self {
        Self { level }
    }
}

impl IntensityProfile for FlatProfile {
    fn intensity(&self, _position: f64, _reading_index: u64) -> f64 {
        self.level
    }

    fn description(&self) -> &str {
        "Flat (no jet)"
    }
}

/// Collection of standard test profiles built around one jet
pub struct TestProfiles {
    pub jet: GaussianJet,
}

impl TestProfiles {
    pub fn new(jet: GaussianJet) -> Self {
        Self { jet }
    }

    /// Names accepted by [`get_profile`](Self::get_profile)
    pub const NAMES: [&'static str; 4] = ["gaussian", "parabola", "drifting", "flat"];

    /// Get all standard test profiles
    pub fn all_profiles(&self) -> Vec<Box<dyn IntensityProfile>> {
        Self::NAMES
            .iter()
            .filter_map(|name| self.get_profile(name))
            .collect()
    }

    /// Get profile by name
    pub fn get_profile(&self, name: &str) -> Option<Box<dyn IntensityProfile>> {
        let jet = self.jet;
        match name.to_lowercase().as_str() {
            "gaussian" => Some(Box::new(jet)),
            "parabola" => Some(Box::new(Parabola::new(
                jet.center,
                jet.background + jet.peak,
                jet.peak / (2.0 * jet.radius * jet.radius).max(f64::EPSILON),
            ))),
            // Drifts one radius over 1000 readings
            "drifting" => Some(Box::new(DriftingJet::new(jet, jet.radius / 1000.0))),
            "flat" => Some(Box::new(FlatProfile::new(jet.background))),
            _ => None,
        }
    }
}
