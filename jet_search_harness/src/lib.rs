//! Jet search harness for testing and simulation
//!
//! This crate provides a simulated jet (motor plus detector), standard
//! intensity profiles and a tick runner, so the jet search controller can be
//! exercised and demonstrated without beamline hardware.

pub mod intensity_profiles;
pub mod runner;
pub mod simulated_jet;

pub use intensity_profiles::{IntensityProfile, TestProfiles};
pub use runner::{run_search, run_search_with_callback, RunnerResults};
pub use simulated_jet::SimulatedJet;
