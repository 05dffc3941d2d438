//! Jet search demonstration against a simulated jet
//!
//! Runs one search algorithm over a simulated Gaussian jet (optionally noisy,
//! drifting or with dropped shots) and prints the event stream and a summary.
//!
//! Usage:
//! ```
//! cargo run --bin search_demo -- --algorithm "Linear + Ternary" --limits=-0.1:0.1
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use jet_search::{AlgorithmKind, SearchController, SearchSettings};
use jet_search_harness::intensity_profiles::{GaussianJet, TestProfiles};
use jet_search_harness::{run_search_with_callback, SimulatedJet};
use shared::config_storage::ConfigStorage;
use shared::limits_arg::LimitsArg;
use shared::MeasurementLog;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the search demo
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Jet search demonstration against a simulated jet"
)]
struct Args {
    /// Search algorithm ("Ternary Search", "Basic Scan", "Linear + Ternary",
    /// "Dynamic Linear Scan")
    #[arg(short, long)]
    algorithm: Option<AlgorithmKind>,

    /// Motor limits in mm (low:high)
    #[arg(long)]
    limits: Option<LimitsArg>,

    /// Linear scan step in mm
    #[arg(long)]
    step_size: Option<f64>,

    /// Ternary search stopping width in mm
    #[arg(long)]
    tolerance: Option<f64>,

    /// Intensity profile (gaussian, parabola, drifting, flat)
    #[arg(short, long, default_value = "gaussian")]
    profile: String,

    /// Jet center in mm
    #[arg(long, default_value_t = 0.023)]
    center: f64,

    /// Jet radius (Gaussian sigma) in mm
    #[arg(long, default_value_t = 0.01)]
    radius: f64,

    /// Jet signal above background
    #[arg(long, default_value_t = 100.0)]
    peak: f64,

    /// Background signal
    #[arg(long, default_value_t = 5.0)]
    background: f64,

    /// Starting motor position in mm
    #[arg(long, default_value_t = -0.08, allow_hyphen_values = true)]
    start: f64,

    /// Read noise standard deviation
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Fraction of shots that miss the jet (0-1)
    #[arg(long, default_value_t = 0.0)]
    dropped_fraction: f64,

    /// Readings averaged per motor position
    #[arg(long)]
    samples_per_move: Option<usize>,

    /// RNG seed for noise and dropped shots
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum ticks before giving up
    #[arg(long)]
    max_ticks: Option<usize>,

    /// Load settings from a JSON file; command line values override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the effective settings under this name in ~/.jet_config
    #[arg(long)]
    save_config: Option<String>,

    /// Request a stop after this many ticks
    #[arg(long)]
    stop_after: Option<usize>,
}

impl Args {
    /// Settings file (or defaults) with command line overrides applied
    fn settings(&self) -> Result<SearchSettings> {
        let mut settings = match &self.config {
            Some(path) => SearchSettings::load_from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => SearchSettings::default(),
        };

        if let Some(algorithm) = self.algorithm {
            settings.algorithm = algorithm;
        }
        if let Some(limits) = self.limits {
            settings.session.low_limit = limits.low();
            settings.session.high_limit = limits.high();
        }
        if let Some(step_size) = self.step_size {
            settings.session.step_size = step_size;
        }
        if let Some(tolerance) = self.tolerance {
            settings.session.tolerance = tolerance;
        }
        if let Some(samples) = self.samples_per_move {
            settings.samples_per_move = samples;
        }
        if let Some(max_ticks) = self.max_ticks {
            settings.max_ticks = max_ticks;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let settings = args.settings()?;

    if let Some(name) = &args.save_config {
        if name.contains(['/', '\\']) {
            bail!("Config name cannot contain path separators: {name}");
        }
        let path = ConfigStorage::default()
            .save_json(name, &settings)
            .context("Failed to save settings")?;
        info!("Saved settings to {}", path.display());
    }

    let jet = GaussianJet::new(args.center, args.radius, args.peak, args.background);
    let Some(profile) = TestProfiles::new(jet).get_profile(&args.profile) else {
        bail!(
            "Unknown profile '{}', expected one of {:?}",
            args.profile,
            TestProfiles::NAMES
        );
    };
    info!("Profile: {}", profile.description());

    let mut sim = SimulatedJet::new(profile, args.start)
        .with_noise(args.noise)
        .context("Invalid noise level")?
        .with_dropped_shots(args.dropped_fraction, args.background)
        .with_seed(args.seed);
    let mut log = MeasurementLog::new();
    let mut controller = SearchController::from_settings(&settings);

    let stop_after = args.stop_after;
    let results = run_search_with_callback(
        &mut controller,
        &mut sim,
        &mut log,
        &settings,
        |tick, controller| {
            if stop_after == Some(tick) {
                info!("Requesting stop after {tick} ticks");
                controller.stop_the_search();
            }
        },
    )?;

    println!("\nEvents:");
    for event in &results.events {
        println!("  {event}");
    }

    println!("\nSummary ({}):", settings.algorithm);
    println!(
        "  Limits:           [{:.4}, {:.4}] mm",
        settings.session.low_limit, settings.session.high_limit
    );
    println!("  Completed:        {}", results.completed);
    println!("  Ticks:            {}", results.ticks);
    println!("  Moves:            {}", results.moves);
    println!("  Best position:    {:.5} mm", results.best_position);
    println!("  Jet center:       {:.5} mm", args.center);
    println!("  Start intensity:  {:.3}", results.original_intensity);
    println!("  Final intensity:  {:.3}", results.final_intensity);
    println!("  Improvement:      {:.2}x", results.improvement);

    Ok(())
}
