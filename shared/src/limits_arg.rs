//! Type-safe motor limits argument.
//!
//! Provides a clap-compatible type for `low:high` command-line arguments with
//! parsing, validation, and display formatting.

use std::fmt;
use std::str::FromStr;

/// Parse motor limits from the command line.
///
/// Input format: `"low:high"`. Reversed limits are accepted and normalized,
/// matching how the search itself treats swapped limits.
///
/// # Examples
/// Valid: `"-0.1:0.1"`, `"0:10"`, `"10:0"` (normalized to `0:10`)
///
/// Invalid: `"1.0"` (missing high limit), `"a:2"` (not a number),
/// `"inf:1"` (not finite)
pub fn parse_limits(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Limits must be in format 'low:high'".to_string());
    }

    let low = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid low limit".to_string())?;
    let high = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid high limit".to_string())?;

    if !low.is_finite() || !high.is_finite() {
        return Err("Limits must be finite".to_string());
    }

    Ok((low.min(high), low.max(high)))
}

/// Motor limits parsed from `"low:high"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitsArg(pub f64, pub f64);

impl FromStr for LimitsArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = parse_limits(s)?;
        Ok(LimitsArg(low, high))
    }
}

impl fmt::Display for LimitsArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl LimitsArg {
    pub fn low(&self) -> f64 {
        self.0
    }

    pub fn high(&self) -> f64 {
        self.1
    }
}
