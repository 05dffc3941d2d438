use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use shared::config_storage::{load_json_file, save_json_file};
use shared::SessionConfig;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Search algorithm selectable from the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// Bracket-shrinking ternary search between the motor limits
    #[default]
    #[serde(rename = "Ternary Search")]
    TernarySearch,
    /// Forward linear sweep with shrink-and-retry
    #[serde(rename = "Basic Scan")]
    BasicScan,
    /// Linear sweep followed by a ternary refinement around its best point
    #[serde(rename = "Linear + Ternary")]
    LinearThenTernary,
    /// Index-driven linear sweep that tolerates pauses between ticks
    #[serde(rename = "Dynamic Linear Scan")]
    DynamicLinearScan,
}

impl AlgorithmKind {
    /// Every selectable algorithm, in UI order
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::TernarySearch,
        AlgorithmKind::BasicScan,
        AlgorithmKind::LinearThenTernary,
        AlgorithmKind::DynamicLinearScan,
    ];

    /// Display name used by the UI and settings files
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::TernarySearch => "Ternary Search",
            AlgorithmKind::BasicScan => "Basic Scan",
            AlgorithmKind::LinearThenTernary => "Linear + Ternary",
            AlgorithmKind::DynamicLinearScan => "Dynamic Linear Scan",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = SearchError;

    /// Accepts the display name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AlgorithmKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SearchError::UnknownAlgorithm(s.to_string()))
    }
}

/// Settings for a jet search session as configured from the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Active search algorithm
    pub algorithm: AlgorithmKind,
    /// Motor limits, step size and tolerance
    pub session: SessionConfig,
    /// Number of intensity readings averaged at each motor position
    pub samples_per_move: usize,
    /// Upper bound on ticks a runner spends on one search
    pub max_ticks: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::default(),
            session: SessionConfig::default(),
            samples_per_move: 3,
            max_ticks: 2000,
        }
    }
}

impl SearchSettings {
    /// Check the settings can drive a search.
    pub fn validate(&self) -> Result<(), SearchError> {
        self.session.validated()?;
        if self.samples_per_move == 0 {
            return Err(SearchError::InvalidConfig(
                "samples_per_move must be at least 1".to_string(),
            ));
        }
        if self.max_ticks == 0 {
            return Err(SearchError::InvalidConfig(
                "max_ticks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a JSON file
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        save_json_file(path, self)
    }

    /// Load settings from a JSON file
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        load_json_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_names_round_trip() {
        for kind in AlgorithmKind::ALL {
            assert_eq!(kind.to_string().parse::<AlgorithmKind>().unwrap(), kind);
        }
        assert_eq!(
            " linear + ternary ".parse::<AlgorithmKind>().unwrap(),
            AlgorithmKind::LinearThenTernary
        );
    }

    #[test]
    fn test_unknown_algorithm() {
        assert_eq!(
            "Golden Section".parse::<AlgorithmKind>(),
            Err(SearchError::UnknownAlgorithm("Golden Section".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&AlgorithmKind::DynamicLinearScan).unwrap();
        assert_eq!(json, "\"Dynamic Linear Scan\"");

        let kind: AlgorithmKind = serde_json::from_str("\"Linear + Ternary\"").unwrap();
        assert_eq!(kind, AlgorithmKind::LinearThenTernary);
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = SearchSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.algorithm, AlgorithmKind::TernarySearch);
    }

    #[test]
    fn test_validate_rejects_zero_samples() {
        let settings = SearchSettings {
            samples_per_move: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SearchError::InvalidConfig(_))
        ));

        let settings = SearchSettings {
            session: SessionConfig::new(0.0, 1.0, -0.1, 0.01),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SearchError::InvalidConfig(msg)) if msg.contains("step_size")
        ));
    }

    #[test]
    fn test_settings_file_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let settings = SearchSettings {
            algorithm: AlgorithmKind::BasicScan,
            session: SessionConfig::new(0.0, 10.0, 2.0, 0.1),
            samples_per_move: 5,
            max_ticks: 400,
        };
        settings.save_to_file(&path).unwrap();
        let loaded = SearchSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_malformed_settings_file_is_invalid_data() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"algorithm": "Golden Section"}"#).unwrap();

        let err = SearchSettings::load_from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
