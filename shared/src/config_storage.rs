//! Configuration storage for jet search settings.
//!
//! Provides centralized storage for JSON settings files such as saved search
//! sessions. All config is stored in ~/.jet_config/ by default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration storage manager.
///
/// Manages loading and saving of named JSON configuration files from a
/// centralized directory (defaults to ~/.jet_config/).
#[derive(Debug, Clone)]
pub struct ConfigStorage {
    /// Root directory for all configuration (e.g., ~/.jet_config)
    root_path: PathBuf,
}

impl ConfigStorage {
    /// Create a new config storage with default path (~/.jet_config)
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
        let root_path = PathBuf::from(home).join(".jet_config");
        Ok(Self { root_path })
    }

    /// Create a new config storage with custom root path
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Get the root configuration path
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Path of the JSON file for a named config entry
    pub fn path_for(&self, name: &str) -> PathBuf {
        assert!(
            !name.contains(['/', '\\']),
            "Config name cannot contain path separators"
        );
        self.root_path.join(format!("{name}.json"))
    }

    /// Load a named config entry.
    ///
    /// Returns None if no file exists for this name.
    /// Returns Some(Err) if the file exists but cannot be parsed.
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Option<std::io::Result<T>> {
        let path = self.path_for(name);

        if !path.exists() {
            return None;
        }

        Some(load_json_file(&path))
    }

    /// Save a named config entry.
    ///
    /// Creates the config directory if it doesn't exist.
    /// Returns the path where the entry was saved.
    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root_path)?;

        let path = self.path_for(name);
        save_json_file(&path, value)?;
        debug!("Saved config '{}' to {}", name, path.display());
        Ok(path)
    }

    /// Delete a named config entry.
    ///
    /// Returns Ok(true) if the file was deleted, Ok(false) if it didn't exist.
    pub fn delete(&self, name: &str) -> std::io::Result<bool> {
        let path = self.path_for(name);

        if !path.exists() {
            return Ok(false);
        }

        std::fs::remove_file(path)?;
        Ok(true)
    }
}

impl Default for ConfigStorage {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_path(PathBuf::from(".jet_config")))
    }
}

/// Read and parse a JSON file at an arbitrary path.
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> std::io::Result<T> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(invalid_data)
}

/// Write a value as pretty-printed JSON to an arbitrary path.
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(invalid_data)?;
    std::fs::write(path, json)
}

fn invalid_data(err: serde_json::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
}
