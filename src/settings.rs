//! Shared tool preferences for rangefinder shells.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`.
//!
//! Only preferences live here (color range, intervals, default sizes).
//! Calibration itself is session-scoped and never persisted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::detect::HsvRange;

/// Rangefinder settings that can be saved and loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangefinderSettings {
    /// HSV color range of the marker to detect
    pub marker_range: HsvRange,
    /// Auto-scan interval in seconds
    pub scan_interval_secs: u64,
    /// Timeout for one capture/detect cycle in milliseconds
    pub capture_timeout_ms: u64,
    /// Default physical map size in kilometers
    pub map_size_km: f64,
    /// Default grid square size in kilometers
    pub grid_size_km: f64,
}

impl Default for RangefinderSettings {
    fn default() -> Self {
        Self {
            marker_range: HsvRange::default(),
            scan_interval_secs: 3,
            capture_timeout_ms: 2000,
            map_size_km: 65.0,
            grid_size_km: 2.0,
        }
    }
}

impl RangefinderSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "moderras", "map-rangefinder")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), String> {
        let path = Self::settings_path().ok_or("Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&path, content).map_err(|e| format!("Failed to write settings: {}", e))?;

        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RangefinderSettings::default();
        assert_eq!(settings.scan_interval_secs, 3);
        assert_eq!(settings.capture_timeout_ms, 2000);
        assert_eq!(settings.map_size_km, 65.0);
        assert_eq!(settings.grid_size_km, 2.0);
        assert_eq!(settings.marker_range, HsvRange::default());
    }

    #[test]
    fn test_settings_round_trip_json() {
        let mut settings = RangefinderSettings::default();
        settings.scan_interval_secs = 5;
        settings.marker_range = HsvRange::new([0, 120, 120], [10, 255, 255]);

        let json = serde_json::to_string(&settings).unwrap();
        let loaded: RangefinderSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.scan_interval_secs, 5);
        assert_eq!(loaded.marker_range, settings.marker_range);
    }

    #[test]
    fn test_partial_config_backfills_defaults() {
        let loaded: RangefinderSettings = serde_json::from_str(r#"{"map_size_km": 32.0}"#).unwrap();
        assert_eq!(loaded.map_size_km, 32.0);
        assert_eq!(loaded.scan_interval_secs, 3);
    }
}
