//! Typed tracker settings.
//!
//! Every recognized option is an explicit field with an explicit default.
//! Unknown keys in a persisted settings file are ignored, so older
//! builds' files keep loading.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::floors::DEFAULT_DEBOUNCE_THRESHOLD;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_debounce_threshold() -> u32 {
    DEFAULT_DEBOUNCE_THRESHOLD
}

fn default_trail_limit() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_marker_color() -> String {
    "#ff4d4d".to_string()
}

fn default_trail_color() -> String {
    "#4da6ff".to_string()
}

/// User-facing options consumed by the tracker and its renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSettings {
    /// Consecutive samples before a floor change commits.
    #[serde(default = "default_debounce_threshold")]
    pub debounce_threshold: u32,
    /// Maximum retained trail positions; oldest evicted first.
    #[serde(default = "default_trail_limit")]
    pub trail_limit: usize,
    #[serde(default = "default_true")]
    pub show_trail: bool,
    /// Keep the viewport centered on the player marker.
    #[serde(default = "default_true")]
    pub follow_player: bool,
    #[serde(default = "default_marker_color")]
    pub marker_color: String,
    #[serde(default = "default_trail_color")]
    pub trail_color: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            debounce_threshold: default_debounce_threshold(),
            trail_limit: default_trail_limit(),
            show_trail: true,
            follow_player: true,
            marker_color: default_marker_color(),
            trail_color: default_trail_color(),
        }
    }
}

impl TrackerSettings {
    /// Load settings from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load settings, falling back to defaults when the file does not
    /// exist yet. Parse failures still surface.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        match Self::load_json(path) {
            Ok(settings) => Ok(settings),
            Err(SettingsError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Write settings to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = TrackerSettings::default();
        assert_eq!(settings.debounce_threshold, 3);
        assert_eq!(settings.trail_limit, 50);
        assert!(settings.show_trail);
        assert!(settings.follow_player);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings: TrackerSettings =
            serde_json::from_str(r#"{"trailLimit": 10, "showTrail": false}"#).unwrap();
        assert_eq!(settings.trail_limit, 10);
        assert!(!settings.show_trail);
        assert_eq!(settings.debounce_threshold, 3);
        assert_eq!(settings.marker_color, "#ff4d4d");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let settings: TrackerSettings =
            serde_json::from_str(r#"{"legacyColorTable": {"a": 1}, "trailLimit": 5}"#).unwrap();
        assert_eq!(settings.trail_limit, 5);
    }

    #[test]
    fn missing_file_yields_defaults_but_bad_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(
            TrackerSettings::load_or_default(&path).unwrap(),
            TrackerSettings::default()
        );

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            TrackerSettings::load_or_default(&path),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = TrackerSettings::default();
        settings.debounce_threshold = 5;
        settings.marker_color = "#00ff00".to_string();
        settings.write_json(&path).unwrap();
        assert_eq!(TrackerSettings::load_json(&path).unwrap(), settings);
    }
}
