//! Tunable thresholds for the remapper, stored as TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CONFIG_DIR: &str = ".config/openremap";
pub const SETTINGS_FILE: &str = "settings.toml";

// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Analog cutoff applied to every normalized axis magnitude.
///
/// Magnitudes at or below `min` read as 0.0, magnitudes at or above `max`
/// read as 1.0, anything in between passes through unchanged.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct DeadzoneSettings {
    pub min: f32,
    pub max: f32,
}

impl Default for DeadzoneSettings {
    fn default() -> Self {
        Self { min: 0.5, max: 1.0 }
    }
}

impl DeadzoneSettings {
    pub fn apply(&self, magnitude: f32) -> f32 {
        if magnitude <= self.min {
            0.0
        } else if magnitude >= self.max {
            1.0
        } else {
            magnitude
        }
    }
}

/// Thresholds a deliberate analog motion must pass to be captured
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct CaptureSettings {
    /// Minimum raw distance from rest
    pub travel: f32,
    /// Minimum normalized magnitude
    pub magnitude: f32,
    /// Time budget of one capture
    pub timeout_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            travel: 0.25,
            magnitude: 0.8,
            timeout_ms: 4000,
        }
    }
}

impl CaptureSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Minimum number of training polls
    pub min_polls: u32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self { min_polls: 5 }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    pub invert_x: bool,
    pub invert_y: bool,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RemapSettings {
    pub deadzone: DeadzoneSettings,
    pub capture: CaptureSettings,
    pub calibration: CalibrationSettings,
    pub camera: CameraSettings,
}

impl RemapSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.deadzone.min) || !unit.contains(&self.deadzone.max) {
            return Err(SettingsError::Invalid(
                "deadzone bounds must lie in [0, 1]".to_string(),
            ));
        }
        if self.deadzone.min >= self.deadzone.max {
            return Err(SettingsError::Invalid(format!(
                "deadzone min ({}) must be below max ({})",
                self.deadzone.min, self.deadzone.max
            )));
        }
        if !unit.contains(&self.capture.travel) || !unit.contains(&self.capture.magnitude) {
            return Err(SettingsError::Invalid(
                "capture thresholds must lie in [0, 1]".to_string(),
            ));
        }
        if self.capture.timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "capture timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads settings from `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!("Creating default settings at {}", path.display());
            let settings = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, settings.to_toml()?)?;
            return Ok(settings);
        }

        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        path
    }
}

pub fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_toml() {
        let settings = RemapSettings::default();
        let content = settings.to_toml().unwrap();
        assert_eq!(RemapSettings::from_toml(&content).unwrap(), settings);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = RemapSettings::from_toml(
            r#"
            [deadzone]
            min = 0.2

            [camera]
            invert_y = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.deadzone.min, 0.2);
        assert_eq!(settings.deadzone.max, 1.0);
        assert!(settings.camera.invert_y);
        assert!(!settings.camera.invert_x);
        assert_eq!(settings.capture, CaptureSettings::default());
    }

    #[test]
    fn inverted_deadzone_is_rejected() {
        let result = RemapSettings::from_toml("[deadzone]\nmin = 0.9\nmax = 0.4\n");
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn deadzone_is_a_hard_cutoff() {
        let deadzone = DeadzoneSettings { min: 0.5, max: 0.9 };
        assert_eq!(deadzone.apply(0.5), 0.0);
        assert_eq!(deadzone.apply(0.51), 0.51);
        assert_eq!(deadzone.apply(0.95), 1.0);
    }

    #[test]
    fn load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let created = RemapSettings::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(RemapSettings::load_or_create(&path).unwrap(), created);
    }
}
