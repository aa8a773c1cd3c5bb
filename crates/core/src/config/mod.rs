use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, StagehandError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub director: DirectorConfig,
    pub audio: AudioConfig,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&raw)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Surface size and frame rate used by the director.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub width: f64,
    pub height: f64,
    pub fps: u32,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            fps: 60,
        }
    }
}

impl DirectorConfig {
    /// Length of one fixed-step frame in milliseconds.
    pub fn frame_duration_ms(&self) -> Result<f64> {
        if self.fps == 0 {
            return Err(StagehandError::InvalidInput(
                "fps must be greater than zero".to_string(),
            ));
        }
        Ok(1000.0 / f64::from(self.fps))
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub channels: usize,
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 8,
            enabled: true,
        }
    }
}
