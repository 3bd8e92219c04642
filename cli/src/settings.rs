//! Persistent operator settings (JSON)

use cosbit_core::FREQ_THRESHOLD;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "cosbit_settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TX volume {0} outside [0, 1]")]
    InvalidVolume(f32),

    #[error("RX threshold must be a positive frequency, got {0}")]
    InvalidThreshold(f32),
}

fn default_my_call() -> String {
    "N0CALL".to_string()
}

fn default_tx_volume() -> f32 {
    0.5
}

fn default_rx_threshold() -> f32 {
    FREQ_THRESHOLD
}

/// Missing keys fall back to their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_my_call")]
    pub my_call: String,
    #[serde(default = "default_tx_volume")]
    pub tx_volume: f32,
    #[serde(default = "default_rx_threshold")]
    pub rx_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            my_call: default_my_call(),
            tx_volume: default_tx_volume(),
            rx_threshold: default_rx_threshold(),
        }
    }
}

impl Settings {
    /// Load from `path`. A missing file gives the defaults; an unreadable or
    /// malformed one does too, with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(SettingsError::from)
            .and_then(|text| serde_json::from_str(&text).map_err(SettingsError::from));
        match parsed {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Error loading settings from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn set_tx_volume(&mut self, volume: f32) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(SettingsError::InvalidVolume(volume));
        }
        self.tx_volume = volume;
        Ok(())
    }

    pub fn set_rx_threshold(&mut self, threshold: f32) -> Result<(), SettingsError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(SettingsError::InvalidThreshold(threshold));
        }
        self.rx_threshold = threshold;
        Ok(())
    }
}
