use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::SirenConfig;
use crate::render::AlarmText;
use crate::threshold::ThresholdConfig;

/// Login for servers that gate the status endpoint behind a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Count at which the bar is full
    pub threshold: u32,
    /// Counts above this turn the bar to warning
    pub warning_level: u32,
    /// WAV played while the alarm is active; the siren is used without it
    pub alarm_sound: Option<PathBuf>,
    pub siren: SirenConfig,
    pub text: AlarmText,
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            poll_interval_ms: 1000,
            request_timeout_ms: 5000,
            threshold: ThresholdConfig::default().threshold(),
            warning_level: ThresholdConfig::default().warning_level(),
            alarm_sound: Some(Self::data_dir().join("alarm.wav")),
            siren: SirenConfig::default(),
            text: AlarmText::default(),
            credentials: None,
        }
    }
}

impl Config {
    /// Directory: ~/.config/occupancy-alarm/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("occupancy-alarm");
        p
    }

    /// Directory: ~/.local/share/occupancy-alarm/
    pub fn data_dir() -> PathBuf {
        let mut p = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("occupancy-alarm");
        p
    }

    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk, returning defaults if the file doesn't exist or is invalid.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    /// Validated threshold pair, or the defaults if the configured one is unusable.
    pub fn threshold_config(&self) -> ThresholdConfig {
        ThresholdConfig::new(self.threshold, self.warning_level).unwrap_or_else(|e| {
            let fallback = ThresholdConfig::default();
            log::warn!(
                "Invalid threshold config ({e}), using {}/{}",
                fallback.threshold(),
                fallback.warning_level()
            );
            fallback
        })
    }
}
