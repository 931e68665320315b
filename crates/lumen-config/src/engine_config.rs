//! Engine configuration file.
//!
//! ```toml
//! tick_rate_hz = 60.0
//! num_pixels = 300
//! device = "opc"
//! opc_server = "127.0.0.1:7890"
//! preset = "spectrum"
//! record_timings = true
//! snapshot = "/home/me/.config/lumen/graphs/stage.json"
//! ```
//!
//! Every field is optional; missing ones take the [`Default`] values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lumen_effects::DeviceKind;
use serde::{Deserialize, Serialize};

use crate::ConfigError;
use crate::presets::OutputTarget;

/// Runtime settings for the tick loop and the default graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target ticks per second.
    pub tick_rate_hz: f64,
    /// Strip length used when building a preset.
    pub num_pixels: usize,
    /// Output device for presets.
    pub device: DeviceKind,
    /// OPC server address.
    pub opc_server: String,
    /// Preset built when no snapshot is given.
    pub preset: String,
    /// Record per-node processing times.
    pub record_timings: bool,
    /// Snapshot to load instead of a preset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            num_pixels: 300,
            device: DeviceKind::Null,
            opc_server: "127.0.0.1:7890".to_owned(),
            preset: "spectrum".to_owned(),
            record_timings: true,
            snapshot: None,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Time between ticks. Non-positive or non-finite rates fall back to 60 Hz.
    pub fn tick_period(&self) -> Duration {
        let rate = if self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0 {
            self.tick_rate_hz
        } else {
            60.0
        };
        Duration::from_secs_f64(1.0 / rate)
    }

    /// Device settings for preset construction.
    pub fn output_target(&self) -> OutputTarget {
        OutputTarget {
            device: self.device,
            server: self.opc_server.clone(),
        }
    }
}
