// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration.
//!
//! Stored as RON. Every field has a default, so a config file only needs the
//! values it overrides.

use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Config format version
    pub version: u32,
    /// Host frames per second; one fixed step per frame at time scale 1
    pub frame_rate: f64,
    /// Simulation speed multiplier
    pub time_scale: f32,
    /// Hard cap on host frames
    pub max_frames: u64,
    /// Host frame at which to round-trip state through a simulated code reload
    pub reload_at_frame: Option<u64>,
    /// Stop once the choreography reports finished
    pub stop_when_finished: bool,
    /// Times to play the choreography, restarting in between
    pub loop_count: u32,
    /// Screen size the camera is centered on
    pub screen_size: [f32; 2],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            frame_rate: 60.0,
            time_scale: 1.0,
            max_frames: 60 * 60,
            reload_at_frame: None,
            stop_when_finished: true,
            loop_count: 1,
            screen_size: [800.0, 600.0],
        }
    }
}

impl PlayerConfig {
    /// Parse a config from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: PlayerConfig = ron::from_str(text)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(PlayerError::UnsupportedConfig {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded player config from {:?}", path);
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::debug!("No config path given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Render as pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Save the config file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved player config to {:?}", path);
        Ok(())
    }

    /// Seconds per fixed step
    pub fn fixed_timestep(&self) -> f64 {
        1.0 / self.frame_rate
    }

    fn validate(&self) -> Result<()> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(PlayerError::InvalidConfig(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.loop_count == 0 {
            return Err(PlayerError::InvalidConfig("loop_count must be at least 1".into()));
        }
        Ok(())
    }
}
