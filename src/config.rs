//! Engine configuration loaded from `engine.toml`.
//!
//! Every field has a default so a partial (or missing) file still yields a
//! usable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::clock::Millis;
use crate::error::LoadError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames per second of the tick driver
    pub tick_rate_hz: u32,
    /// Delay between a round being cleared and the next round spawning
    pub wave_delay_ms: Millis,
    /// Spawn height above the top face of a zone's bounding box
    pub spawn_height_offset: f32,
    /// Time per revealed dialogue character
    pub text_speed_ms: Millis,
    /// Minimum time between two `next_line` calls
    pub advance_debounce_ms: Millis,
    /// Fixed seed for spawn placement; random when absent
    pub rng_seed: Option<u64>,
    /// Follow the wall clock; when false the driver steps time by one tick
    /// interval per frame without sleeping
    pub realtime: bool,
    /// Hard stop for the headless driver
    pub max_ticks: u64,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub name: String,
    pub max_health: i32,
    pub damage: i32,
    pub spawn: [f32; 3],
    /// Reach of the player's light ray attack
    pub attack_range: f32,
    pub attack_cooldown_ms: Millis,
    /// Distance walked per tick by the autopilot
    pub walk_step: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            wave_delay_ms: 1000,
            spawn_height_offset: 2.0,
            text_speed_ms: 40,
            advance_debounce_ms: 200,
            rng_seed: None,
            realtime: true,
            max_ticks: 100_000,
            player: PlayerConfig::default(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Dreamer".to_string(),
            max_health: 100,
            damage: 25,
            spawn: [0.0, 0.0, 0.0],
            attack_range: 12.0,
            attack_cooldown_ms: 400,
            walk_step: 0.5,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config file, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No engine config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded engine config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load engine config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.tick_rate_hz.max(1)))
    }
}
