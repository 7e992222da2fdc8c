use serde::{Deserialize, Serialize};

use crate::clock::Millis;

// ============================================================================
// Raw TOML Structures (direct deserialization)
// ============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMonsterStats {
    pub health: Option<i32>,
    pub damage: Option<i32>,
    pub detection_radius: Option<f32>,
    pub attack_range: Option<f32>,
    pub move_step: Option<f32>,
    pub attack_cooldown_ms: Option<Millis>,
    pub death_linger_ms: Option<Millis>,
}

/// Raw monster prototype as loaded directly from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawMonsterPrototype {
    pub extends: Option<String>,
    pub display_name: Option<String>,
    pub model: Option<String>,
    pub boss: Option<bool>,

    #[serde(default)]
    pub stats: RawMonsterStats,
}

// ============================================================================
// Resolved Structures (after inheritance)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsterStats {
    pub health: i32,
    pub damage: i32,
    /// Players further than this are ignored
    pub detection_radius: f32,
    /// Closer than this the monster stops and attacks
    pub attack_range: f32,
    /// Distance covered per tick while pursuing
    pub move_step: f32,
    pub attack_cooldown_ms: Millis,
    /// Time between death and removal, covers the death animation
    pub death_linger_ms: Millis,
}

impl Default for MonsterStats {
    fn default() -> Self {
        Self {
            health: 100,
            damage: 10,
            detection_radius: 50.0,
            attack_range: 2.0,
            move_step: 0.1,
            attack_cooldown_ms: 2000,
            death_linger_ms: 1000,
        }
    }
}

/// Fully resolved monster prototype (after inheritance resolution)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsterPrototype {
    pub id: String,
    pub display_name: String,
    pub model: String,
    pub boss: bool,
    pub stats: MonsterStats,
}

impl MonsterPrototype {
    /// Prototype with default stats, used when a zone names no prototype
    pub fn basic(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            model: "sphere".to_string(),
            boss: false,
            stats: MonsterStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: MonsterStats) -> Self {
        self.stats = stats;
        self
    }
}
