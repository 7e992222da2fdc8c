//! Level data: everything under the data directory that describes one
//! playable level.
//!
//! ```text
//! data/
//!   engine.toml       engine configuration
//!   entities/*.toml   monster prototypes
//!   zones/*.toml      encounter zones and bosses
//!   quests/**/*.toml  one quest per file
//!   memories.toml     memory collections
//!   dialogue.toml     the quest giver's dialogue tree
//! ```

use glam::Vec3;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::dialogue::DialogueDefinition;
use crate::entity::PrototypeRegistry;
use crate::error::LoadError;
use crate::memory::{MemoryDefinition, load_memory_definitions};
use crate::quest::{QuestDefinition, load_quest_definitions};
use crate::spatial::Aabb;

// ============================================================================
// Raw TOML Structures
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawZoneFile {
    #[serde(default)]
    pub zone: Vec<RawZone>,
    #[serde(default)]
    pub boss: Vec<RawBoss>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawZone {
    pub name: String,
    pub min: [f32; 3],
    pub max: [f32; 3],
    /// Monster prototype spawned by this zone
    pub monster: Option<String>,
    /// Round number (as a string key) -> spawn count
    #[serde(default)]
    pub waves: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBoss {
    pub name: String,
    pub monster: String,
    pub position: [f32; 3],
}

// ============================================================================
// Resolved Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDefinition {
    pub name: String,
    pub bounds: Aabb,
    pub monster: Option<String>,
    pub waves: BTreeMap<u32, u32>,
}

impl ZoneDefinition {
    pub fn from_raw(raw: &RawZone) -> Result<Self, LoadError> {
        let mut waves = BTreeMap::new();
        for (key, count) in &raw.waves {
            let round: u32 = key.trim().parse().map_err(|_| LoadError::InvalidWaveRound {
                zone: raw.name.clone(),
                key: key.clone(),
            })?;
            waves.insert(round, *count);
        }

        Ok(Self {
            name: raw.name.clone(),
            bounds: Aabb::from_corners(Vec3::from_array(raw.min), Vec3::from_array(raw.max)),
            monster: raw.monster.clone(),
            waves,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BossDefinition {
    pub name: String,
    pub monster: String,
    pub position: Vec3,
}

impl From<&RawBoss> for BossDefinition {
    fn from(raw: &RawBoss) -> Self {
        Self {
            name: raw.name.clone(),
            monster: raw.monster.clone(),
            position: Vec3::from_array(raw.position),
        }
    }
}

/// Every definition a world is built from
pub struct LevelData {
    pub prototypes: PrototypeRegistry,
    pub zones: Vec<ZoneDefinition>,
    pub bosses: Vec<BossDefinition>,
    pub quests: Vec<QuestDefinition>,
    pub memories: Vec<MemoryDefinition>,
    pub dialogue: Option<DialogueDefinition>,
}

impl LevelData {
    pub fn load(data_dir: &Path) -> Result<Self, LoadError> {
        info!("Loading level from {:?}", data_dir);

        // Only an unreadable data directory is fatal
        std::fs::read_dir(data_dir).map_err(|source| LoadError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let mut prototypes = PrototypeRegistry::new();
        prototypes.load_from_directory(data_dir)?;

        let (zones, bosses) = load_zone_definitions(data_dir)?;

        let dialogue = match DialogueDefinition::load(data_dir) {
            Ok(dialogue) => dialogue,
            Err(e) => {
                warn!("Ignoring dialogue: {}", e);
                None
            }
        };

        let memories = match load_memory_definitions(data_dir) {
            Ok(memories) => memories,
            Err(e) => {
                warn!("Ignoring memories: {}", e);
                Vec::new()
            }
        };

        Ok(Self {
            prototypes,
            zones,
            bosses,
            quests: load_quest_definitions(data_dir)?,
            memories,
            dialogue,
        })
    }
}

/// Load `<data_dir>/zones/*.toml`, skipping unreadable files and invalid
/// zones with a warning
pub fn load_zone_definitions(
    data_dir: &Path,
) -> Result<(Vec<ZoneDefinition>, Vec<BossDefinition>), LoadError> {
    let zone_dir = data_dir.join("zones");
    let mut zones = Vec::new();
    let mut bosses = Vec::new();

    if !zone_dir.exists() {
        warn!("Zone directory does not exist: {:?}", zone_dir);
        return Ok((zones, bosses));
    }

    let entries = std::fs::read_dir(&zone_dir).map_err(|source| LoadError::Io {
        path: zone_dir.clone(),
        source,
    })?;
    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    for path in paths {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                continue;
            }
        };
        let raw: RawZoneFile = match toml::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                continue;
            }
        };

        for raw_zone in &raw.zone {
            match ZoneDefinition::from_raw(raw_zone) {
                Ok(zone) => zones.push(zone),
                Err(e) => warn!("Skipping zone in {:?}: {}", path, e),
            }
        }
        bosses.extend(raw.boss.iter().map(BossDefinition::from));
    }

    info!("Loaded {} zones and {} bosses", zones.len(), bosses.len());
    Ok((zones, bosses))
}
