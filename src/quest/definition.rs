//! Quest Definition Structures
//!
//! These structures are deserialized from TOML quest files, one quest per
//! file under `<data_dir>/quests/`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::LoadError;
use crate::memory::MemoryPiece;

/// A quest definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Names of the encounter zones that must be cleared
    #[serde(default)]
    pub zones: Vec<String>,
    /// Optional boss that must be defeated
    pub boss: Option<String>,
    pub reward: RawReward,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReward {
    pub piece: String,
    pub memory: String,
    #[serde(default)]
    pub image: String,
}

// ============================================================================
// Resolved Quest Definition
// ============================================================================

/// A validated quest definition. Zone and boss names are resolved to ids
/// when the ledger is built.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestDefinition {
    pub title: String,
    pub description: String,
    pub zones: Vec<String>,
    pub boss: Option<String>,
    pub reward: MemoryPiece,
}

impl QuestDefinition {
    pub fn from_raw(raw: &RawQuest) -> Result<Self, LoadError> {
        if raw.zones.is_empty() && raw.boss.is_none() {
            return Err(LoadError::EmptyQuest(raw.title.clone()));
        }

        Ok(Self {
            title: raw.title.clone(),
            description: raw.description.clone(),
            zones: raw.zones.clone(),
            boss: raw.boss.clone(),
            reward: MemoryPiece::new(&raw.reward.piece, &raw.reward.memory, &raw.reward.image),
        })
    }
}

/// Load every quest under `<data_dir>/quests`, recursing into
/// subdirectories. Files that fail to load are skipped with a warning.
pub fn load_quest_definitions(data_dir: &Path) -> Result<Vec<QuestDefinition>, LoadError> {
    let quest_dir = data_dir.join("quests");
    info!("Loading quests from {:?}", quest_dir);

    if !quest_dir.exists() {
        warn!("Quest directory does not exist: {:?}", quest_dir);
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    collect_toml_files(&quest_dir, &mut paths)?;
    paths.sort();

    let mut definitions = Vec::new();
    for path in paths {
        match load_quest_file(&path) {
            Ok(def) => {
                info!("Loaded quest: {}", def.title);
                definitions.push(def);
            }
            Err(e) => warn!("Skipping quest {:?}: {}", path, e),
        }
    }

    info!("Loaded {} quest definitions", definitions.len());
    Ok(definitions)
}

fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

fn load_quest_file(path: &Path) -> Result<QuestDefinition, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawQuestFile = toml::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    QuestDefinition::from_raw(&raw.quest)
}
