//! Memory collections.
//!
//! A memory is a puzzle split into numbered pieces (`piece1`..`pieceN`).
//! Quests reward single pieces; the player's [`MemoryBook`] tracks which
//! ones have been unlocked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{LoadError, RewardError};

/// A reward piece granted by a quest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryPiece {
    /// Piece name, e.g. "piece7"
    pub name: String,
    /// Name of the memory collection this piece belongs to
    pub memory: String,
    /// Image shown by the memory menu
    pub image: String,
}

impl MemoryPiece {
    pub fn new(name: &str, memory: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            memory: memory.to_string(),
            image: image.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMemoryFile {
    #[serde(default)]
    pub memory: Vec<MemoryDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryDefinition {
    pub name: String,
    /// Directory holding the piece images
    pub puzzle: String,
    #[serde(default = "default_piece_count")]
    pub pieces: u32,
}

fn default_piece_count() -> u32 {
    25
}

/// Load `<data_dir>/memories.toml`. A missing file yields no memories.
pub fn load_memory_definitions(data_dir: &Path) -> Result<Vec<MemoryDefinition>, LoadError> {
    let path = data_dir.join("memories.toml");
    if !path.exists() {
        warn!("No memory definitions at {:?}", path);
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let raw: RawMemoryFile =
        toml::from_str(&content).map_err(|source| LoadError::Parse { path, source })?;

    info!("Loaded {} memory definitions", raw.memory.len());
    Ok(raw.memory)
}

#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    name: String,
    puzzle: String,
    pieces: Vec<String>,
    unlocked: BTreeSet<String>,
}

impl Memory {
    pub fn from_definition(def: &MemoryDefinition) -> Self {
        Self {
            name: def.name.clone(),
            puzzle: def.puzzle.clone(),
            pieces: (1..=def.pieces).map(|i| format!("piece{}", i)).collect(),
            unlocked: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unlock a piece. Nothing changes on error.
    pub fn unlock(&mut self, piece: &MemoryPiece) -> Result<(), RewardError> {
        if !self.pieces.iter().any(|p| *p == piece.name) {
            return Err(RewardError::UnknownPiece {
                memory: self.name.clone(),
                piece: piece.name.clone(),
            });
        }
        if !self.unlocked.insert(piece.name.clone()) {
            return Err(RewardError::AlreadyUnlocked {
                memory: self.name.clone(),
                piece: piece.name.clone(),
            });
        }
        Ok(())
    }

    pub fn is_unlocked(&self, piece_name: &str) -> bool {
        self.unlocked.contains(piece_name)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_complete(&self) -> bool {
        self.unlocked.len() == self.pieces.len()
    }

    pub fn image_path(&self, piece_name: &str) -> String {
        format!("{}/{}", self.puzzle, piece_name)
    }

    fn reset(&mut self) {
        self.unlocked.clear();
    }
}

/// All memory collections a player can fill
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryBook {
    memories: Vec<Memory>,
}

impl MemoryBook {
    pub fn new(definitions: &[MemoryDefinition]) -> Self {
        Self {
            memories: definitions.iter().map(Memory::from_definition).collect(),
        }
    }

    /// Unlock a reward piece in the collection it names
    pub fn unlock(&mut self, piece: &MemoryPiece) -> Result<(), RewardError> {
        let memory = self
            .memories
            .iter_mut()
            .find(|m| m.name == piece.memory)
            .ok_or_else(|| RewardError::UnknownMemory {
                memory: piece.memory.clone(),
                piece: piece.name.clone(),
            })?;
        memory.unlock(piece)
    }

    pub fn get(&self, name: &str) -> Option<&Memory> {
        self.memories.iter().find(|m| m.name == name)
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn unlocked_total(&self) -> usize {
        self.memories.iter().map(Memory::unlocked_count).sum()
    }

    pub fn reset(&mut self) {
        for memory in &mut self.memories {
            memory.reset();
        }
    }
}
