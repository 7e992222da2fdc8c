//! Error types.
//!
//! None of these ever reach the tick driver. Loaders skip the offending
//! record and the world logs rejected player actions.

use std::path::PathBuf;
use thiserror::Error;

/// Problems reading level data from disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("zone '{zone}' has invalid wave round '{key}'")]
    InvalidWaveRound { zone: String, key: String },

    #[error("entity '{id}' extends unknown parent '{parent}'")]
    UnknownParent { id: String, parent: String },

    #[error("circular inheritance detected at '{0}'")]
    CircularInheritance(String),

    #[error("unknown monster prototype '{0}'")]
    UnknownPrototype(String),

    #[error("quest '{0}' has no zones and no boss")]
    EmptyQuest(String),

    #[error("quest '{quest}' references unknown zone '{zone}'")]
    UnknownZone { quest: String, zone: String },

    #[error("quest '{quest}' references unknown boss '{boss}'")]
    UnknownBoss { quest: String, boss: String },
}

/// A reward piece that does not fit the player's memory collections
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewardError {
    #[error("memory '{memory}' does not exist (piece '{piece}')")]
    UnknownMemory { memory: String, piece: String },

    #[error("piece '{piece}' is not part of memory '{memory}'")]
    UnknownPiece { memory: String, piece: String },

    #[error("piece '{piece}' of memory '{memory}' is already unlocked")]
    AlreadyUnlocked { memory: String, piece: String },
}

/// Reasons a quest action from the UI was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuestError {
    #[error("quest not found: {0}")]
    NotFound(String),

    #[error("quest '{0}' is not offered yet")]
    NotOffered(String),

    #[error("quest '{0}' was already accepted")]
    AlreadyAccepted(String),

    #[error("quest '{0}' is not completed")]
    NotCompleted(String),

    #[error("reward for quest '{0}' was already claimed")]
    RewardAlreadyClaimed(String),

    #[error("player not found: {0}")]
    UnknownPlayer(u32),

    #[error(transparent)]
    Reward(#[from] RewardError),
}
