//! The world's record of a player.
//!
//! Monsters see players only through [`PlayerSnapshot`]s taken at the start
//! of a tick; damage and rewards are applied back through [`Player`].

use glam::Vec3;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::RewardError;
use crate::memory::{MemoryBook, MemoryPiece};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlayerId(pub u32);

/// Read-only view handed to monster AI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub position: Vec3,
    pub alive: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Vec3,
    pub spawn: Vec3,
    pub health: i32,
    pub max_health: i32,
    pub damage: i32,
    base_damage: i32,
    pub memories: MemoryBook,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: &str,
        spawn: Vec3,
        max_health: i32,
        damage: i32,
        memories: MemoryBook,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            position: spawn,
            spawn,
            health: max_health,
            max_health,
            damage,
            base_damage: damage,
            memories,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Take damage and return true if the player died
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = (self.health - amount.max(0)).max(0);
        debug!("Player {} takes {} damage (HP: {})", self.name, amount, self.health);
        if self.health == 0 {
            info!("Player {} has died", self.name);
            true
        } else {
            false
        }
    }

    /// Unlock a reward piece. Each piece also sharpens the player's attack.
    pub fn claim_reward(&mut self, piece: &MemoryPiece) -> Result<(), RewardError> {
        self.memories.unlock(piece)?;
        self.damage += 1;
        info!("Player {} unlocked {} of {}", self.name, piece.name, piece.memory);
        Ok(())
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            position: self.position,
            alive: self.is_alive(),
        }
    }

    /// Back to spawn with full health and an empty memory book
    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.health = self.max_health;
        self.damage = self.base_damage;
        self.memories.reset();
    }
}
