use glam::Vec3;
use serde::Serialize;
use tracing::debug;

use crate::clock::Millis;
use crate::entity::{MonsterPrototype, MonsterStats};
use crate::hits::HitId;
use crate::player::{PlayerId, PlayerSnapshot};
use crate::spatial::facing_yaw;

// ============================================================================
// Monster State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterState {
    Idle,
    Pursuing,
    Attacking,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonsterId(pub u64);

/// Damage a monster deals this tick, applied to the player by the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    pub monster: MonsterId,
    pub target: PlayerId,
    pub damage: i32,
}

// ============================================================================
// Monster Entity
// ============================================================================

#[derive(Debug, Clone)]
pub struct MonsterAgent {
    pub id: MonsterId,
    pub hit: HitId,
    /// Prototype this monster was built from (e.g. "slime")
    pub prototype_id: String,
    pub display_name: String,
    pub model: String,
    pub stats: MonsterStats,
    pub position: Vec3,
    pub yaw: f32,
    pub health: i32,
    pub state: MonsterState,
    /// Player it is locked onto. Re-evaluated every tick.
    pub target: Option<PlayerId>,
    pub last_attack_time: Option<Millis>,
    pub death_time: Option<Millis>,
    /// Set on the tick this monster attacks, for animation sync
    pub just_attacked: bool,
}

impl MonsterAgent {
    pub fn from_prototype(
        id: MonsterId,
        hit: HitId,
        prototype: &MonsterPrototype,
        position: Vec3,
    ) -> Self {
        Self {
            id,
            hit,
            prototype_id: prototype.id.clone(),
            display_name: prototype.display_name.clone(),
            model: prototype.model.clone(),
            stats: prototype.stats.clone(),
            position,
            yaw: 0.0,
            health: prototype.stats.health,
            state: MonsterState::Idle,
            target: None,
            last_attack_time: None,
            death_time: None,
            just_attacked: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state != MonsterState::Dead
    }

    /// Take damage and return true if this blow killed the monster.
    ///
    /// Health drops by exactly `amount`. Once dead, further damage is
    /// ignored and health stays where the killing blow left it.
    pub fn take_damage(&mut self, amount: i32, now: Millis) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.health -= amount.max(0);
        debug!("{} takes {} damage (HP: {})", self.display_name, amount, self.health);

        if self.health <= 0 {
            self.state = MonsterState::Dead;
            self.death_time = Some(now);
            self.target = None;
            true
        } else {
            false
        }
    }

    /// Dead long enough for the death animation to finish
    pub fn is_removable(&self, now: Millis) -> bool {
        match self.death_time {
            Some(died) => now.saturating_sub(died) >= self.stats.death_linger_ms,
            None => false,
        }
    }

    fn nearest_target(&self, players: &[PlayerSnapshot]) -> Option<(PlayerId, Vec3, f32)> {
        players
            .iter()
            .filter(|p| p.alive)
            .map(|p| (p.id, p.position, self.position.distance(p.position)))
            .filter(|(_, _, dist)| *dist <= self.stats.detection_radius)
            .min_by(|a, b| a.2.total_cmp(&b.2))
    }

    /// Update AI state and movement.
    /// Returns an attack if the monster strikes its target this tick.
    pub fn tick(&mut self, players: &[PlayerSnapshot], now: Millis) -> Option<AttackIntent> {
        // Reset each tick, set again if we attack
        self.just_attacked = false;

        if self.state == MonsterState::Dead {
            return None;
        }

        let Some((target, target_pos, dist)) = self.nearest_target(players) else {
            self.state = MonsterState::Idle;
            self.target = None;
            return None;
        };

        self.target = Some(target);
        self.yaw = facing_yaw(self.position, target_pos);

        if dist > self.stats.attack_range {
            self.state = MonsterState::Pursuing;
            let step = self.stats.move_step.min(dist);
            let direction = (target_pos - self.position).normalize_or_zero();
            self.position += direction * step;
            None
        } else {
            self.state = MonsterState::Attacking;
            self.attack(now)
        }
    }

    /// Strike the current target unless still cooling down
    pub fn attack(&mut self, now: Millis) -> Option<AttackIntent> {
        let target = self.target?;

        if let Some(last) = self.last_attack_time {
            if now.saturating_sub(last) < self.stats.attack_cooldown_ms {
                return None;
            }
        }

        self.last_attack_time = Some(now);
        self.just_attacked = true;
        Some(AttackIntent {
            monster: self.id,
            target,
            damage: self.stats.damage,
        })
    }
}

// ============================================================================
// Monster view for snapshots
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MonsterView {
    pub id: MonsterId,
    pub prototype: String,
    pub position: [f32; 3],
    pub health: i32,
    pub state: MonsterState,
}

impl From<&MonsterAgent> for MonsterView {
    fn from(monster: &MonsterAgent) -> Self {
        Self {
            id: monster.id,
            prototype: monster.prototype_id.clone(),
            position: monster.position.to_array(),
            health: monster.health,
            state: monster.state,
        }
    }
}
