//! Free-roaming bosses.
//!
//! A boss is a world-owned monster standing at a fixed point on the map.
//! It sleeps until a quest that names it is accepted, then fights like any
//! other monster. Its corpse is removed after the usual death linger.

use glam::Vec3;
use serde::Serialize;
use tracing::info;

use crate::clock::Millis;
use crate::entity::MonsterPrototype;
use crate::hits::{HitRegistry, MonsterHandle, MonsterOwner};
use crate::monster::{AttackIntent, MonsterAgent, MonsterState, MonsterView};
use crate::player::PlayerSnapshot;
use crate::presenter::Presenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BossId(pub usize);

#[derive(Debug)]
pub struct Boss {
    id: BossId,
    name: String,
    prototype: MonsterPrototype,
    spawn_point: Vec3,
    agent: MonsterAgent,
    /// Woken by an accepted quest
    active: bool,
    /// Corpse already cleaned up
    removed: bool,
}

impl Boss {
    pub fn new(
        id: BossId,
        name: &str,
        prototype: MonsterPrototype,
        spawn_point: Vec3,
        hits: &mut HitRegistry,
    ) -> Self {
        let agent = Self::make_agent(&prototype, spawn_point, hits);
        Self {
            id,
            name: name.to_string(),
            prototype,
            spawn_point,
            agent,
            active: false,
            removed: false,
        }
    }

    fn make_agent(prototype: &MonsterPrototype, at: Vec3, hits: &mut HitRegistry) -> MonsterAgent {
        let monster = hits.next_monster_id();
        let hit = hits.register(MonsterHandle {
            owner: MonsterOwner::World,
            monster,
        });
        MonsterAgent::from_prototype(monster, hit, prototype, at)
    }

    pub fn id(&self) -> BossId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agent(&self) -> &MonsterAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut MonsterAgent {
        &mut self.agent
    }

    pub fn position(&self) -> Vec3 {
        self.agent.position
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_alive(&self) -> bool {
        self.agent.is_alive()
    }

    pub fn activate(&mut self, presenter: &dyn Presenter) {
        if self.active || !self.agent.is_alive() {
            return;
        }
        self.active = true;
        presenter.monster_spawned(
            self.agent.id,
            self.agent.hit,
            &self.agent.model,
            self.agent.position,
        );
        info!("Boss '{}' awakens", self.name);
    }

    pub fn tick(
        &mut self,
        now: Millis,
        players: &[PlayerSnapshot],
        hits: &mut HitRegistry,
        presenter: &dyn Presenter,
    ) -> Option<AttackIntent> {
        if self.removed {
            return None;
        }

        if self.agent.state == MonsterState::Dead {
            if self.agent.is_removable(now) {
                hits.remove(self.agent.hit);
                presenter.monster_despawned(self.agent.id);
                self.removed = true;
            }
            return None;
        }

        if !self.active {
            return None;
        }

        let attack = self.agent.tick(players, now);
        presenter.monster_moved(
            self.agent.id,
            self.agent.position,
            self.agent.yaw,
            self.agent.state,
        );
        if let Some(attack) = &attack {
            presenter.monster_attacked(self.agent.id, attack.target);
        }
        attack
    }

    /// Fresh boss at its spawn point, asleep again
    pub fn reset_session(&mut self, hits: &mut HitRegistry, presenter: &dyn Presenter) {
        if !self.removed {
            hits.remove(self.agent.hit);
            if self.active {
                presenter.monster_despawned(self.agent.id);
            }
        }
        self.agent = Self::make_agent(&self.prototype, self.spawn_point, hits);
        self.active = false;
        self.removed = false;
    }

    pub fn view(&self) -> BossView {
        BossView {
            id: self.id,
            name: self.name.clone(),
            active: self.active,
            alive: self.is_alive(),
            monster: MonsterView::from(&self.agent),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BossView {
    pub id: BossId,
    pub name: String,
    pub active: bool,
    pub alive: bool,
    pub monster: MonsterView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;
    use crate::presenter::NullPresenter;

    fn boss(hits: &mut HitRegistry) -> Boss {
        let mut proto = MonsterPrototype::basic("goblin_boss");
        proto.stats.health = 200;
        proto.stats.damage = 25;
        Boss::new(BossId(0), "Goblin King", proto, Vec3::new(100.0, 0.0, 100.0), hits)
    }

    #[test]
    fn test_dormant_until_activated() {
        let mut hits = HitRegistry::new();
        let mut b = boss(&mut hits);
        let player = PlayerSnapshot {
            id: PlayerId(1),
            position: Vec3::new(101.0, 0.0, 100.0),
            alive: true,
        };

        assert!(b.tick(0, &[player], &mut hits, &NullPresenter).is_none());
        assert_eq!(b.agent().state, MonsterState::Idle);

        b.activate(&NullPresenter);
        let attack = b.tick(10, &[player], &mut hits, &NullPresenter).unwrap();
        assert_eq!(attack.damage, 25);
    }

    #[test]
    fn test_corpse_removed_and_reset() {
        let mut hits = HitRegistry::new();
        let mut b = boss(&mut hits);
        let first_hit = b.agent().hit;
        b.activate(&NullPresenter);

        assert!(b.agent_mut().take_damage(250, 0));
        assert!(!b.is_alive());
        b.tick(1000, &[], &mut hits, &NullPresenter);
        assert!(hits.resolve(first_hit).is_none());

        b.reset_session(&mut hits, &NullPresenter);
        assert!(b.is_alive());
        assert!(!b.is_active());
        assert_eq!(b.agent().health, 200);
        assert!(hits.resolve(b.agent().hit).is_some());
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_corpse_removed_while_dormant() {
        let mut hits = HitRegistry::new();
        let mut b = boss(&mut hits);
        let hit = b.agent().hit;

        assert!(b.agent_mut().take_damage(250, 0));
        assert!(b.tick(500, &[], &mut hits, &NullPresenter).is_none());
        assert!(hits.resolve(hit).is_some());

        b.tick(1000, &[], &mut hits, &NullPresenter);
        assert!(hits.resolve(hit).is_none());
        assert!(hits.is_empty());
    }
}
