//! Encounter zones.
//!
//! A zone is a box on the map that spawns monsters in rounds while a player
//! stands inside it. Each round spawns only after the previous one has been
//! wiped out; clearing the last round completes the zone for the session.
//! Leaving the box resets the zone to round 0.

use rand::RngCore;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::clock::Millis;
use crate::config::EngineConfig;
use crate::entity::MonsterPrototype;
use crate::hits::{HitRegistry, MonsterHandle, MonsterOwner};
use crate::monster::{AttackIntent, MonsterAgent, MonsterId, MonsterView};
use crate::player::PlayerSnapshot;
use crate::presenter::Presenter;
use crate::spatial::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ZoneId(pub usize);

/// Shared services a zone needs while it ticks
pub struct SpawnContext<'a> {
    pub rng: &'a mut dyn RngCore,
    pub hits: &'a mut HitRegistry,
    pub presenter: &'a dyn Presenter,
    pub config: &'a EngineConfig,
}

/// What happened inside a zone during one tick
#[derive(Debug, Default)]
pub struct ZoneTick {
    pub attacks: Vec<AttackIntent>,
    /// The final round was cleared this tick
    pub completed: bool,
}

#[derive(Debug)]
pub struct EncounterZone {
    id: ZoneId,
    name: String,
    bounds: Aabb,
    prototype: MonsterPrototype,
    /// Round number -> monsters spawned in that round
    wave_plan: BTreeMap<u32, u32>,
    last_round: u32,
    current_round: u32,
    monsters: Vec<MonsterAgent>,
    /// Activated by an accepted quest; inactive zones ignore players
    active: bool,
    player_present: bool,
    busy_spawning: bool,
    busy_resetting: bool,
    completed: bool,
    spawn_resume_at: Option<Millis>,
    /// Round -> monsters spawned, kept until the zone resets
    spawn_history: BTreeMap<u32, u32>,
}

impl EncounterZone {
    pub fn new(
        id: ZoneId,
        name: &str,
        bounds: Aabb,
        mut wave_plan: BTreeMap<u32, u32>,
        prototype: MonsterPrototype,
    ) -> Self {
        if wave_plan.is_empty() {
            wave_plan.insert(0, 1);
        }
        let last_round = wave_plan.keys().next_back().copied().unwrap_or(0);

        Self {
            id,
            name: name.to_string(),
            bounds,
            prototype,
            wave_plan,
            last_round,
            current_round: 0,
            monsters: Vec::new(),
            active: false,
            player_present: false,
            busy_spawning: false,
            busy_resetting: false,
            completed: false,
            spawn_resume_at: None,
            spawn_history: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn last_round(&self) -> u32 {
        self.last_round
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_player_present(&self) -> bool {
        self.player_present
    }

    pub fn is_busy_spawning(&self) -> bool {
        self.busy_spawning
    }

    pub fn monsters(&self) -> &[MonsterAgent] {
        &self.monsters
    }

    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut MonsterAgent> {
        self.monsters.iter_mut().find(|m| m.id == id)
    }

    pub fn living_count(&self) -> usize {
        self.monsters.iter().filter(|m| m.is_alive()).count()
    }

    pub fn spawned_in_round(&self, round: u32) -> Option<u32> {
        self.spawn_history.get(&round).copied()
    }

    /// Monsters spawned for a round. Rounds missing from the plan spawn one.
    pub fn wave_count(&self, round: u32) -> u32 {
        self.wave_plan.get(&round).copied().unwrap_or(1)
    }

    /// Make the zone available to players. Completed zones stay completed.
    pub fn activate(&mut self, presenter: &dyn Presenter) {
        if self.completed || self.active {
            return;
        }
        self.active = true;
        presenter.zone_visibility(self.id, true);
        info!("Zone '{}' activated", self.name);
    }

    pub fn tick(
        &mut self,
        now: Millis,
        players: &[PlayerSnapshot],
        ctx: &mut SpawnContext<'_>,
    ) -> ZoneTick {
        let mut result = ZoneTick::default();

        // Corpses leave once their death animation is over, whatever else
        // the zone is doing
        self.remove_corpses(now, ctx);

        if !self.active {
            return result;
        }

        if self.busy_spawning {
            if self.spawn_resume_at.is_some_and(|at| now >= at) {
                let round = self.current_round;
                self.spawn_wave(round, ctx);
                self.current_round += 1;
                self.spawn_resume_at = None;
                self.busy_spawning = false;
            }
            return result;
        }
        if self.busy_resetting {
            return result;
        }

        // 1. Containment
        let contained = players.iter().any(|p| self.bounds.contains_xz(p.position));

        if contained && !self.player_present {
            self.spawn_wave(0, ctx);
            self.player_present = true;
            self.current_round = 1;
            ctx.presenter.zone_visibility(self.id, false);
            return result;
        }

        if !contained {
            if self.player_present {
                self.reset(ctx.hits, ctx.presenter);
            }
            return result;
        }

        // 2. Liveness filter
        for monster in &mut self.monsters {
            if let Some(attack) = monster.tick(players, now) {
                ctx.presenter.monster_attacked(monster.id, attack.target);
                result.attacks.push(attack);
            }
            if monster.is_alive() {
                ctx.presenter
                    .monster_moved(monster.id, monster.position, monster.yaw, monster.state);
            }
        }

        if self.living_count() > 0 {
            return result;
        }

        // 3. Round decision
        if self.current_round <= self.last_round {
            self.busy_spawning = true;
            self.spawn_resume_at = Some(now + ctx.config.wave_delay_ms);
            debug!(
                "Zone '{}' cleared round {}, next wave at {}",
                self.name,
                self.current_round.saturating_sub(1),
                now + ctx.config.wave_delay_ms
            );
        } else {
            self.completed = true;
            self.active = false;
            result.completed = true;
            info!("Zone '{}' completed", self.name);
        }

        result
    }

    fn spawn_wave(&mut self, round: u32, ctx: &mut SpawnContext<'_>) {
        let count = self.wave_count(round);
        for _ in 0..count {
            let id = ctx.hits.next_monster_id();
            let hit = ctx.hits.register(MonsterHandle {
                owner: MonsterOwner::Zone(self.id),
                monster: id,
            });
            let position = self
                .bounds
                .random_spawn_point(&mut *ctx.rng, ctx.config.spawn_height_offset);
            let monster = MonsterAgent::from_prototype(id, hit, &self.prototype, position);
            ctx.presenter
                .monster_spawned(id, hit, &monster.model, monster.position);
            self.monsters.push(monster);
        }
        *self.spawn_history.entry(round).or_insert(0) += count;
        info!("Zone '{}' spawned {} monsters for round {}", self.name, count, round);
    }

    fn remove_corpses(&mut self, now: Millis, ctx: &mut SpawnContext<'_>) {
        if !self.monsters.iter().any(|m| m.is_removable(now)) {
            return;
        }
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.monsters)
            .into_iter()
            .partition(|m| m.is_removable(now));
        self.monsters = kept;
        for monster in removed {
            ctx.hits.remove(monster.hit);
            ctx.presenter.monster_despawned(monster.id);
        }
    }

    fn despawn_all(&mut self, hits: &mut HitRegistry, presenter: &dyn Presenter) {
        for monster in self.monsters.drain(..) {
            hits.remove(monster.hit);
            presenter.monster_despawned(monster.id);
        }
    }

    /// Player left: drop every monster and start over from round 0
    fn reset(&mut self, hits: &mut HitRegistry, presenter: &dyn Presenter) {
        self.busy_resetting = true;
        self.despawn_all(hits, presenter);
        self.current_round = 0;
        self.player_present = false;
        self.spawn_history.clear();
        presenter.zone_visibility(self.id, true);
        info!("Zone '{}' reset, player left", self.name);
        self.busy_resetting = false;
    }

    /// Back to the dormant state a level starts in
    pub fn reset_session(&mut self, hits: &mut HitRegistry, presenter: &dyn Presenter) {
        self.despawn_all(hits, presenter);
        self.current_round = 0;
        self.active = false;
        self.player_present = false;
        self.busy_spawning = false;
        self.busy_resetting = false;
        self.completed = false;
        self.spawn_resume_at = None;
        self.spawn_history.clear();
        presenter.zone_visibility(self.id, false);
    }

    pub fn view(&self) -> ZoneView {
        ZoneView {
            id: self.id,
            name: self.name.clone(),
            active: self.active,
            completed: self.completed,
            player_present: self.player_present,
            current_round: self.current_round,
            last_round: self.last_round,
            living: self.living_count(),
            monsters: self.monsters.iter().map(MonsterView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneView {
    pub id: ZoneId,
    pub name: String,
    pub active: bool,
    pub completed: bool,
    pub player_present: bool,
    pub current_round: u32,
    pub last_round: u32,
    pub living: usize,
    pub monsters: Vec<MonsterView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;
    use crate::presenter::NullPresenter;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Harness {
        rng: StdRng,
        hits: HitRegistry,
        config: EngineConfig,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                rng: StdRng::seed_from_u64(7),
                hits: HitRegistry::new(),
                config: EngineConfig::default(),
            }
        }

        fn tick(&mut self, zone: &mut EncounterZone, now: Millis, players: &[PlayerSnapshot]) -> ZoneTick {
            let mut ctx = SpawnContext {
                rng: &mut self.rng,
                hits: &mut self.hits,
                presenter: &NullPresenter,
                config: &self.config,
            };
            zone.tick(now, players, &mut ctx)
        }
    }

    fn zone(plan: &[(u32, u32)]) -> EncounterZone {
        // Passive monsters keep the player alive in these tests
        let mut proto = MonsterPrototype::basic("slime");
        proto.stats.detection_radius = 0.0;
        let mut zone = EncounterZone::new(
            ZoneId(0),
            "meadow",
            Aabb::from_corners(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 4.0, 10.0)),
            plan.iter().copied().collect(),
            proto,
        );
        zone.activate(&NullPresenter);
        zone
    }

    fn inside() -> PlayerSnapshot {
        PlayerSnapshot {
            id: PlayerId(1),
            // Altitude does not matter for containment
            position: Vec3::new(5.0, 40.0, 5.0),
            alive: true,
        }
    }

    fn outside() -> PlayerSnapshot {
        PlayerSnapshot {
            id: PlayerId(1),
            position: Vec3::new(50.0, 0.0, 5.0),
            alive: true,
        }
    }

    fn kill_all(zone: &mut EncounterZone, now: Millis) {
        let ids: Vec<_> = zone.monsters().iter().map(|m| m.id).collect();
        for id in ids {
            if let Some(m) = zone.monster_mut(id) {
                m.take_damage(1000, now);
            }
        }
    }

    #[test]
    fn test_inactive_zone_ignores_player() {
        let mut h = Harness::new();
        let mut z = EncounterZone::new(
            ZoneId(1),
            "dormant",
            Aabb::from_corners(Vec3::ZERO, Vec3::splat(10.0)),
            BTreeMap::new(),
            MonsterPrototype::basic("slime"),
        );
        h.tick(&mut z, 0, &[inside()]);
        assert!(z.monsters().is_empty());
        assert!(!z.is_player_present());
    }

    #[test]
    fn test_two_round_encounter() {
        let mut h = Harness::new();
        let mut z = zone(&[(0, 2), (1, 3)]);
        let p = [inside()];

        // Entry spawns round 0
        h.tick(&mut z, 0, &p);
        assert_eq!(z.monsters().len(), 2);
        assert_eq!(z.current_round(), 1);
        for m in z.monsters() {
            assert!((m.position.y - 6.0).abs() < 1e-5);
            assert!(z.bounds().contains_xz(m.position));
        }

        kill_all(&mut z, 100);
        // Round cleared, corpses still lingering
        h.tick(&mut z, 500, &p);
        assert_eq!(z.monsters().len(), 2);
        assert!(z.is_busy_spawning());

        // Corpses removed while waiting on the wave delay
        h.tick(&mut z, 1100, &p);
        assert!(z.monsters().is_empty());
        assert!(z.is_busy_spawning());

        h.tick(&mut z, 1500, &p);
        assert_eq!(z.monsters().len(), 3);
        assert_eq!(z.current_round(), 2);
        assert_eq!(z.spawned_in_round(1), Some(3));
        assert!(z.current_round() <= z.last_round() + 1);

        kill_all(&mut z, 2200);
        let done = h.tick(&mut z, 2300, &p);
        assert!(done.completed);
        assert!(z.is_completed());
        assert!(!z.is_active());

        // No further spawns
        h.tick(&mut z, 9000, &p);
        assert!(z.monsters().is_empty());
        assert!(h.hits.is_empty());
    }

    #[test]
    fn test_missing_round_spawns_one() {
        let mut h = Harness::new();
        let mut z = zone(&[(0, 2), (2, 4)]);
        let p = [inside()];

        h.tick(&mut z, 0, &p);
        kill_all(&mut z, 0);
        h.tick(&mut z, 1000, &p);
        h.tick(&mut z, 2000, &p);
        assert_eq!(z.monsters().len(), 1);
        assert_eq!(z.wave_count(1), 1);
    }

    #[test]
    fn test_leaving_resets_zone() {
        let mut h = Harness::new();
        let mut z = zone(&[(0, 2), (1, 3)]);

        h.tick(&mut z, 0, &[inside()]);
        assert_eq!(h.hits.len(), 2);

        h.tick(&mut z, 100, &[outside()]);
        assert!(z.monsters().is_empty());
        assert_eq!(z.current_round(), 0);
        assert!(!z.is_player_present());
        assert!(h.hits.is_empty());
        assert!(z.is_active());

        // Re-entering starts over
        h.tick(&mut z, 200, &[inside()]);
        assert_eq!(z.monsters().len(), 2);
    }

    #[test]
    fn test_leaving_mid_spawn_completes_then_resets() {
        let mut h = Harness::new();
        let mut z = zone(&[(0, 1), (1, 2)]);

        h.tick(&mut z, 0, &[inside()]);
        kill_all(&mut z, 0);
        h.tick(&mut z, 1000, &[inside()]);
        assert!(z.is_busy_spawning());

        // Player walks away during the delay, spawn still happens
        h.tick(&mut z, 1500, &[outside()]);
        assert!(z.is_busy_spawning());
        h.tick(&mut z, 2000, &[outside()]);
        assert_eq!(z.monsters().len(), 2);
        assert_eq!(z.current_round(), 2);

        // Next tick notices the player is gone
        h.tick(&mut z, 2016, &[outside()]);
        assert!(z.monsters().is_empty());
        assert_eq!(z.current_round(), 0);
    }

    #[test]
    fn test_empty_plan_spawns_single_monster() {
        let mut h = Harness::new();
        let mut z = zone(&[]);
        assert_eq!(z.last_round(), 0);

        h.tick(&mut z, 0, &[inside()]);
        assert_eq!(z.monsters().len(), 1);
        kill_all(&mut z, 0);
        let done = h.tick(&mut z, 1000, &[inside()]);
        assert!(done.completed);
    }
}
