//! The world: every zone, boss, quest and player of one level, plus the
//! dialogue gate, advanced one tick at a time by the driver.

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::boss::{Boss, BossId, BossView};
use crate::clock::Millis;
use crate::config::EngineConfig;
use crate::dialogue::{DialogueDefinition, DialogueGate, GateView, InputLock, LineStep};
use crate::entity::MonsterPrototype;
use crate::error::{LoadError, QuestError};
use crate::hits::{HitId, HitRegistry, MonsterOwner};
use crate::level::LevelData;
use crate::memory::{MemoryBook, MemoryDefinition};
use crate::monster::MonsterId;
use crate::observer::SubscriptionId;
use crate::player::{Player, PlayerId, PlayerSnapshot};
use crate::presenter::Presenter;
use crate::quest::{EncounterArena, QuestChange, QuestId, QuestLedger, QuestView};
use crate::zone::{EncounterZone, SpawnContext, ZoneId, ZoneView};

/// Zones and bosses, addressed by id
pub struct Encounters {
    zones: Vec<EncounterZone>,
    bosses: Vec<Boss>,
    presenter: Rc<dyn Presenter>,
}

impl EncounterArena for Encounters {
    fn activate_zone(&mut self, zone: ZoneId) {
        match self.zones.get_mut(zone.0) {
            Some(z) => z.activate(&*self.presenter),
            None => warn!("Cannot activate unknown {:?}", zone),
        }
    }

    fn activate_boss(&mut self, boss: BossId) {
        match self.bosses.get_mut(boss.0) {
            Some(b) => b.activate(&*self.presenter),
            None => warn!("Cannot activate unknown {:?}", boss),
        }
    }

    fn is_zone_completed(&self, zone: ZoneId) -> bool {
        self.zones.get(zone.0).is_some_and(EncounterZone::is_completed)
    }

    fn is_boss_alive(&self, boss: BossId) -> bool {
        self.bosses.get(boss.0).is_some_and(Boss::is_alive)
    }
}

/// What changed during one call to [`World::tick`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub zones_completed: Vec<ZoneId>,
    pub quests_completed: Vec<QuestId>,
    pub players_killed: Vec<PlayerId>,
    pub damage_taken: i32,
}

/// Result of a player's attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    Hit { monster: MonsterId, health: i32 },
    Killed { monster: MonsterId },
    OutOfRange,
    Cooldown,
    /// The hit id does not resolve to a living monster
    NoTarget,
}

pub struct World {
    session_id: Uuid,
    config: EngineConfig,
    arena: Encounters,
    players: BTreeMap<PlayerId, Player>,
    player_last_attack: HashMap<PlayerId, Millis>,
    memory_definitions: Vec<MemoryDefinition>,
    ledger: QuestLedger,
    gate: Rc<RefCell<DialogueGate>>,
    hits: HitRegistry,
    rng: StdRng,
    presenter: Rc<dyn Presenter>,
    input: InputLock,
}

impl World {
    pub fn from_level(level: LevelData, config: EngineConfig, presenter: Rc<dyn Presenter>) -> Self {
        let mut hits = HitRegistry::new();
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut zones = Vec::with_capacity(level.zones.len());
        let mut zone_names = HashMap::new();
        for def in &level.zones {
            let prototype = match &def.monster {
                Some(id) => match level.prototypes.get(id) {
                    Some(proto) => proto.clone(),
                    None => {
                        warn!(
                            "Zone '{}': {}, using default stats",
                            def.name,
                            LoadError::UnknownPrototype(id.clone())
                        );
                        MonsterPrototype::basic(id)
                    }
                },
                None => MonsterPrototype::basic("monster"),
            };
            let id = ZoneId(zones.len());
            zone_names.insert(def.name.clone(), id);
            zones.push(EncounterZone::new(
                id,
                &def.name,
                def.bounds,
                def.waves.clone(),
                prototype,
            ));
        }

        let mut bosses = Vec::with_capacity(level.bosses.len());
        let mut boss_names = HashMap::new();
        for def in &level.bosses {
            let Some(prototype) = level.prototypes.get(&def.monster) else {
                warn!(
                    "Skipping boss '{}': {}",
                    def.name,
                    LoadError::UnknownPrototype(def.monster.clone())
                );
                continue;
            };
            let id = BossId(bosses.len());
            boss_names.insert(def.name.clone(), id);
            bosses.push(Boss::new(
                id,
                &def.name,
                prototype.clone(),
                def.position,
                &mut hits,
            ));
        }

        let mut ledger = QuestLedger::from_definitions(&level.quests, &zone_names, &boss_names);

        let input = InputLock::new();
        let dialogue = level.dialogue.unwrap_or_else(|| DialogueDefinition {
            character: String::new(),
            states: Vec::new(),
        });
        let gate = Rc::new(RefCell::new(DialogueGate::new(
            dialogue,
            input.clone(),
            Rc::clone(&presenter),
            config.text_speed_ms,
            config.advance_debounce_ms,
        )));

        let observer = Rc::clone(&gate);
        ledger.subscribe_all(Rc::new(move |change: &QuestChange| {
            observer.borrow_mut().on_quest_state_change(change);
        }));

        let session_id = Uuid::new_v4();
        info!(
            "Session {} started: {} zones, {} bosses, {} quests",
            session_id,
            zones.len(),
            bosses.len(),
            ledger.len()
        );

        Self {
            session_id,
            config,
            arena: Encounters {
                zones,
                bosses,
                presenter: Rc::clone(&presenter),
            },
            players: BTreeMap::new(),
            player_last_attack: HashMap::new(),
            memory_definitions: level.memories,
            ledger,
            gate,
            hits,
            rng,
            presenter,
            input,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn zones(&self) -> &[EncounterZone] {
        &self.arena.zones
    }

    pub fn zone(&self, id: ZoneId) -> Option<&EncounterZone> {
        self.arena.zones.get(id.0)
    }

    pub fn zone_by_name(&self, name: &str) -> Option<&EncounterZone> {
        self.arena.zones.iter().find(|z| z.name() == name)
    }

    pub fn bosses(&self) -> &[Boss] {
        &self.arena.bosses
    }

    pub fn boss(&self, id: BossId) -> Option<&Boss> {
        self.arena.bosses.get(id.0)
    }

    pub fn ledger(&self) -> &QuestLedger {
        &self.ledger
    }

    pub fn gate(&self) -> Ref<'_, DialogueGate> {
        self.gate.borrow()
    }

    pub fn hits(&self) -> &HitRegistry {
        &self.hits
    }

    pub fn input_lock(&self) -> &InputLock {
        &self.input
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    // ========================================================================
    // Players
    // ========================================================================

    /// Add a player built from the configured player stats
    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let id = PlayerId(self.players.keys().next_back().map_or(1, |last| last.0 + 1));
        let cfg = &self.config.player;
        let player = Player::new(
            id,
            name,
            Vec3::from_array(cfg.spawn),
            cfg.max_health,
            cfg.damage,
            MemoryBook::new(&self.memory_definitions),
        );
        info!("Player {} joined as {:?}", name, id);
        self.players.insert(id, player);
        id
    }

    /// Place a player. Ignored while the input lock is held or the player
    /// is dead.
    pub fn move_player(&mut self, id: PlayerId, position: Vec3) -> bool {
        if self.input.is_locked() {
            return false;
        }
        match self.players.get_mut(&id) {
            Some(player) if player.is_alive() => {
                player.position = position;
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the world. Zones first, then bosses, then monster attacks are
    /// applied, then quests linked to freshly completed zones are checked.
    pub fn tick(&mut self, now: Millis) -> TickReport {
        let mut report = TickReport::default();
        let snapshots: Vec<PlayerSnapshot> = self.players.values().map(Player::snapshot).collect();
        let mut attacks = Vec::new();

        {
            let mut ctx = SpawnContext {
                rng: &mut self.rng,
                hits: &mut self.hits,
                presenter: &*self.presenter,
                config: &self.config,
            };
            for zone in &mut self.arena.zones {
                let result = zone.tick(now, &snapshots, &mut ctx);
                attacks.extend(result.attacks);
                if result.completed {
                    report.zones_completed.push(zone.id());
                }
            }
        }

        for boss in &mut self.arena.bosses {
            if let Some(attack) = boss.tick(now, &snapshots, &mut self.hits, &*self.presenter) {
                attacks.push(attack);
            }
        }

        for attack in attacks {
            let Some(player) = self.players.get_mut(&attack.target) else {
                continue;
            };
            if !player.is_alive() {
                continue;
            }
            let died = player.take_damage(attack.damage);
            report.damage_taken += attack.damage;
            self.presenter.player_damaged(player.id, player.health);
            if died {
                report.players_killed.push(player.id);
            }
        }

        for zone in &report.zones_completed {
            let done = self.ledger.notify_zone_progress(*zone, &self.arena);
            report.quests_completed.extend(done);
        }

        report
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// Living monster closest to the player among active zones and bosses.
    /// Stands in for the presentation layer's hit test.
    pub fn nearest_monster_hit(&self, player: PlayerId) -> Option<(HitId, f32)> {
        let origin = self.players.get(&player)?.position;

        let zone_monsters = self
            .arena
            .zones
            .iter()
            .filter(|z| z.is_active())
            .flat_map(|z| z.monsters().iter());
        let boss_monsters = self
            .arena
            .bosses
            .iter()
            .filter(|b| b.is_active())
            .map(Boss::agent);

        zone_monsters
            .chain(boss_monsters)
            .filter(|m| m.is_alive())
            .map(|m| (m.hit, m.position.distance(origin)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// A player attacks whatever the hit id points at
    pub fn player_attack(&mut self, player_id: PlayerId, hit: HitId, now: Millis) -> AttackOutcome {
        let Some(player) = self.players.get(&player_id) else {
            warn!("Attack failed: {:?} not found", player_id);
            return AttackOutcome::NoTarget;
        };
        if !player.is_alive() {
            return AttackOutcome::NoTarget;
        }
        let (origin, damage) = (player.position, player.damage);

        if let Some(last) = self.player_last_attack.get(&player_id) {
            if now.saturating_sub(*last) < self.config.player.attack_cooldown_ms {
                return AttackOutcome::Cooldown;
            }
        }

        let Some(handle) = self.hits.resolve(hit) else {
            debug!("{:?} does not resolve to a monster", hit);
            return AttackOutcome::NoTarget;
        };

        let boss_id = match handle.owner {
            MonsterOwner::World => {
                let Some(boss) = self
                    .arena
                    .bosses
                    .iter()
                    .find(|b| b.agent().id == handle.monster)
                else {
                    return AttackOutcome::NoTarget;
                };
                // Dormant bosses can't be hit until a quest wakes them
                if !boss.is_active() {
                    debug!("Boss '{}' is dormant, ignoring attack", boss.name());
                    return AttackOutcome::NoTarget;
                }
                Some(boss.id())
            }
            MonsterOwner::Zone(_) => None,
        };

        let monster = match handle.owner {
            MonsterOwner::Zone(zone) => self
                .arena
                .zones
                .get_mut(zone.0)
                .and_then(|z| z.monster_mut(handle.monster)),
            MonsterOwner::World => boss_id
                .and_then(|id| self.arena.bosses.get_mut(id.0))
                .map(Boss::agent_mut),
        };
        let Some(monster) = monster else {
            return AttackOutcome::NoTarget;
        };
        if !monster.is_alive() {
            return AttackOutcome::NoTarget;
        }
        if monster.position.distance(origin) > self.config.player.attack_range {
            return AttackOutcome::OutOfRange;
        }

        self.player_last_attack.insert(player_id, now);
        let killed = monster.take_damage(damage, now);
        let (monster_id, health) = (monster.id, monster.health);

        if !killed {
            return AttackOutcome::Hit {
                monster: monster_id,
                health,
            };
        }

        self.presenter.monster_died(monster_id);
        if let Some(boss) = boss_id {
            info!("Boss {:?} defeated", boss);
            self.ledger.notify_boss_defeated(boss, &self.arena);
        }
        AttackOutcome::Killed {
            monster: monster_id,
        }
    }

    // ========================================================================
    // Quests
    // ========================================================================

    /// Accept a quest offered by the dialogue gate
    pub fn accept_quest(&mut self, title: &str) -> Result<QuestId, QuestError> {
        // The gate borrow must end before the ledger notifies it
        let offered = self.gate.borrow().is_offered(title);
        if !offered {
            warn!("Quest '{}' is not offered", title);
            return Err(QuestError::NotOffered(title.to_string()));
        }

        self.ledger
            .accept_quest(title, &mut self.arena)
            .inspect_err(|e| warn!("Accept rejected: {}", e))
    }

    pub fn claim_reward(&mut self, player_id: PlayerId, title: &str) -> Result<(), QuestError> {
        let Some(player) = self.players.get_mut(&player_id) else {
            warn!("Claim failed: {:?} not found", player_id);
            return Err(QuestError::UnknownPlayer(player_id.0));
        };
        self.ledger.claim_reward(title, player)
    }

    pub fn subscribe_quest<F>(&mut self, title: &str, callback: F) -> Result<SubscriptionId, QuestError>
    where
        F: FnMut(&QuestChange) + 'static,
    {
        self.ledger.subscribe(title, callback)
    }

    // ========================================================================
    // Dialogue
    // ========================================================================

    pub fn start_dialogue(&mut self, now: Millis) -> bool {
        self.gate.borrow_mut().start_dialogue(now)
    }

    pub fn next_line(&mut self, now: Millis) -> LineStep {
        self.gate.borrow_mut().next_line(now)
    }

    pub fn dialogue_text(&self, now: Millis) -> Option<String> {
        self.gate.borrow().visible_text(now)
    }

    /// The gate sits on its last state and every quest that state asks for
    /// has been paid out
    pub fn narrative_finished(&self) -> bool {
        let gate = self.gate.borrow();
        if gate.state_count() == 0 || !gate.is_final_state() {
            return false;
        }
        gate.required_titles().iter().all(|title| {
            self.ledger
                .by_title(title)
                .is_some_and(|q| q.is_reward_claimed())
        })
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Throw away all progress, as after the player dies
    pub fn reset_session(&mut self) {
        let previous = self.session_id;
        self.session_id = Uuid::new_v4();

        self.ledger.reset_all();
        self.gate.borrow_mut().reset();
        for zone in &mut self.arena.zones {
            zone.reset_session(&mut self.hits, &*self.presenter);
        }
        for boss in &mut self.arena.bosses {
            boss.reset_session(&mut self.hits, &*self.presenter);
        }
        for player in self.players.values_mut() {
            player.reset();
        }
        self.player_last_attack.clear();

        info!("Session {} reset, new session {}", previous, self.session_id);
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            session_id: self.session_id.to_string(),
            zones: self.arena.zones.iter().map(EncounterZone::view).collect(),
            bosses: self.arena.bosses.iter().map(Boss::view).collect(),
            quests: self.ledger.views(),
            dialogue: self.gate.borrow().view(),
            players: self.players.values().map(PlayerView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub position: [f32; 3],
    pub health: i32,
    pub damage: i32,
    pub pieces_unlocked: usize,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            position: player.position.to_array(),
            health: player.health,
            damage: player.damage,
            pieces_unlocked: player.memories.unlocked_total(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub session_id: String,
    pub zones: Vec<ZoneView>,
    pub bosses: Vec<BossView>,
    pub quests: Vec<QuestView>,
    pub dialogue: GateView,
    pub players: Vec<PlayerView>,
}
