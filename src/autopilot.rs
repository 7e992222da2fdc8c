//! Scripted player for headless runs.
//!
//! Plays the level the way a person would: talk to the quest giver, take
//! every offered quest, walk into the zones, shoot the closest monster,
//! cash in rewards and come back for more.

use glam::Vec3;
use tracing::{debug, info};

use crate::clock::Millis;
use crate::dialogue::LineStep;
use crate::player::PlayerId;
use crate::world::{AttackOutcome, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutopilotStatus {
    Running,
    Finished,
}

#[derive(Debug)]
pub struct Autopilot {
    player: PlayerId,
    /// Dialogue state last talked through
    last_talked: Option<usize>,
    kills: u32,
}

enum Objective {
    Zone(Vec3),
    Boss(Vec3),
}

impl Autopilot {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            last_talked: None,
            kills: 0,
        }
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    /// Forget dialogue progress after the world resets
    pub fn on_session_reset(&mut self) {
        self.last_talked = None;
    }

    /// Take one action. Call after `World::tick`.
    pub fn step(&mut self, world: &mut World, now: Millis) -> AutopilotStatus {
        if world.gate().state_count() == 0 {
            return AutopilotStatus::Finished;
        }

        if world.gate().is_talking() {
            if let LineStep::Line(line) = world.next_line(now) {
                debug!("Autopilot reads: {}", line);
            }
            return AutopilotStatus::Running;
        }

        self.claim_rewards(world);

        let index = world.gate().current_index();
        if self.last_talked != Some(index) {
            if world.start_dialogue(now) {
                info!("Autopilot talks to {} (state {})", world.gate().character(), index);
                self.last_talked = Some(index);
            }
            return AutopilotStatus::Running;
        }

        // Heard the closing lines and collected everything
        if world.narrative_finished() {
            return AutopilotStatus::Finished;
        }

        self.accept_offered(world);

        if let Some((hit, distance)) = world.nearest_monster_hit(self.player) {
            if distance <= world.config().player.attack_range {
                if let AttackOutcome::Killed { monster } = world.player_attack(self.player, hit, now) {
                    self.kills += 1;
                    debug!("Autopilot killed {:?}", monster);
                }
                return AutopilotStatus::Running;
            }
        }

        match self.objective(world) {
            Some(Objective::Zone(center)) => self.walk_toward(world, center),
            Some(Objective::Boss(position)) => self.walk_toward(world, position),
            None => {}
        }

        AutopilotStatus::Running
    }

    fn claim_rewards(&self, world: &mut World) {
        let ready: Vec<String> = world
            .ledger()
            .quests()
            .iter()
            .filter(|q| q.is_completed() && !q.is_reward_claimed())
            .map(|q| q.title().to_string())
            .collect();
        for title in ready {
            if world.claim_reward(self.player, &title).is_ok() {
                info!("Autopilot claimed reward for '{}'", title);
            }
        }
    }

    fn accept_offered(&self, world: &mut World) {
        let offered: Vec<String> = world
            .gate()
            .offered_titles()
            .into_iter()
            .filter(|title| {
                world
                    .ledger()
                    .by_title(title)
                    .is_some_and(|q| !q.is_accepted())
            })
            .collect();
        for title in offered {
            if world.accept_quest(&title).is_ok() {
                info!("Autopilot accepted '{}'", title);
            }
        }
    }

    /// Next place to go: the first unfinished zone of an open quest, then
    /// its boss
    fn objective(&self, world: &World) -> Option<Objective> {
        for quest in world.ledger().quests() {
            if !quest.is_accepted() || quest.is_completed() {
                continue;
            }
            let zone = quest
                .zones()
                .iter()
                .filter_map(|id| world.zone(*id))
                .find(|z| !z.is_completed());
            if let Some(zone) = zone {
                return Some(Objective::Zone(zone.bounds().center()));
            }
            if let Some(boss) = quest.boss().and_then(|id| world.boss(id)) {
                if boss.is_alive() {
                    return Some(Objective::Boss(boss.position()));
                }
            }
        }
        None
    }

    fn walk_toward(&self, world: &mut World, target: Vec3) {
        let Some(player) = world.player(self.player) else {
            return;
        };
        let from = player.position;
        let mut delta = target - from;
        delta.y = 0.0;
        let distance = delta.length();
        if distance < 1e-3 {
            return;
        }
        let step = world.config().player.walk_step.min(distance);
        world.move_player(self.player, from + delta / distance * step);
    }
}
