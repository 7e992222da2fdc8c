//! Presentation hooks.
//!
//! Rendering, audio and UI live outside this crate. The engine reports what
//! happened through a [`Presenter`]; every hook defaults to doing nothing.

use glam::Vec3;
use tracing::{debug, info};

use crate::hits::HitId;
use crate::monster::{MonsterId, MonsterState};
use crate::player::PlayerId;
use crate::zone::ZoneId;

pub trait Presenter {
    fn monster_spawned(&self, _monster: MonsterId, _hit: HitId, _model: &str, _position: Vec3) {}

    fn monster_moved(&self, _monster: MonsterId, _position: Vec3, _yaw: f32, _state: MonsterState) {
    }

    fn monster_attacked(&self, _monster: MonsterId, _target: PlayerId) {}

    fn monster_died(&self, _monster: MonsterId) {}

    fn monster_despawned(&self, _monster: MonsterId) {}

    /// Zone markers are shown while a zone is waiting for the player
    fn zone_visibility(&self, _zone: ZoneId, _visible: bool) {}

    /// A new batch of quests is offered in the quest menu
    fn quest_batch_revealed(&self, _state_index: usize, _titles: &[String]) {}

    fn dialogue_text(&self, _character: &str, _text: &str) {}

    fn dialogue_closed(&self) {}

    fn player_damaged(&self, _player: PlayerId, _health: i32) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Writes presentation events to the log, used by the headless binary
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn monster_spawned(&self, monster: MonsterId, hit: HitId, model: &str, position: Vec3) {
        debug!(
            "Spawned {:?} ({}) as {:?} at ({:.1}, {:.1}, {:.1})",
            monster, model, hit, position.x, position.y, position.z
        );
    }

    fn monster_attacked(&self, monster: MonsterId, target: PlayerId) {
        debug!("{:?} attacks {:?}", monster, target);
    }

    fn monster_died(&self, monster: MonsterId) {
        debug!("{:?} died", monster);
    }

    fn zone_visibility(&self, zone: ZoneId, visible: bool) {
        debug!("{:?} marker visible: {}", zone, visible);
    }

    fn quest_batch_revealed(&self, state_index: usize, titles: &[String]) {
        info!("Quest batch {} offered: {:?}", state_index, titles);
    }

    fn dialogue_text(&self, character: &str, text: &str) {
        info!("{}: {}", character, text);
    }

    fn player_damaged(&self, player: PlayerId, health: i32) {
        debug!("{:?} health now {}", player, health);
    }
}
