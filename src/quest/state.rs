//! Quest State Tracking
//!
//! A quest is accepted from the quest menu, completes once its linked zones
//! are cleared and its boss (if any) is dead, and pays out its reward once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::events::{QuestChange, QuestChangeKind};
use crate::boss::BossId;
use crate::error::QuestError;
use crate::memory::MemoryPiece;
use crate::observer::{Observable, SubscriptionId};
use crate::player::Player;
use crate::zone::ZoneId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QuestId(pub usize);

/// The zones and bosses a quest refers to, looked up by id
pub trait EncounterArena {
    fn activate_zone(&mut self, zone: ZoneId);
    fn activate_boss(&mut self, boss: BossId);
    fn is_zone_completed(&self, zone: ZoneId) -> bool;
    fn is_boss_alive(&self, boss: BossId) -> bool;
}

#[derive(Debug)]
pub struct Quest {
    id: QuestId,
    title: String,
    description: String,
    reward: MemoryPiece,
    zones: Vec<ZoneId>,
    boss: Option<BossId>,
    accepted: bool,
    completed: bool,
    reward_claimed: bool,
    accepted_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    on_state_change: Observable<QuestChange>,
}

impl Quest {
    pub fn new(
        id: QuestId,
        title: &str,
        description: &str,
        reward: MemoryPiece,
        zones: Vec<ZoneId>,
        boss: Option<BossId>,
    ) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            reward,
            zones,
            boss,
            accepted: false,
            completed: false,
            reward_claimed: false,
            accepted_at: None,
            completed_at: None,
            on_state_change: Observable::new(),
        }
    }

    pub fn id(&self) -> QuestId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reward(&self) -> &MemoryPiece {
        &self.reward
    }

    pub fn zones(&self) -> &[ZoneId] {
        &self.zones
    }

    pub fn boss(&self) -> Option<BossId> {
        self.boss
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_reward_claimed(&self) -> bool {
        self.reward_claimed
    }

    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&QuestChange) + 'static,
    {
        self.on_state_change.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.on_state_change.unsubscribe(id)
    }

    fn emit(&mut self, kind: QuestChangeKind) {
        let change = QuestChange {
            quest: self.id,
            title: self.title.clone(),
            kind,
            accepted: self.accepted,
            completed: self.completed,
            reward_claimed: self.reward_claimed,
        };
        self.on_state_change.notify(&change);
    }

    /// Accept the quest and wake up every zone and boss it needs
    pub fn accept(&mut self, arena: &mut dyn EncounterArena) -> Result<(), QuestError> {
        if self.accepted {
            return Err(QuestError::AlreadyAccepted(self.title.clone()));
        }

        self.accepted = true;
        self.accepted_at = Some(Utc::now());
        info!("Quest accepted: {}", self.title);
        self.emit(QuestChangeKind::Accepted);

        for zone in &self.zones {
            arena.activate_zone(*zone);
        }
        if let Some(boss) = self.boss {
            arena.activate_boss(boss);
        }

        Ok(())
    }

    /// Recompute completion. Returns true only on the tick the quest
    /// becomes completed.
    pub fn notify_progress(&mut self, arena: &dyn EncounterArena) -> bool {
        if self.completed {
            return false;
        }

        let zones_done = self.zones.iter().all(|z| arena.is_zone_completed(*z));
        let boss_done = self.boss.is_none_or(|b| !arena.is_boss_alive(b));
        if !(zones_done && boss_done) {
            return false;
        }

        self.completed = true;
        self.completed_at = Some(Utc::now());
        info!("Quest completed: {}", self.title);
        self.emit(QuestChangeKind::Completed);
        true
    }

    /// Pay out the reward. Rejected without side effects if the quest is
    /// not complete, was already claimed, or the piece does not fit.
    pub fn claim_reward(&mut self, player: &mut Player) -> Result<(), QuestError> {
        if self.reward_claimed {
            warn!("Reward for '{}' already claimed", self.title);
            return Err(QuestError::RewardAlreadyClaimed(self.title.clone()));
        }
        if !self.completed {
            warn!("Cannot claim reward for incomplete quest '{}'", self.title);
            return Err(QuestError::NotCompleted(self.title.clone()));
        }

        if let Err(e) = player.claim_reward(&self.reward) {
            warn!("Reward for '{}' rejected: {}", self.title, e);
            return Err(e.into());
        }

        self.reward_claimed = true;
        self.emit(QuestChangeKind::RewardClaimed);
        Ok(())
    }

    /// Forget all progress. Subscribers are kept and not notified.
    pub fn reset(&mut self) {
        self.accepted = false;
        self.completed = false;
        self.reward_claimed = false;
        self.accepted_at = None;
        self.completed_at = None;
    }

    pub fn view(&self) -> QuestView {
        QuestView {
            id: self.id,
            title: self.title.clone(),
            accepted: self.accepted,
            completed: self.completed,
            reward_claimed: self.reward_claimed,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestView {
    pub id: QuestId,
    pub title: String,
    pub accepted: bool,
    pub completed: bool,
    pub reward_claimed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::memory::{MemoryBook, MemoryDefinition};
    use glam::Vec3;
    use std::cell::RefCell;
    use std::collections::{BTreeSet, HashSet};
    use std::rc::Rc;

    /// Arena stand-in that records activations
    #[derive(Default)]
    pub(crate) struct FakeArena {
        pub active_zones: BTreeSet<ZoneId>,
        pub completed_zones: HashSet<ZoneId>,
        pub active_bosses: BTreeSet<BossId>,
        pub dead_bosses: HashSet<BossId>,
    }

    impl EncounterArena for FakeArena {
        fn activate_zone(&mut self, zone: ZoneId) {
            self.active_zones.insert(zone);
        }
        fn activate_boss(&mut self, boss: BossId) {
            self.active_bosses.insert(boss);
        }
        fn is_zone_completed(&self, zone: ZoneId) -> bool {
            self.completed_zones.contains(&zone)
        }
        fn is_boss_alive(&self, boss: BossId) -> bool {
            !self.dead_bosses.contains(&boss)
        }
    }

    pub(crate) fn test_player() -> Player {
        let book = MemoryBook::new(&[MemoryDefinition {
            name: "memo1".to_string(),
            puzzle: "Puzzle1".to_string(),
            pieces: 25,
        }]);
        Player::new(crate::player::PlayerId(1), "Dreamer", Vec3::ZERO, 100, 25, book)
    }

    fn quest(zones: &[usize], boss: Option<usize>) -> Quest {
        Quest::new(
            QuestId(0),
            "Q1",
            "",
            MemoryPiece::new("piece1", "memo1", ""),
            zones.iter().map(|z| ZoneId(*z)).collect(),
            boss.map(BossId),
        )
    }

    #[test]
    fn test_accept_activates_links() {
        let mut arena = FakeArena::default();
        let mut q = quest(&[1, 2], Some(0));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        q.subscribe(move |c: &QuestChange| sink.borrow_mut().push(c.kind));

        q.accept(&mut arena).unwrap();
        assert!(q.is_accepted());
        assert!(q.accepted_at().is_some());
        assert_eq!(arena.active_zones.len(), 2);
        assert!(arena.active_bosses.contains(&BossId(0)));
        assert_eq!(*events.borrow(), vec![QuestChangeKind::Accepted]);

        assert_eq!(
            q.accept(&mut arena),
            Err(QuestError::AlreadyAccepted("Q1".to_string()))
        );
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_completion_needs_all_zones_and_dead_boss() {
        let mut arena = FakeArena::default();
        let mut q = quest(&[1, 2], Some(0));
        q.accept(&mut arena).unwrap();

        arena.completed_zones.insert(ZoneId(1));
        assert!(!q.notify_progress(&arena));
        arena.completed_zones.insert(ZoneId(2));
        assert!(!q.notify_progress(&arena));
        arena.dead_bosses.insert(BossId(0));
        assert!(q.notify_progress(&arena));
        assert!(q.is_completed());

        // Edge only
        assert!(!q.notify_progress(&arena));
        assert!(q.is_completed());
    }

    #[test]
    fn test_claim_reward_once() {
        let mut arena = FakeArena::default();
        let mut player = test_player();
        let mut q = quest(&[1], None);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        q.subscribe(move |c: &QuestChange| sink.borrow_mut().push(c.kind));

        q.accept(&mut arena).unwrap();
        assert_eq!(
            q.claim_reward(&mut player),
            Err(QuestError::NotCompleted("Q1".to_string()))
        );

        arena.completed_zones.insert(ZoneId(1));
        q.notify_progress(&arena);
        q.claim_reward(&mut player).unwrap();
        assert!(q.is_reward_claimed());
        assert_eq!(player.damage, 26);

        assert_eq!(
            q.claim_reward(&mut player),
            Err(QuestError::RewardAlreadyClaimed("Q1".to_string()))
        );
        assert_eq!(player.damage, 26);
        assert_eq!(
            *events.borrow(),
            vec![
                QuestChangeKind::Accepted,
                QuestChangeKind::Completed,
                QuestChangeKind::RewardClaimed
            ]
        );
    }

    #[test]
    fn test_mismatched_reward_leaves_quest_unclaimed() {
        let mut arena = FakeArena::default();
        let mut player = test_player();
        let mut q = Quest::new(
            QuestId(3),
            "Odd Reward",
            "",
            MemoryPiece::new("piece1", "memo7", ""),
            vec![ZoneId(0)],
            None,
        );
        q.accept(&mut arena).unwrap();
        arena.completed_zones.insert(ZoneId(0));
        q.notify_progress(&arena);

        let err = q.claim_reward(&mut player).unwrap_err();
        assert!(matches!(err, QuestError::Reward(_)));
        assert!(!q.is_reward_claimed());
        assert_eq!(player.damage, 25);
    }

    #[test]
    fn test_reset_keeps_subscribers() {
        let mut arena = FakeArena::default();
        let mut q = quest(&[1], None);
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        q.subscribe(move |_: &QuestChange| *sink.borrow_mut() += 1);

        q.accept(&mut arena).unwrap();
        q.reset();
        assert!(!q.is_accepted());
        assert_eq!(*count.borrow(), 1);

        q.accept(&mut arena).unwrap();
        assert_eq!(*count.borrow(), 2);
    }
}
