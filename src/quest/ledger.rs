//! Quest Ledger
//!
//! Owns every quest of the level and routes zone and boss progress to the
//! quests that depend on them.

use std::collections::HashMap;
use std::rc::Rc;
use tracing::{info, warn};

use super::definition::QuestDefinition;
use super::events::QuestChange;
use super::state::{EncounterArena, Quest, QuestId, QuestView};
use crate::boss::BossId;
use crate::error::{LoadError, QuestError};
use crate::memory::MemoryPiece;
use crate::observer::SubscriptionId;
use crate::player::Player;
use crate::zone::ZoneId;

#[derive(Debug, Default)]
pub struct QuestLedger {
    quests: Vec<Quest>,
    by_title: HashMap<String, QuestId>,
    zone_links: HashMap<ZoneId, Vec<QuestId>>,
    boss_links: HashMap<BossId, Vec<QuestId>>,
}

impl QuestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the ledger, resolving zone and boss names. Quests that point at
    /// something that does not exist are skipped.
    pub fn from_definitions(
        definitions: &[QuestDefinition],
        zones: &HashMap<String, ZoneId>,
        bosses: &HashMap<String, BossId>,
    ) -> Self {
        let mut ledger = Self::new();
        for def in definitions {
            if let Err(e) = ledger.add_definition(def, zones, bosses) {
                warn!("Skipping quest '{}': {}", def.title, e);
            }
        }
        info!("Quest ledger holds {} quests", ledger.len());
        ledger
    }

    fn add_definition(
        &mut self,
        def: &QuestDefinition,
        zones: &HashMap<String, ZoneId>,
        bosses: &HashMap<String, BossId>,
    ) -> Result<QuestId, LoadError> {
        let zone_ids = def
            .zones
            .iter()
            .map(|name| {
                zones.get(name).copied().ok_or_else(|| LoadError::UnknownZone {
                    quest: def.title.clone(),
                    zone: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let boss_id = match &def.boss {
            Some(name) => Some(bosses.get(name).copied().ok_or_else(|| {
                LoadError::UnknownBoss {
                    quest: def.title.clone(),
                    boss: name.clone(),
                }
            })?),
            None => None,
        };

        Ok(self.add_quest(
            &def.title,
            &def.description,
            def.reward.clone(),
            zone_ids,
            boss_id,
        ))
    }

    pub fn add_quest(
        &mut self,
        title: &str,
        description: &str,
        reward: MemoryPiece,
        zones: Vec<ZoneId>,
        boss: Option<BossId>,
    ) -> QuestId {
        let id = QuestId(self.quests.len());
        for zone in &zones {
            self.zone_links.entry(*zone).or_default().push(id);
        }
        if let Some(boss) = boss {
            self.boss_links.entry(boss).or_default().push(id);
        }
        if self.by_title.insert(title.to_string(), id).is_some() {
            warn!("Duplicate quest title '{}', the later one wins lookups", title);
        }
        self.quests
            .push(Quest::new(id, title, description, reward, zones, boss));
        id
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn find(&self, title: &str) -> Option<QuestId> {
        self.by_title.get(title).copied()
    }

    pub fn get(&self, id: QuestId) -> Option<&Quest> {
        self.quests.get(id.0)
    }

    pub fn by_title(&self, title: &str) -> Option<&Quest> {
        self.find(title).and_then(|id| self.get(id))
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    fn quest_mut(&mut self, title: &str) -> Result<&mut Quest, QuestError> {
        let id = self
            .find(title)
            .ok_or_else(|| QuestError::NotFound(title.to_string()))?;
        self.quests
            .get_mut(id.0)
            .ok_or_else(|| QuestError::NotFound(title.to_string()))
    }

    pub fn accept_quest(
        &mut self,
        title: &str,
        arena: &mut dyn EncounterArena,
    ) -> Result<QuestId, QuestError> {
        let quest = self.quest_mut(title)?;
        quest.accept(arena)?;
        Ok(quest.id())
    }

    /// Re-evaluate every quest linked to a zone. Returns the quests that
    /// completed because of it.
    pub fn notify_zone_progress(
        &mut self,
        zone: ZoneId,
        arena: &dyn EncounterArena,
    ) -> Vec<QuestId> {
        let linked = self.zone_links.get(&zone).cloned().unwrap_or_default();
        self.notify_linked(&linked, arena)
    }

    pub fn notify_boss_defeated(
        &mut self,
        boss: BossId,
        arena: &dyn EncounterArena,
    ) -> Vec<QuestId> {
        let linked = self.boss_links.get(&boss).cloned().unwrap_or_default();
        self.notify_linked(&linked, arena)
    }

    fn notify_linked(&mut self, linked: &[QuestId], arena: &dyn EncounterArena) -> Vec<QuestId> {
        linked
            .iter()
            .filter(|id| {
                self.quests
                    .get_mut(id.0)
                    .is_some_and(|q| q.notify_progress(arena))
            })
            .copied()
            .collect()
    }

    pub fn claim_reward(&mut self, title: &str, player: &mut Player) -> Result<(), QuestError> {
        self.quest_mut(title)?.claim_reward(player)
    }

    pub fn subscribe<F>(&mut self, title: &str, callback: F) -> Result<SubscriptionId, QuestError>
    where
        F: FnMut(&QuestChange) + 'static,
    {
        Ok(self.quest_mut(title)?.subscribe(callback))
    }

    /// Subscribe one callback to every quest's state changes
    pub fn subscribe_all(&mut self, callback: Rc<dyn Fn(&QuestChange)>) -> Vec<SubscriptionId> {
        self.quests
            .iter_mut()
            .map(|quest| {
                let callback = Rc::clone(&callback);
                quest.subscribe(move |change| callback(change))
            })
            .collect()
    }

    /// Clear every quest's flags for a new session
    pub fn reset_all(&mut self) {
        for quest in &mut self.quests {
            quest.reset();
        }
    }

    pub fn views(&self) -> Vec<QuestView> {
        self.quests.iter().map(Quest::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::state::tests::{FakeArena, test_player};
    use std::cell::RefCell;

    fn def(title: &str, zones: &[&str], boss: Option<&str>, piece: &str) -> QuestDefinition {
        QuestDefinition {
            title: title.to_string(),
            description: String::new(),
            zones: zones.iter().map(|z| z.to_string()).collect(),
            boss: boss.map(str::to_string),
            reward: MemoryPiece::new(piece, "memo1", ""),
        }
    }

    fn names() -> (HashMap<String, ZoneId>, HashMap<String, BossId>) {
        let zones = [("meadow", 0), ("cave", 1)]
            .iter()
            .map(|(n, i)| (n.to_string(), ZoneId(*i)))
            .collect();
        let bosses = [("Goblin King".to_string(), BossId(0))].into_iter().collect();
        (zones, bosses)
    }

    #[test]
    fn test_skips_quests_with_missing_links() {
        let (zones, bosses) = names();
        let ledger = QuestLedger::from_definitions(
            &[
                def("Q1", &["meadow"], None, "piece1"),
                def("Lost", &["nowhere"], None, "piece2"),
                def("Ghost", &[], Some("Nobody"), "piece3"),
                def("Q2", &["cave"], Some("Goblin King"), "piece4"),
            ],
            &zones,
            &bosses,
        );

        assert_eq!(ledger.len(), 2);
        assert!(ledger.find("Lost").is_none());
        assert!(ledger.find("Ghost").is_none());
        assert_eq!(ledger.by_title("Q2").unwrap().boss(), Some(BossId(0)));
    }

    #[test]
    fn test_zone_progress_completes_linked_quest() {
        let (zones, bosses) = names();
        let mut ledger = QuestLedger::from_definitions(
            &[def("Q1", &["meadow"], None, "piece1")],
            &zones,
            &bosses,
        );
        let mut arena = FakeArena::default();
        let mut player = test_player();

        ledger.accept_quest("Q1", &mut arena).unwrap();
        assert!(arena.active_zones.contains(&ZoneId(0)));

        assert!(ledger.notify_zone_progress(ZoneId(0), &arena).is_empty());
        arena.completed_zones.insert(ZoneId(0));
        let done = ledger.notify_zone_progress(ZoneId(0), &arena);
        assert_eq!(done, vec![QuestId(0)]);
        assert!(ledger.notify_zone_progress(ZoneId(0), &arena).is_empty());

        ledger.claim_reward("Q1", &mut player).unwrap();
        assert!(ledger.by_title("Q1").unwrap().is_reward_claimed());
        assert!(ledger.claim_reward("Q1", &mut player).is_err());
        assert_eq!(player.memories.unlocked_total(), 1);
    }

    #[test]
    fn test_boss_defeat_completes_quest() {
        let (zones, bosses) = names();
        let mut ledger = QuestLedger::from_definitions(
            &[def("Q2", &["cave"], Some("Goblin King"), "piece4")],
            &zones,
            &bosses,
        );
        let mut arena = FakeArena::default();
        ledger.accept_quest("Q2", &mut arena).unwrap();

        arena.completed_zones.insert(ZoneId(1));
        assert!(ledger.notify_zone_progress(ZoneId(1), &arena).is_empty());

        arena.dead_bosses.insert(BossId(0));
        assert_eq!(ledger.notify_boss_defeated(BossId(0), &arena), vec![QuestId(0)]);
    }

    #[test]
    fn test_unknown_quest() {
        let mut ledger = QuestLedger::new();
        let mut arena = FakeArena::default();
        assert_eq!(
            ledger.accept_quest("Nope", &mut arena),
            Err(QuestError::NotFound("Nope".to_string()))
        );
    }

    #[test]
    fn test_subscribe_all_and_reset() {
        let (zones, bosses) = names();
        let mut ledger = QuestLedger::from_definitions(
            &[
                def("Q1", &["meadow"], None, "piece1"),
                def("Q3", &["cave"], None, "piece2"),
            ],
            &zones,
            &bosses,
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let subs = ledger.subscribe_all(Rc::new(move |c: &QuestChange| {
            sink.borrow_mut().push(c.title.clone())
        }));
        assert_eq!(subs.len(), 2);

        let mut arena = FakeArena::default();
        ledger.accept_quest("Q3", &mut arena).unwrap();
        ledger.accept_quest("Q1", &mut arena).unwrap();
        assert_eq!(*seen.borrow(), vec!["Q3".to_string(), "Q1".to_string()]);

        ledger.reset_all();
        assert!(ledger.quests().iter().all(|q| !q.is_accepted()));
        assert_eq!(seen.borrow().len(), 2);
    }
}
