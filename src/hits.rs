//! Hit-test dispatch.
//!
//! The presentation layer hit-tests against its own scene objects and hands
//! back a [`HitId`]. The registry turns that into a handle the world can use
//! to find the monster, whichever zone (or the world itself) owns it.

use serde::Serialize;
use std::collections::HashMap;

use crate::monster::MonsterId;
use crate::zone::ZoneId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HitId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MonsterOwner {
    Zone(ZoneId),
    /// Free-roaming monsters such as bosses
    World,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MonsterHandle {
    pub owner: MonsterOwner,
    pub monster: MonsterId,
}

#[derive(Debug, Default)]
pub struct HitRegistry {
    entries: HashMap<HitId, MonsterHandle>,
    next_hit: u64,
    next_monster: u64,
}

impl HitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh monster id. Ids are never reused within a registry.
    pub fn next_monster_id(&mut self) -> MonsterId {
        self.next_monster += 1;
        MonsterId(self.next_monster)
    }

    pub fn register(&mut self, handle: MonsterHandle) -> HitId {
        self.next_hit += 1;
        let hit = HitId(self.next_hit);
        self.entries.insert(hit, handle);
        hit
    }

    pub fn resolve(&self, hit: HitId) -> Option<MonsterHandle> {
        self.entries.get(&hit).copied()
    }

    pub fn remove(&mut self, hit: HitId) -> Option<MonsterHandle> {
        self.entries.remove(&hit)
    }

    /// Every registered hit belonging to the given owner
    pub fn hits_owned_by(&self, owner: MonsterOwner) -> Vec<HitId> {
        let mut hits: Vec<HitId> = self
            .entries
            .iter()
            .filter(|(_, handle)| handle.owner == owner)
            .map(|(hit, _)| *hit)
            .collect();
        hits.sort();
        hits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_resolve_remove() {
        let mut hits = HitRegistry::new();
        let monster = hits.next_monster_id();
        let handle = MonsterHandle {
            owner: MonsterOwner::Zone(ZoneId(3)),
            monster,
        };

        let hit = hits.register(handle);
        assert_eq!(hits.resolve(hit), Some(handle));
        assert_eq!(hits.hits_owned_by(MonsterOwner::Zone(ZoneId(3))), vec![hit]);
        assert!(hits.hits_owned_by(MonsterOwner::World).is_empty());

        assert_eq!(hits.remove(hit), Some(handle));
        assert_eq!(hits.resolve(hit), None);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_monster_ids_are_unique() {
        let mut hits = HitRegistry::new();
        let a = hits.next_monster_id();
        let b = hits.next_monster_id();
        assert_ne!(a, b);
    }
}
