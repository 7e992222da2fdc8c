use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use super::prototype::{MonsterPrototype, MonsterStats, RawMonsterPrototype};
use crate::error::LoadError;

/// Registry for all monster prototypes
pub struct PrototypeRegistry {
    prototypes: HashMap<String, MonsterPrototype>,
}

impl PrototypeRegistry {
    pub fn new() -> Self {
        Self {
            prototypes: HashMap::new(),
        }
    }

    /// Load all monster definitions from `<data_dir>/entities`
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), LoadError> {
        let entities_dir = data_dir.join("entities");

        // First pass: load all raw prototypes
        let mut raw_prototypes: HashMap<String, RawMonsterPrototype> = HashMap::new();
        if entities_dir.exists() {
            self.load_toml_files(&entities_dir, &mut raw_prototypes)?;
        } else {
            warn!("Entity directory does not exist: {:?}", entities_dir);
        }

        info!("Loaded {} raw monster prototypes", raw_prototypes.len());

        // Second pass: resolve inheritance
        self.resolve_all_prototypes(raw_prototypes)?;

        info!("Resolved {} monster prototypes", self.prototypes.len());

        Ok(())
    }

    fn load_toml_files(
        &self,
        dir: &Path,
        raw_prototypes: &mut HashMap<String, RawMonsterPrototype>,
    ) -> Result<(), LoadError> {
        let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "toml") {
                continue;
            }

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read {:?}: {}", path, e);
                    continue;
                }
            };

            // Parse as table of prototypes keyed by id
            let table: HashMap<String, RawMonsterPrototype> = match toml::from_str(&content) {
                Ok(table) => table,
                Err(e) => {
                    warn!("Failed to parse {:?}: {}", path, e);
                    continue;
                }
            };

            for (id, proto) in table {
                if raw_prototypes.contains_key(&id) {
                    warn!("Duplicate monster ID '{}' in {:?}, overwriting", id, path);
                }
                raw_prototypes.insert(id, proto);
            }
        }

        Ok(())
    }

    /// Resolve raw prototypes parents-first and add them to the registry
    pub fn resolve_all_prototypes(
        &mut self,
        raw_prototypes: HashMap<String, RawMonsterPrototype>,
    ) -> Result<(), LoadError> {
        let sorted_ids = Self::topological_sort(&raw_prototypes)?;

        for id in sorted_ids {
            if let Some(raw) = raw_prototypes.get(&id) {
                let resolved = self.resolve_prototype(&id, raw);
                self.prototypes.insert(id, resolved);
            }
        }

        Ok(())
    }

    fn topological_sort(
        raw_prototypes: &HashMap<String, RawMonsterPrototype>,
    ) -> Result<Vec<String>, LoadError> {
        let mut sorted = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();

        fn visit(
            id: &str,
            raw_prototypes: &HashMap<String, RawMonsterPrototype>,
            sorted: &mut Vec<String>,
            visited: &mut HashSet<String>,
            visiting: &mut HashSet<String>,
        ) -> Result<(), LoadError> {
            if visited.contains(id) {
                return Ok(());
            }
            if visiting.contains(id) {
                return Err(LoadError::CircularInheritance(id.to_string()));
            }

            visiting.insert(id.to_string());

            if let Some(parent_id) = raw_prototypes.get(id).and_then(|raw| raw.extends.as_ref()) {
                if !raw_prototypes.contains_key(parent_id) {
                    return Err(LoadError::UnknownParent {
                        id: id.to_string(),
                        parent: parent_id.clone(),
                    });
                }
                visit(parent_id, raw_prototypes, sorted, visited, visiting)?;
            }

            visiting.remove(id);
            visited.insert(id.to_string());
            sorted.push(id.to_string());

            Ok(())
        }

        // Sorted keys keep resolution order stable across runs
        let mut ids: Vec<&String> = raw_prototypes.keys().collect();
        ids.sort();
        for id in ids {
            visit(id, raw_prototypes, &mut sorted, &mut visited, &mut visiting)?;
        }

        Ok(sorted)
    }

    fn resolve_prototype(&self, id: &str, raw: &RawMonsterPrototype) -> MonsterPrototype {
        let parent = raw.extends.as_ref().and_then(|parent_id| self.prototypes.get(parent_id));
        let defaults = MonsterStats::default();
        let base = parent.map(|p| &p.stats).unwrap_or(&defaults);

        // Child overrides parent, parent overrides defaults
        let stats = MonsterStats {
            health: raw.stats.health.unwrap_or(base.health),
            damage: raw.stats.damage.unwrap_or(base.damage),
            detection_radius: raw.stats.detection_radius.unwrap_or(base.detection_radius),
            attack_range: raw.stats.attack_range.unwrap_or(base.attack_range),
            move_step: raw.stats.move_step.unwrap_or(base.move_step),
            attack_cooldown_ms: raw.stats.attack_cooldown_ms.unwrap_or(base.attack_cooldown_ms),
            death_linger_ms: raw.stats.death_linger_ms.unwrap_or(base.death_linger_ms),
        };

        MonsterPrototype {
            id: id.to_string(),
            display_name: raw.display_name.clone()
                .or_else(|| parent.map(|p| p.display_name.clone()))
                .unwrap_or_else(|| id.to_string()),
            model: raw.model.clone()
                .or_else(|| parent.map(|p| p.model.clone()))
                .unwrap_or_else(|| "sphere".to_string()),
            boss: raw.boss
                .or_else(|| parent.map(|p| p.boss))
                .unwrap_or(false),
            stats,
        }
    }

    /// Add or replace a prototype directly
    pub fn insert(&mut self, prototype: MonsterPrototype) {
        self.prototypes.insert(prototype.id.clone(), prototype);
    }

    /// Get a prototype by ID
    pub fn get(&self, id: &str) -> Option<&MonsterPrototype> {
        self.prototypes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.prototypes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

impl Default for PrototypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MONSTERS: &str = r#"
[slime]
display_name = "Slime"
model = "slime.glb"

[slime.stats]
health = 100
damage = 10
attack_cooldown_ms = 2000

[goblin_boss]
extends = "slime"
display_name = "Goblin Boss"
boss = true

[goblin_boss.stats]
health = 200
damage = 25
"#;

    fn write_entities(dir: &Path, name: &str, content: &str) {
        let entities = dir.join("entities");
        std::fs::create_dir_all(&entities).unwrap();
        std::fs::write(entities.join(name), content).unwrap();
    }

    #[test]
    fn test_inheritance_resolves_parent_stats() {
        let temp_dir = TempDir::new().unwrap();
        write_entities(temp_dir.path(), "monsters.toml", MONSTERS);

        let mut registry = PrototypeRegistry::new();
        registry.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(registry.len(), 2);

        let boss = registry.get("goblin_boss").unwrap();
        assert!(boss.boss);
        assert_eq!(boss.stats.health, 200);
        assert_eq!(boss.stats.damage, 25);
        // Inherited from slime
        assert_eq!(boss.model, "slime.glb");
        assert_eq!(boss.stats.attack_cooldown_ms, 2000);
        // Engine defaults
        assert_eq!(boss.stats.detection_radius, 50.0);

        let slime = registry.get("slime").unwrap();
        assert!(!slime.boss);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_entities(temp_dir.path(), "bad.toml", "[orphan]\nextends = \"nobody\"\n");

        let mut registry = PrototypeRegistry::new();
        let err = registry.load_from_directory(temp_dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::UnknownParent { .. }));
    }

    #[test]
    fn test_circular_inheritance_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_entities(
            temp_dir.path(),
            "loop.toml",
            "[a]\nextends = \"b\"\n\n[b]\nextends = \"a\"\n",
        );

        let mut registry = PrototypeRegistry::new();
        let err = registry.load_from_directory(temp_dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::CircularInheritance(_)));
    }

    #[test]
    fn test_broken_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        write_entities(temp_dir.path(), "monsters.toml", MONSTERS);
        write_entities(temp_dir.path(), "broken.toml", "[slime\nhealth = ");

        let mut registry = PrototypeRegistry::new();
        registry.load_from_directory(temp_dir.path()).unwrap();
        assert!(registry.contains("slime"));
    }
}
