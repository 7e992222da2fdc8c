//! Dialogue definitions loaded from `<data_dir>/dialogue.toml`.
//!
//! ```toml
//! character = "Morpheus"
//!
//! [[state]]
//! lines = ["Welcome, dreamer.", "The island needs you."]
//! requires = ["Slime Cleanup", "Cave Sweep"]
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use crate::error::LoadError;

#[derive(Debug, Clone, Deserialize)]
pub struct RawDialogueFile {
    pub character: String,
    #[serde(default, rename = "state")]
    pub states: Vec<RawDialogueState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDialogueState {
    #[serde(default)]
    pub lines: Vec<String>,
    /// Quest batch offered by this state, all of which must be completed
    /// before the narrative moves on
    #[serde(default)]
    pub requires: Vec<String>,
}

/// One step of the narrative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueState {
    pub lines: Vec<String>,
    pub required_quest_titles: BTreeSet<String>,
}

impl DialogueState {
    pub fn new(lines: &[&str], requires: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            required_quest_titles: requires.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueDefinition {
    pub character: String,
    pub states: Vec<DialogueState>,
}

impl DialogueDefinition {
    pub fn from_raw(raw: RawDialogueFile) -> Self {
        Self {
            character: raw.character,
            states: raw
                .states
                .into_iter()
                .map(|s| DialogueState {
                    lines: s.lines,
                    required_quest_titles: s.requires.into_iter().collect(),
                })
                .collect(),
        }
    }

    /// Load the level's dialogue tree. A missing file yields `None`.
    pub fn load(data_dir: &Path) -> Result<Option<Self>, LoadError> {
        let path = data_dir.join("dialogue.toml");
        if !path.exists() {
            warn!("No dialogue at {:?}", path);
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let raw: RawDialogueFile =
            toml::from_str(&content).map_err(|source| LoadError::Parse { path, source })?;

        let definition = Self::from_raw(raw);
        info!(
            "Loaded dialogue for {} ({} states)",
            definition.character,
            definition.states.len()
        );
        Ok(Some(definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dialogue() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("dialogue.toml"),
            r#"
character = "Morpheus"

[[state]]
lines = ["Hello.", "Go."]
requires = ["Q1", "Q2"]

[[state]]
lines = ["Well done."]
"#,
        )
        .unwrap();

        let def = DialogueDefinition::load(dir.path()).unwrap().unwrap();
        assert_eq!(def.character, "Morpheus");
        assert_eq!(def.states.len(), 2);
        assert_eq!(def.states[0], DialogueState::new(&["Hello.", "Go."], &["Q1", "Q2"]));
        assert!(def.states[1].required_quest_titles.is_empty());
    }

    #[test]
    fn test_missing_dialogue() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DialogueDefinition::load(dir.path()).unwrap().is_none());
    }
}
