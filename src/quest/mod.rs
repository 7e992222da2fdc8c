//! Quest System Module
//!
//! Quests are defined in TOML, linked to encounter zones and bosses by id,
//! and publish their state changes to subscribers such as the dialogue gate.

pub mod definition;
pub mod events;
pub mod ledger;
pub mod state;

pub use definition::{QuestDefinition, load_quest_definitions};
pub use events::{QuestChange, QuestChangeKind};
pub use ledger::QuestLedger;
pub use state::{EncounterArena, Quest, QuestId, QuestView};
