//! Encounter and progression engine: monster AI, wave-based encounter
//! zones, quests gated on those zones, and a quest-giver dialogue that only
//! moves on once exactly the right quests are done.

pub mod autopilot;
pub mod boss;
pub mod clock;
pub mod config;
pub mod dialogue;
pub mod entity;
pub mod error;
pub mod hits;
pub mod level;
pub mod memory;
pub mod monster;
pub mod observer;
pub mod player;
pub mod presenter;
pub mod quest;
pub mod spatial;
pub mod world;
pub mod zone;

pub use autopilot::{Autopilot, AutopilotStatus};
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use config::EngineConfig;
pub use error::{LoadError, QuestError, RewardError};
pub use level::LevelData;
pub use presenter::{NullPresenter, Presenter, TracingPresenter};
pub use world::{TickReport, World, WorldSnapshot};
