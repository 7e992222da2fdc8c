//! Quest-giver dialogue and the narrative gate.

pub mod definition;
pub mod gate;
pub mod reader;

pub use definition::{DialogueDefinition, DialogueState};
pub use gate::{DialogueGate, GateView};
pub use reader::{InputLock, InputLockGuard, LineStep};
