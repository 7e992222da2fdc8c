//! Quest state-change notifications.

use serde::Serialize;

use super::state::QuestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestChangeKind {
    Accepted,
    Completed,
    RewardClaimed,
}

/// Published to a quest's subscribers after each transition. Carries the
/// quest's flags as they are after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestChange {
    pub quest: QuestId,
    pub title: String,
    pub kind: QuestChangeKind,
    pub accepted: bool,
    pub completed: bool,
    pub reward_claimed: bool,
}
