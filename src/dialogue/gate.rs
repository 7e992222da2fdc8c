//! The narrative gate.
//!
//! Each dialogue state offers a batch of quests. The gate moves on to the
//! next state only when the set of freshly completed quests is exactly the
//! current state's batch. The final state never advances.

use serde::Serialize;
use std::collections::BTreeSet;
use std::rc::Rc;
use tracing::{debug, info};

use super::definition::{DialogueDefinition, DialogueState};
use super::reader::{InputLock, LineReader, LineStep};
use crate::clock::Millis;
use crate::presenter::Presenter;
use crate::quest::QuestChange;

pub struct DialogueGate {
    character: String,
    states: Vec<DialogueState>,
    current_index: usize,
    /// Titles of completed, unclaimed quests since the last advance
    pending: BTreeSet<String>,
    /// States whose quest batch has already been shown
    revealed: BTreeSet<usize>,
    reader: Option<LineReader>,
    input: InputLock,
    presenter: Rc<dyn Presenter>,
    text_speed_ms: Millis,
    debounce_ms: Millis,
}

impl DialogueGate {
    pub fn new(
        definition: DialogueDefinition,
        input: InputLock,
        presenter: Rc<dyn Presenter>,
        text_speed_ms: Millis,
        debounce_ms: Millis,
    ) -> Self {
        Self {
            character: definition.character,
            states: definition.states,
            current_index: 0,
            pending: BTreeSet::new(),
            revealed: BTreeSet::new(),
            reader: None,
            input,
            presenter,
            text_speed_ms,
            debounce_ms,
        }
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn is_final_state(&self) -> bool {
        self.current_index + 1 >= self.states.len()
    }

    /// Quest titles the active state waits on
    pub fn required_titles(&self) -> BTreeSet<String> {
        self.states
            .get(self.current_index)
            .map(|s| s.required_quest_titles.clone())
            .unwrap_or_default()
    }

    pub fn pending(&self) -> &BTreeSet<String> {
        &self.pending
    }

    pub fn is_talking(&self) -> bool {
        self.reader.is_some()
    }

    /// A quest can be accepted once a state listing it has been revealed
    pub fn is_offered(&self, title: &str) -> bool {
        self.revealed.iter().any(|i| {
            self.states
                .get(*i)
                .is_some_and(|s| s.required_quest_titles.contains(title))
        })
    }

    pub fn offered_titles(&self) -> Vec<String> {
        let titles: BTreeSet<&String> = self
            .revealed
            .iter()
            .filter_map(|i| self.states.get(*i))
            .flat_map(|s| s.required_quest_titles.iter())
            .collect();
        titles.into_iter().cloned().collect()
    }

    /// Subscriber for quest state changes
    pub fn on_quest_state_change(&mut self, change: &QuestChange) {
        if !change.completed || change.reward_claimed {
            return;
        }
        if !self.pending.insert(change.title.clone()) {
            return;
        }

        if self.is_final_state() || self.pending != self.required_titles() {
            return;
        }

        self.current_index += 1;
        self.pending.clear();
        info!(
            "{} dialogue advanced to state {}",
            self.character, self.current_index
        );
        self.reveal(self.current_index);
    }

    fn reveal(&mut self, index: usize) {
        if !self.revealed.insert(index) {
            return;
        }
        let titles: Vec<String> = self
            .states
            .get(index)
            .map(|s| s.required_quest_titles.iter().cloned().collect())
            .unwrap_or_default();
        if !titles.is_empty() {
            self.presenter.quest_batch_revealed(index, &titles);
        }
    }

    /// Begin reading the current state's lines. Returns false if a dialogue
    /// is already open.
    pub fn start_dialogue(&mut self, now: Millis) -> bool {
        if self.reader.is_some() {
            return false;
        }
        let Some(state) = self.states.get(self.current_index) else {
            return false;
        };

        let reader = LineReader::new(
            state.lines.clone(),
            now,
            self.text_speed_ms,
            self.debounce_ms,
            self.input.acquire(),
        );
        match reader.current_line() {
            Some(line) => {
                debug!("{} starts talking", self.character);
                self.presenter.dialogue_text(&self.character, line);
                self.reader = Some(reader);
            }
            None => self.finish(),
        }
        true
    }

    pub fn next_line(&mut self, now: Millis) -> LineStep {
        let Some(reader) = self.reader.as_mut() else {
            return LineStep::Finished;
        };

        let step = reader.advance(now);
        match &step {
            LineStep::Line(line) => self.presenter.dialogue_text(&self.character, line),
            LineStep::Finished => {
                self.reader = None;
                self.finish();
            }
            LineStep::Ignored => {}
        }
        step
    }

    fn finish(&mut self) {
        self.presenter.dialogue_closed();
        self.reveal(self.current_index);
    }

    pub fn visible_text(&self, now: Millis) -> Option<String> {
        self.reader.as_ref().and_then(|r| r.visible_text(now))
    }

    /// Back to the first state with nothing offered
    pub fn reset(&mut self) {
        self.reader = None;
        self.current_index = 0;
        self.pending.clear();
        self.revealed.clear();
    }

    pub fn view(&self) -> GateView {
        GateView {
            character: self.character.clone(),
            current_index: self.current_index,
            required: self.required_titles().into_iter().collect(),
            pending: self.pending.iter().cloned().collect(),
            offered: self.offered_titles(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GateView {
    pub character: String,
    pub current_index: usize,
    pub required: Vec<String>,
    pub pending: Vec<String>,
    pub offered: Vec<String>,
}
