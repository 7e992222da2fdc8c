//! Line-by-line dialogue reading and the input lock held while it runs.

use std::cell::Cell;
use std::rc::Rc;

use crate::clock::Millis;

/// Shared counter of outstanding input locks. Player movement is ignored
/// while any guard is alive.
#[derive(Debug, Clone, Default)]
pub struct InputLock {
    holders: Rc<Cell<u32>>,
}

impl InputLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> InputLockGuard {
        self.holders.set(self.holders.get() + 1);
        InputLockGuard {
            holders: Rc::clone(&self.holders),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holders.get() > 0
    }
}

/// Releases its lock when dropped
#[derive(Debug)]
pub struct InputLockGuard {
    holders: Rc<Cell<u32>>,
}

impl Drop for InputLockGuard {
    fn drop(&mut self) {
        self.holders.set(self.holders.get().saturating_sub(1));
    }
}

/// Result of asking the reader for the next line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStep {
    /// Too soon after the previous advance
    Ignored,
    Line(String),
    Finished,
}

/// Walks through a state's lines, revealing each one character by character
#[derive(Debug)]
pub struct LineReader {
    lines: Vec<String>,
    index: usize,
    line_started_at: Millis,
    last_advance_at: Option<Millis>,
    text_speed_ms: Millis,
    debounce_ms: Millis,
    _lock: InputLockGuard,
}

impl LineReader {
    pub fn new(
        lines: Vec<String>,
        now: Millis,
        text_speed_ms: Millis,
        debounce_ms: Millis,
        lock: InputLockGuard,
    ) -> Self {
        Self {
            lines,
            index: 0,
            line_started_at: now,
            last_advance_at: None,
            text_speed_ms,
            debounce_ms,
            _lock: lock,
        }
    }

    pub fn current_line(&self) -> Option<&str> {
        self.lines.get(self.index).map(String::as_str)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.lines.len()
    }

    /// Move to the next line, debounced
    pub fn advance(&mut self, now: Millis) -> LineStep {
        if let Some(last) = self.last_advance_at {
            if now.saturating_sub(last) < self.debounce_ms {
                return LineStep::Ignored;
            }
        }
        self.last_advance_at = Some(now);

        self.index += 1;
        self.line_started_at = now;
        match self.current_line() {
            Some(line) => LineStep::Line(line.to_string()),
            None => LineStep::Finished,
        }
    }

    /// The part of the current line shown at `now`: one more character
    /// every `text_speed_ms`
    pub fn visible_text(&self, now: Millis) -> Option<String> {
        let line = self.current_line()?;
        if self.text_speed_ms == 0 {
            return Some(line.to_string());
        }
        let elapsed = now.saturating_sub(self.line_started_at);
        let shown = (elapsed / self.text_speed_ms) as usize;
        Some(line.chars().take(shown).collect())
    }
}
