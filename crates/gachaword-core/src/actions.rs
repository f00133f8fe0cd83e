//! Player inputs and the events a session reports back.
//!
//! This module defines the input a presentation layer can send, the outcome
//! of each input, and the [`SessionEvent`]s pushed to its [`Presenter`].

use crate::board::RowEvaluation;
use crate::gacha::GachaRoll;
use crate::stats::Stats;
use serde::{Deserialize, Serialize};

/// Discrete input driving a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Input {
    /// Type a letter at the cursor
    Letter(char),
    /// Delete the letter before the cursor
    Backspace,
    /// Submit the current row
    Enter,
    /// Roll the gacha
    TriggerEvent,
}

impl Input {
    /// Map a key name ("a".."z", "backspace", "enter") to an input
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "backspace" => Some(Input::Backspace),
            "enter" => Some(Input::Enter),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => Some(Input::Letter(c)),
                    _ => None,
                }
            }
        }
    }
}

/// What an input did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputOutcome {
    /// Accepted; the game goes on
    Ok,
    /// Enter on a row with an empty cell
    Incomplete,
    /// Enter on a full row that is not a dictionary word
    InvalidWord,
    /// The input ended the game in victory
    Won,
    /// The input ended the game in defeat
    Lost,
    /// No game in progress, or not a letter
    Ignored,
}

/// Why a submitted row was not evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    Incomplete,
    InvalidWord,
}

impl From<RejectReason> for InputOutcome {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::Incomplete => InputOutcome::Incomplete,
            RejectReason::InvalidWord => InputOutcome::InvalidWord,
        }
    }
}

/// How a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEnding {
    Won,
    Lost,
    Surrendered,
}

/// Observable changes, in the order they happen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A new game began
    GameStarted {
        word_length: usize,
        num_rows: usize,
    },

    /// A letter was typed into a cell
    LetterWritten { row: usize, col: usize, letter: char },

    /// A cell was cleared by backspace
    LetterCleared { row: usize, col: usize },

    /// Enter was pressed on a row that could not be evaluated
    RowRejected { row: usize, reason: RejectReason },

    /// A row was scored
    RowEvaluated { row: usize, evaluation: RowEvaluation },

    /// A gacha event was drawn and applied
    GachaRolled { roll: GachaRoll },

    /// The game ended
    GameOver {
        ending: GameEnding,
        hidden_word: String,
        /// Rows submitted when the game ended
        tries: usize,
    },

    /// Counters changed
    StatsChanged { stats: Stats },

    /// The session went back to the menu
    ReturnedToMenu,
}

/// Receives session events; implemented by the presentation layer
pub trait Presenter {
    fn present(&mut self, event: &SessionEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _event: &SessionEvent) {}
}

/// Records events for later inspection
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Take all recorded events, leaving the log empty
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Presenter for EventLog {
    fn present(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

impl<F> Presenter for F
where
    F: FnMut(&SessionEvent),
{
    fn present(&mut self, event: &SessionEvent) {
        self(event)
    }
}
