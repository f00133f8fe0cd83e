//! Gacha events: weighted random mutations of the board.
//!
//! The engine holds nothing but its weight table. Every event is applied to a
//! board and the session's current row, and reports what it did as an
//! [`EventOutcome`]. Terminal events (instant win / lose) never touch the
//! board; they return a signal for the session to act on.

use crate::board::{Board, LockState};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Number of boxes in the animation strip
pub const DEFAULT_REEL_LENGTH: usize = 50;

/// The strip stops between these box indices (inclusive)
pub const MIN_REEL_STOP: usize = 10;
pub const MAX_REEL_STOP: usize = 40;

/// Whether an event helps or hurts the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Bless,
    Curse,
}

/// The gacha events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Unlock the earliest cursed cell
    RemoveCurse,
    /// Wipe a remaining row so it can be typed again
    AddTries,
    /// Reveal one hidden letter in every row
    HintOneLetter,
    /// Win immediately
    WinGame,
    /// Lock a random cell with a random letter
    AddCurse,
    /// Fill a future row with random locked letters
    RemoveTries,
    /// Lose immediately
    LoseGame,
}

impl EventKind {
    /// All event kinds
    pub const ALL: [EventKind; 7] = [
        EventKind::RemoveCurse,
        EventKind::AddTries,
        EventKind::HintOneLetter,
        EventKind::WinGame,
        EventKind::AddCurse,
        EventKind::RemoveTries,
        EventKind::LoseGame,
    ];

    /// Name shown on the gacha box
    pub fn display_name(&self) -> &'static str {
        match self {
            EventKind::RemoveCurse => "Remove Curse",
            EventKind::AddTries => "Add Tries",
            EventKind::HintOneLetter => "Hint",
            EventKind::WinGame => "Instant Win",
            EventKind::AddCurse => "Add Curse",
            EventKind::RemoveTries => "Remove Tries",
            EventKind::LoseGame => "Instant Lose",
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            EventKind::RemoveCurse
            | EventKind::AddTries
            | EventKind::HintOneLetter
            | EventKind::WinGame => EventCategory::Bless,
            EventKind::AddCurse | EventKind::RemoveTries | EventKind::LoseGame => {
                EventCategory::Curse
            }
        }
    }

    /// Apply this event to the board
    pub fn apply<R: Rng>(
        &self,
        board: &mut Board,
        current_row: usize,
        rng: &mut R,
    ) -> EventOutcome {
        match self {
            EventKind::RemoveCurse => EventOutcome::BoardMutation(remove_curse(board, current_row)),
            EventKind::AddTries => EventOutcome::BoardMutation(add_tries(board, current_row, rng)),
            EventKind::HintOneLetter => EventOutcome::BoardMutation(hint_one_letter(board, rng)),
            EventKind::AddCurse => EventOutcome::BoardMutation(add_curse(board, current_row, rng)),
            EventKind::RemoveTries => {
                EventOutcome::BoardMutation(remove_tries(board, current_row, rng))
            }
            EventKind::WinGame => {
                debug!("Gacha: instant win");
                EventOutcome::WinSignal
            }
            EventKind::LoseGame => {
                debug!("Gacha: instant lose");
                EventOutcome::LoseSignal
            }
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Why an event left the board untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoOpReason {
    /// No locked cell in the rows played so far
    NothingCursed,
    /// Add Tries needs at least one submitted row
    NoPreviousRows,
    /// Remove Tries has no row after the current one
    LastRow,
    /// Add Curse hit a cell that was not editable
    TargetNotEditable { row: usize, col: usize },
    /// Every column is already revealed
    AllRevealed,
    /// The current row is past the end of the board
    OutOfRows,
}

/// What a board event changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventEffect {
    /// A locked cell became editable
    CurseRemoved { row: usize, col: usize },
    /// A row was wiped and unlocked
    TriesAdded { row: usize },
    /// A row was filled with locked random letters
    TriesRemoved { row: usize, letters: String },
    /// A cell was locked with a random letter
    CurseAdded { row: usize, col: usize, letter: char },
    /// A column was revealed in every row
    LetterRevealed { col: usize, letter: char },
    /// Nothing changed
    Unchanged(NoOpReason),
}

impl EventEffect {
    pub fn is_noop(&self) -> bool {
        matches!(self, EventEffect::Unchanged(_))
    }
}

/// Result of applying an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    /// The board was (possibly) changed; the game goes on
    BoardMutation(EventEffect),
    /// The session must end in victory
    WinSignal,
    /// The session must end in defeat
    LoseSignal,
}

/// A drawn event together with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GachaRoll {
    pub kind: EventKind,
    pub outcome: EventOutcome,
}

/// An animation strip and the event applied from the box it stops on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GachaSpin {
    pub reel: Vec<EventKind>,
    /// Index of the landing box; `reel[stop] == roll.kind`
    pub stop: usize,
    pub roll: GachaRoll,
}

// ==================== Events ====================

/// Unlock the first locked cell in rows `0..=current_row`, scanning left to right
pub fn remove_curse(board: &mut Board, current_row: usize) -> EventEffect {
    let last_row = current_row.min(board.num_rows() - 1);
    for row in 0..=last_row {
        for col in 0..board.word_length() {
            if board.cell(row, col).lock_state == LockState::Locked {
                board.set_lock_state(row, col, LockState::Editable);
                debug!("Gacha: removed curse at row {}, col {}", row, col);
                return EventEffect::CurseRemoved { row, col };
            }
        }
    }

    debug!("Gacha: no curse to remove up to row {}", current_row);
    EventEffect::Unchanged(NoOpReason::NothingCursed)
}

/// Clear and unlock a random row in `[current_row, rows)`; needs `current_row > 0`
pub fn add_tries<R: Rng>(board: &mut Board, current_row: usize, rng: &mut R) -> EventEffect {
    if current_row == 0 {
        debug!("Gacha: add tries needs a previous row");
        return EventEffect::Unchanged(NoOpReason::NoPreviousRows);
    }
    if current_row >= board.num_rows() {
        return EventEffect::Unchanged(NoOpReason::OutOfRows);
    }

    let row = rng.gen_range(current_row..board.num_rows());
    for col in 0..board.word_length() {
        board.force_clear(row, col);
    }

    debug!("Gacha: cleared row {}", row);
    EventEffect::TriesAdded { row }
}

/// Reveal a random unrevealed column
pub fn hint_one_letter<R: Rng>(board: &mut Board, rng: &mut R) -> EventEffect {
    let unrevealed = board.unrevealed_columns();
    if unrevealed.is_empty() {
        debug!("Gacha: no letters left to reveal");
        return EventEffect::Unchanged(NoOpReason::AllRevealed);
    }

    let col = unrevealed[rng.gen_range(0..unrevealed.len())];
    board.reveal_letter(col);

    let letter = board.cell(0, col).content.unwrap_or_default();
    debug!("Gacha: revealed letter at col {}", col);
    EventEffect::LetterRevealed { col, letter }
}

/// Curse one random cell in `[current_row, rows)`; no retry if it is not editable
pub fn add_curse<R: Rng>(board: &mut Board, current_row: usize, rng: &mut R) -> EventEffect {
    if current_row >= board.num_rows() {
        return EventEffect::Unchanged(NoOpReason::OutOfRows);
    }

    let row = rng.gen_range(current_row..board.num_rows());
    let col = rng.gen_range(0..board.word_length());

    if !board.cell(row, col).lock_state.is_editable() {
        debug!("Gacha: cell at row {}, col {} is already cursed", row, col);
        return EventEffect::Unchanged(NoOpReason::TargetNotEditable { row, col });
    }

    let letter = random_letter(rng);
    board.force_write(row, col, letter, LockState::Locked);

    debug!("Gacha: cursed cell at row {}, col {}", row, col);
    EventEffect::CurseAdded { row, col, letter }
}

/// Fill a random row in `(current_row, rows)` with locked random letters
pub fn remove_tries<R: Rng>(board: &mut Board, current_row: usize, rng: &mut R) -> EventEffect {
    if current_row + 1 >= board.num_rows() {
        debug!("Gacha: remove tries on the last row");
        return EventEffect::Unchanged(NoOpReason::LastRow);
    }

    let row = rng.gen_range(current_row + 1..board.num_rows());
    let mut letters = String::with_capacity(board.word_length());
    for col in 0..board.word_length() {
        let letter = random_letter(rng);
        board.force_write(row, col, letter, LockState::Locked);
        letters.push(letter);
    }

    debug!("Gacha: filled row {} with {}", row, letters);
    EventEffect::TriesRemoved { row, letters }
}

fn random_letter<R: Rng>(rng: &mut R) -> char {
    char::from(b'A' + rng.gen_range(0..26u8))
}

// ==================== Weights ====================

/// Errors from building a weight table
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum WeightError {
    #[error("Weight table has no events")]
    Empty,

    #[error("Invalid weight {weight} for {kind:?}")]
    InvalidWeight { kind: EventKind, weight: f64 },

    #[error("Weights must not all be zero")]
    ZeroTotal,
}

/// Errors from parsing configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Unknown weight preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
}

/// The two built-in weight tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightPreset {
    /// Six events, no hints (weights sum to 1.20)
    #[default]
    Classic,
    /// Seven events including hints (weights sum to 1.00)
    Extended,
}

impl WeightPreset {
    /// Relative weight of each event in this preset
    pub fn weights(&self) -> &'static [(EventKind, f64)] {
        match self {
            WeightPreset::Classic => &[
                (EventKind::RemoveCurse, 0.40),
                (EventKind::AddTries, 0.19),
                (EventKind::WinGame, 0.01),
                (EventKind::AddCurse, 0.40),
                (EventKind::RemoveTries, 0.19),
                (EventKind::LoseGame, 0.01),
            ],
            WeightPreset::Extended => &[
                (EventKind::RemoveTries, 0.17),
                (EventKind::AddCurse, 0.30),
                (EventKind::LoseGame, 0.03),
                (EventKind::AddTries, 0.12),
                (EventKind::RemoveCurse, 0.25),
                (EventKind::HintOneLetter, 0.10),
                (EventKind::WinGame, 0.03),
            ],
        }
    }

    pub fn table(&self) -> WeightTable {
        WeightTable::new(self.weights().iter().copied())
            .expect("built-in weight presets are valid")
    }
}

impl FromStr for WeightPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(WeightPreset::Classic),
            "extended" => Ok(WeightPreset::Extended),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for WeightPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightPreset::Classic => f.write_str("classic"),
            WeightPreset::Extended => f.write_str("extended"),
        }
    }
}

/// Relative weights for event selection.
///
/// Weights are used as given; they do not have to sum to one.
#[derive(Debug, Clone)]
pub struct WeightTable {
    entries: Vec<(EventKind, f64)>,
    index: WeightedIndex<f64>,
}

impl WeightTable {
    /// Build a table from `(kind, weight)` pairs
    pub fn new<I>(entries: I) -> Result<Self, WeightError>
    where
        I: IntoIterator<Item = (EventKind, f64)>,
    {
        let entries: Vec<(EventKind, f64)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(WeightError::Empty);
        }

        for &(kind, weight) in &entries {
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightError::InvalidWeight { kind, weight });
            }
        }

        let index = WeightedIndex::new(entries.iter().map(|(_, w)| *w))
            .map_err(|_| WeightError::ZeroTotal)?;

        Ok(Self { entries, index })
    }

    pub fn entries(&self) -> &[(EventKind, f64)] {
        &self.entries
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Weight of a kind (zero if absent)
    pub fn weight(&self, kind: EventKind) -> f64 {
        self.entries
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, w)| w)
            .sum()
    }

    /// Probability of drawing a kind
    pub fn probability(&self, kind: EventKind) -> f64 {
        self.weight(kind) / self.total()
    }

    /// Draw one kind
    pub fn sample<R: Rng>(&self, rng: &mut R) -> EventKind {
        self.entries[self.index.sample(rng)].0
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        WeightPreset::default().table()
    }
}

impl From<WeightPreset> for WeightTable {
    fn from(preset: WeightPreset) -> Self {
        preset.table()
    }
}

// ==================== Engine ====================

/// Picks and applies gacha events
#[derive(Debug, Clone, Default)]
pub struct GachaEngine {
    table: WeightTable,
}

impl GachaEngine {
    pub fn new(table: WeightTable) -> Self {
        Self { table }
    }

    pub fn from_preset(preset: WeightPreset) -> Self {
        Self::new(preset.table())
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Draw an event kind without applying it
    pub fn choose<R: Rng>(&self, rng: &mut R) -> EventKind {
        self.table.sample(rng)
    }

    /// Draw an event by weight and apply it to the board
    pub fn random_event<R: Rng>(
        &self,
        board: &mut Board,
        current_row: usize,
        rng: &mut R,
    ) -> GachaRoll {
        let kind = self.choose(rng);
        let outcome = kind.apply(board, current_row, rng);
        GachaRoll { kind, outcome }
    }

    /// Draw a strip of `len` weighted events
    pub fn reel<R: Rng>(&self, len: usize, rng: &mut R) -> Vec<EventKind> {
        (0..len).map(|_| self.choose(rng)).collect()
    }

    /// Draw a strip, pick the box it stops on and apply that event.
    ///
    /// Every box is a weighted draw, so the landing box follows the table.
    /// Strips shorter than [`MIN_REEL_STOP`] stop on their last box.
    pub fn spin<R: Rng>(
        &self,
        board: &mut Board,
        current_row: usize,
        len: usize,
        rng: &mut R,
    ) -> GachaSpin {
        let reel = self.reel(len.max(1), rng);
        let last = reel.len() - 1;
        let stop = rng.gen_range(MIN_REEL_STOP.min(last)..=MAX_REEL_STOP.min(last));

        let kind = reel[stop];
        let outcome = kind.apply(board, current_row, rng);
        GachaSpin {
            reel,
            stop,
            roll: GachaRoll { kind, outcome },
        }
    }
}
