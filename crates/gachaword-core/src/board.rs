//! Game board: the letter grid, lock states and guess evaluation.
//!
//! This module contains:
//! - Cell lock states (locked, editable, revealed)
//! - The board grid with hint-reveal tracking
//! - Row evaluation against the hidden word

use crate::words::Dictionary;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Number of guesses allowed per game
pub const NUM_TRIES: usize = 6;

/// Editability of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LockState {
    /// Cursed by a gacha event, the player cannot edit it
    Locked,
    /// Normal cell
    #[default]
    Editable,
    /// Shows a hinted letter, the player cannot edit it
    Revealed,
}

impl LockState {
    pub fn is_editable(&self) -> bool {
        matches!(self, LockState::Editable)
    }
}

/// One letter slot in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Uppercase letter, if any
    pub content: Option<char>,
    pub lock_state: LockState,
}

/// Verdict for a guessed letter.
///
/// Variants are ordered by priority: `Correct > Present > Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterFeedback {
    /// Not in the hidden word
    Absent,
    /// In the hidden word, somewhere else
    Present,
    /// In the hidden word at this position
    Correct,
}

/// Result of evaluating a submitted row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowEvaluation {
    /// Letters in the exact right position
    pub num_correct: usize,
    /// Best verdict per distinct letter of the guess
    pub feedback: BTreeMap<char, LetterFeedback>,
    /// Verdict per column, in column order
    pub marks: Vec<LetterFeedback>,
}

impl RowEvaluation {
    /// Sentinel for a row that is incomplete or not a dictionary word
    pub fn rejected() -> Self {
        Self::default()
    }

    /// True for the incomplete/invalid sentinel
    pub fn is_rejected(&self) -> bool {
        self.feedback.is_empty()
    }
}

/// The complete game board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Uppercase hidden word
    hidden_word: Vec<char>,
    /// `cells[row][col]`
    cells: Vec<Vec<Cell>>,
    /// Hint-revealed columns
    revealed: Vec<bool>,
    /// Valid guesses
    #[serde(skip)]
    dictionary: Arc<Dictionary>,
}

impl Board {
    /// Create a board for `hidden_word`, all cells empty and editable
    pub fn new(hidden_word: &str, dictionary: Arc<Dictionary>) -> Self {
        let hidden_word: Vec<char> = hidden_word.to_ascii_uppercase().chars().collect();
        assert!(!hidden_word.is_empty(), "Hidden word must not be empty");

        let word_length = hidden_word.len();
        Self {
            cells: vec![vec![Cell::default(); word_length]; NUM_TRIES],
            revealed: vec![false; word_length],
            hidden_word,
            dictionary,
        }
    }

    /// Create a board with a hidden word drawn from the dictionary
    pub fn random<R: Rng>(dictionary: Arc<Dictionary>, rng: &mut R) -> Self {
        let word = dictionary.random_word(rng);
        Self::new(&word, dictionary)
    }

    pub fn num_rows(&self) -> usize {
        self.cells.len()
    }

    pub fn word_length(&self) -> usize {
        self.hidden_word.len()
    }

    pub fn hidden_word(&self) -> String {
        self.hidden_word.iter().collect()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Get a cell. Panics if out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row][col]
    }

    /// All cells of a row
    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row]
    }

    /// The whole grid, row-major
    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn is_revealed(&self, col: usize) -> bool {
        self.revealed[col]
    }

    pub fn revealed(&self) -> &[bool] {
        &self.revealed
    }

    /// Columns that have not been hint-revealed yet
    pub fn unrevealed_columns(&self) -> Vec<usize> {
        self.revealed
            .iter()
            .enumerate()
            .filter(|(_, revealed)| !**revealed)
            .map(|(col, _)| col)
            .collect()
    }

    /// Whether every cell in the row holds a letter
    pub fn is_row_complete(&self, row: usize) -> bool {
        self.cells[row].iter().all(|c| c.content.is_some())
    }

    /// The row's letters as a word, if complete
    pub fn row_word(&self, row: usize) -> Option<String> {
        self.cells[row].iter().map(|c| c.content).collect()
    }

    // ==================== Player Edits ====================

    /// Write a letter into an editable cell.
    ///
    /// Returns false (and changes nothing) for locked or revealed cells and
    /// for non-alphabetic input.
    pub fn write_letter(&mut self, row: usize, col: usize, letter: char) -> bool {
        if !letter.is_ascii_alphabetic() {
            return false;
        }

        let cell = &mut self.cells[row][col];
        if !cell.lock_state.is_editable() {
            return false;
        }

        cell.content = Some(letter.to_ascii_uppercase());
        true
    }

    /// Clear an editable cell. Returns false for locked or revealed cells.
    pub fn clear_letter(&mut self, row: usize, col: usize) -> bool {
        let cell = &mut self.cells[row][col];
        if !cell.lock_state.is_editable() {
            return false;
        }

        cell.content = None;
        true
    }

    /// Change a cell's lock state unconditionally
    pub fn set_lock_state(&mut self, row: usize, col: usize, state: LockState) {
        self.cells[row][col].lock_state = state;
    }

    // ==================== Event Writes ====================

    /// Write content and lock state together, ignoring the current state
    pub(crate) fn force_write(&mut self, row: usize, col: usize, letter: char, state: LockState) {
        self.cells[row][col] = Cell {
            content: Some(letter.to_ascii_uppercase()),
            lock_state: state,
        };
    }

    /// Empty a cell and make it editable, ignoring the current state
    pub(crate) fn force_clear(&mut self, row: usize, col: usize) {
        self.cells[row][col] = Cell::default();
    }

    /// Reveal the hidden letter at `col` in every row
    pub fn reveal_letter(&mut self, col: usize) {
        self.revealed[col] = true;
        let letter = self.hidden_word[col];
        for row in 0..self.num_rows() {
            self.force_write(row, col, letter, LockState::Revealed);
        }
    }

    // ==================== Evaluation ====================

    /// Score a row against the hidden word.
    ///
    /// Returns [`RowEvaluation::rejected`] when the row has an empty cell or
    /// the word is not in the dictionary. Never mutates the board.
    pub fn evaluate_row(&self, row: usize) -> RowEvaluation {
        let guess: Vec<char> = match self.row_word(row) {
            Some(word) if self.dictionary.contains(&word) => word.chars().collect(),
            _ => return RowEvaluation::rejected(),
        };

        let mut evaluation = RowEvaluation::default();
        for (col, &letter) in guess.iter().enumerate() {
            if letter == self.hidden_word[col] {
                evaluation.num_correct += 1;
                evaluation.feedback.insert(letter, LetterFeedback::Correct);
                evaluation.marks.push(LetterFeedback::Correct);
            } else if self.hidden_word.contains(&letter) {
                let entry = evaluation.feedback.entry(letter).or_insert(LetterFeedback::Present);
                if *entry != LetterFeedback::Correct {
                    *entry = LetterFeedback::Present;
                }
                evaluation.marks.push(LetterFeedback::Present);
            } else {
                evaluation.feedback.entry(letter).or_insert(LetterFeedback::Absent);
                evaluation.marks.push(LetterFeedback::Absent);
            }
        }

        evaluation
    }
}
