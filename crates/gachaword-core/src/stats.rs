//! Session statistics and keyboard letter states.
//!
//! Both live in memory only. Stats survive restarts within a process;
//! the keyboard state is per game.

use crate::board::LetterFeedback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Win/loss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Consecutive wins
    pub streak: u32,
    /// Finished games (won, lost or surrendered)
    pub total_games: u32,
    pub total_wins: u32,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_win(&mut self) {
        self.total_games += 1;
        self.total_wins += 1;
        self.streak += 1;
    }

    /// Loss or surrender
    pub fn record_loss(&mut self) {
        self.total_games += 1;
        self.streak = 0;
    }

    /// Abandoning a game resets the streak without counting a game
    pub fn break_streak(&mut self) {
        self.streak = 0;
    }

    /// Percentage of finished games that were won
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.total_wins) * 100.0 / f64::from(self.total_games)
    }
}

/// Best known verdict for each letter across this game's guesses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardState {
    letters: BTreeMap<char, LetterFeedback>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a row's feedback in. A letter never drops to a lower verdict.
    pub fn merge(&mut self, feedback: &BTreeMap<char, LetterFeedback>) {
        for (&letter, &state) in feedback {
            let entry = self.letters.entry(letter).or_insert(state);
            if state > *entry {
                *entry = state;
            }
        }
    }

    pub fn get(&self, letter: char) -> Option<LetterFeedback> {
        self.letters.get(&letter.to_ascii_uppercase()).copied()
    }

    pub fn letters(&self) -> &BTreeMap<char, LetterFeedback> {
        &self.letters
    }

    pub fn clear(&mut self) {
        self.letters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_transitions() {
        let mut stats = Stats::new();
        stats.record_win();
        stats.record_win();
        assert_eq!(
            stats,
            Stats {
                streak: 2,
                total_games: 2,
                total_wins: 2
            }
        );

        stats.record_loss();
        assert_eq!(
            stats,
            Stats {
                streak: 0,
                total_games: 3,
                total_wins: 2
            }
        );

        stats.record_win();
        stats.break_streak();
        assert_eq!(
            stats,
            Stats {
                streak: 0,
                total_games: 4,
                total_wins: 3
            }
        );
        assert_eq!(stats.win_rate(), 75.0);
    }

    #[test]
    fn test_win_rate_without_games() {
        assert_eq!(Stats::new().win_rate(), 0.0);
    }

    #[test]
    fn test_keyboard_never_downgrades() {
        let mut keyboard = KeyboardState::new();

        keyboard.merge(&BTreeMap::from([
            ('A', LetterFeedback::Correct),
            ('T', LetterFeedback::Absent),
        ]));
        keyboard.merge(&BTreeMap::from([
            ('A', LetterFeedback::Present),
            ('R', LetterFeedback::Present),
        ]));
        keyboard.merge(&BTreeMap::from([('R', LetterFeedback::Correct)]));

        assert_eq!(keyboard.get('a'), Some(LetterFeedback::Correct));
        assert_eq!(keyboard.get('R'), Some(LetterFeedback::Correct));
        assert_eq!(keyboard.get('T'), Some(LetterFeedback::Absent));
        assert_eq!(keyboard.get('Z'), None);

        keyboard.clear();
        assert!(keyboard.letters().is_empty());
    }
}
