//! Game session state machine.
//!
//! This module contains the main `GameSession` struct: turn progression,
//! win/loss detection, stats bookkeeping and gacha dispatch.

use crate::actions::{
    GameEnding, Input, InputOutcome, NullPresenter, Presenter, RejectReason, SessionEvent,
};
use crate::board::{Board, Cell, LetterFeedback};
use crate::gacha::{
    ConfigError, EventEffect, EventOutcome, GachaEngine, GachaRoll, GachaSpin, WeightPreset,
};
use crate::stats::{KeyboardState, Stats};
use crate::words::Dictionary;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting on the menu; no input accepted
    Menu,
    /// Accepting guesses and gacha rolls
    InProgress,
    /// Terminal: hidden word found or instant win
    Won,
    /// Terminal: out of rows or instant lose
    Lost,
    /// Terminal: the player gave up
    Surrendered,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Won | SessionPhase::Lost | SessionPhase::Surrendered
        )
    }
}

impl From<GameEnding> for SessionPhase {
    fn from(ending: GameEnding) -> Self {
        match ending {
            GameEnding::Won => SessionPhase::Won,
            GameEnding::Lost => SessionPhase::Lost,
            GameEnding::Surrendered => SessionPhase::Surrendered,
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Gacha weight table
    pub weights: WeightPreset,
    /// RNG seed for reproducible games; entropy when `None`
    pub seed: Option<u64>,
}

impl SessionConfig {
    /// Build from raw string settings (e.g. environment variables)
    pub fn from_vars(weights: Option<&str>, seed: Option<&str>) -> Result<Self, ConfigError> {
        let weights = match weights {
            Some(name) => name.parse()?,
            None => WeightPreset::default(),
        };
        let seed = match seed {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed(raw.to_string()))?,
            ),
            None => None,
        };
        Ok(Self { weights, seed })
    }
}

/// Serialisable view of a session for remote presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub current_row: usize,
    pub current_col: usize,
    pub word_length: usize,
    pub num_rows: usize,
    pub cells: Vec<Vec<Cell>>,
    pub revealed: Vec<bool>,
    pub stats: Stats,
    pub win_rate: f64,
    pub keyboard: BTreeMap<char, LetterFeedback>,
    /// Only set once the game is over
    pub hidden_word: Option<String>,
}

/// One player's game session
pub struct GameSession<P: Presenter = NullPresenter> {
    board: Board,
    engine: GachaEngine,
    dictionary: Arc<Dictionary>,
    rng: StdRng,
    phase: SessionPhase,
    current_row: usize,
    current_col: usize,
    stats: Stats,
    keyboard: KeyboardState,
    presenter: P,
}

impl GameSession<NullPresenter> {
    /// Create a session with the standard dictionary and no presenter
    pub fn new(config: SessionConfig) -> Self {
        Self::with_presenter(config, Arc::new(Dictionary::standard()), NullPresenter)
    }
}

impl<P: Presenter> GameSession<P> {
    /// Create a session and start its first game
    pub fn with_presenter(
        config: SessionConfig,
        dictionary: Arc<Dictionary>,
        presenter: P,
    ) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::random(dictionary.clone(), &mut rng);

        let mut session = Self {
            board,
            engine: GachaEngine::from_preset(config.weights),
            dictionary,
            rng,
            phase: SessionPhase::InProgress,
            current_row: 0,
            current_col: 0,
            stats: Stats::new(),
            keyboard: KeyboardState::new(),
            presenter,
        };
        session.announce_new_game();
        session
    }

    /// Replace the gacha engine (e.g. a custom weight table)
    pub fn set_engine(&mut self, engine: GachaEngine) {
        self.engine = engine;
    }

    /// Replace the board. The cursor and phase are left alone.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn engine(&self) -> &GachaEngine {
        &self.engine
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_row(&self) -> usize {
        self.current_row
    }

    pub fn current_col(&self) -> usize {
        self.current_col
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase == SessionPhase::InProgress
    }

    /// Dispatch one input
    pub fn handle_input(&mut self, input: Input) -> InputOutcome {
        match input {
            Input::Letter(letter) => self.submit_letter(letter),
            Input::Backspace => self.backspace(),
            Input::Enter => self.submit_row(),
            Input::TriggerEvent => match self.trigger_event() {
                None => InputOutcome::Ignored,
                Some(_) => match self.phase {
                    SessionPhase::Won => InputOutcome::Won,
                    SessionPhase::Lost => InputOutcome::Lost,
                    _ => InputOutcome::Ok,
                },
            },
        }
    }

    // ==================== Typing ====================

    /// Type a letter at the cursor, skipping forward over locked cells
    pub fn submit_letter(&mut self, letter: char) -> InputOutcome {
        if !self.is_in_progress() || !letter.is_ascii_alphabetic() {
            return InputOutcome::Ignored;
        }
        if self.current_col >= self.board.word_length() {
            return InputOutcome::Ok;
        }

        let row = self.current_row;
        let target = (self.current_col..self.board.word_length())
            .find(|&col| self.board.write_letter(row, col, letter));

        if let Some(col) = target {
            self.current_col = col + 1;
            self.presenter.present(&SessionEvent::LetterWritten {
                row,
                col,
                letter: letter.to_ascii_uppercase(),
            });
        }
        InputOutcome::Ok
    }

    /// Delete before the cursor, skipping backward over locked cells
    pub fn backspace(&mut self) -> InputOutcome {
        if !self.is_in_progress() {
            return InputOutcome::Ignored;
        }

        let row = self.current_row;
        let target = (0..self.current_col)
            .rev()
            .find(|&col| self.board.clear_letter(row, col));

        if let Some(col) = target {
            self.current_col = col;
            self.presenter.present(&SessionEvent::LetterCleared { row, col });
        }
        InputOutcome::Ok
    }

    // ==================== Submission ====================

    /// Submit the current row
    pub fn submit_row(&mut self) -> InputOutcome {
        if !self.is_in_progress() {
            return InputOutcome::Ignored;
        }

        let row = self.current_row;
        let evaluation = self.board.evaluate_row(row);

        if evaluation.is_rejected() {
            let reason = if self.board.is_row_complete(row) {
                RejectReason::InvalidWord
            } else {
                RejectReason::Incomplete
            };
            debug!("Row {} rejected: {:?}", row, reason);
            self.presenter.present(&SessionEvent::RowRejected { row, reason });
            return reason.into();
        }

        self.keyboard.merge(&evaluation.feedback);
        let solved = evaluation.num_correct == self.board.word_length();
        self.presenter.present(&SessionEvent::RowEvaluated { row, evaluation });

        self.current_row += 1;
        self.current_col = 0;

        if solved {
            self.finish(GameEnding::Won);
            InputOutcome::Won
        } else if self.current_row >= self.board.num_rows() {
            self.finish(GameEnding::Lost);
            InputOutcome::Lost
        } else {
            InputOutcome::Ok
        }
    }

    // ==================== Gacha ====================

    /// Roll the gacha. Returns `None` when no game is in progress.
    pub fn trigger_event(&mut self) -> Option<GachaRoll> {
        if !self.is_in_progress() {
            return None;
        }

        let roll = self
            .engine
            .random_event(&mut self.board, self.current_row, &mut self.rng);
        self.resolve_roll(&roll);
        Some(roll)
    }

    /// Roll the gacha through an animation strip of `len` boxes.
    ///
    /// The applied event is the box the strip stops on.
    pub fn spin(&mut self, len: usize) -> Option<GachaSpin> {
        if !self.is_in_progress() {
            return None;
        }

        let spin = self
            .engine
            .spin(&mut self.board, self.current_row, len, &mut self.rng);
        self.resolve_roll(&spin.roll);
        Some(spin)
    }

    // ==================== Lifecycle ====================

    /// Give up the current game
    pub fn surrender(&mut self) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        self.finish(GameEnding::Surrendered);
        true
    }

    /// Start a new game after the previous one ended (or from the menu)
    pub fn restart(&mut self) -> bool {
        if self.is_in_progress() {
            return false;
        }

        self.new_board();
        self.phase = SessionPhase::InProgress;
        self.announce_new_game();
        true
    }

    /// Go back to the menu with a fresh board.
    ///
    /// Leaving a game with submitted rows counts as abandoning it.
    pub fn reset_to_menu(&mut self) {
        if self.is_in_progress() && self.current_row > 0 {
            self.stats.break_streak();
            self.presenter
                .present(&SessionEvent::StatsChanged { stats: self.stats });
        }

        self.new_board();
        self.phase = SessionPhase::Menu;
        self.presenter.present(&SessionEvent::ReturnedToMenu);
    }

    /// Leave the menu and play the prepared board
    pub fn enter_game(&mut self) -> bool {
        if self.phase != SessionPhase::Menu {
            return false;
        }
        self.phase = SessionPhase::InProgress;
        self.announce_new_game();
        true
    }

    /// Current state for a remote presentation layer
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            current_row: self.current_row,
            current_col: self.current_col,
            word_length: self.board.word_length(),
            num_rows: self.board.num_rows(),
            cells: self.board.cells().to_vec(),
            revealed: self.board.revealed().to_vec(),
            stats: self.stats,
            win_rate: self.stats.win_rate(),
            keyboard: self.keyboard.letters().clone(),
            hidden_word: self
                .phase
                .is_terminal()
                .then(|| self.board.hidden_word()),
        }
    }

    // ==================== Helper Methods ====================

    fn finish(&mut self, ending: GameEnding) {
        match ending {
            GameEnding::Won => self.stats.record_win(),
            GameEnding::Lost | GameEnding::Surrendered => self.stats.record_loss(),
        }
        self.phase = ending.into();

        info!(
            "Game over ({:?}) after {} rows, word was {}",
            ending,
            self.current_row,
            self.board.hidden_word()
        );

        self.presenter.present(&SessionEvent::GameOver {
            ending,
            hidden_word: self.board.hidden_word(),
            tries: self.current_row,
        });
        self.presenter
            .present(&SessionEvent::StatsChanged { stats: self.stats });
    }

    fn resolve_roll(&mut self, roll: &GachaRoll) {
        info!("Gacha rolled {} at row {}", roll.kind, self.current_row);

        if let EventOutcome::BoardMutation(EventEffect::TriesAdded { row }) = roll.outcome {
            if row == self.current_row {
                self.current_col = 0;
            }
        }

        self.presenter
            .present(&SessionEvent::GachaRolled { roll: roll.clone() });

        match roll.outcome {
            EventOutcome::WinSignal => self.finish(GameEnding::Won),
            EventOutcome::LoseSignal => self.finish(GameEnding::Lost),
            EventOutcome::BoardMutation(_) => {}
        }
    }

    fn new_board(&mut self) {
        self.board = Board::random(self.dictionary.clone(), &mut self.rng);
        self.current_row = 0;
        self.current_col = 0;
        self.keyboard.clear();
    }

    fn announce_new_game(&mut self) {
        debug!("New game, {} letters", self.board.word_length());
        self.presenter.present(&SessionEvent::GameStarted {
            word_length: self.board.word_length(),
            num_rows: self.board.num_rows(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::EventLog;
    use crate::board::LockState;
    use crate::gacha::{EventKind, NoOpReason, WeightTable, DEFAULT_REEL_LENGTH};

    fn session(hidden: &str) -> GameSession<EventLog> {
        let dictionary = Arc::new(Dictionary::standard());
        let config = SessionConfig {
            seed: Some(3),
            ..SessionConfig::default()
        };
        let mut session = GameSession::with_presenter(config, dictionary.clone(), EventLog::new());
        session.set_board(Board::new(hidden, dictionary));
        session
    }

    fn type_word<P: Presenter>(session: &mut GameSession<P>, word: &str) {
        for letter in word.chars() {
            session.handle_input(Input::Letter(letter));
        }
    }

    fn forced_engine(kind: EventKind) -> GachaEngine {
        GachaEngine::new(WeightTable::new([(kind, 1.0)]).unwrap())
    }

    #[test]
    fn test_new_session_starts_in_progress() {
        let session = GameSession::new(SessionConfig::default());
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!((session.current_row(), session.current_col()), (0, 0));
        assert_eq!(*session.stats(), Stats::default());
    }

    #[test]
    fn test_typing_advances_cursor() {
        let mut session = session("crane");
        type_word(&mut session, "tra");
        assert_eq!(session.current_col(), 3);
        assert_eq!(session.board().cell(0, 2).content, Some('A'));

        session.handle_input(Input::Backspace);
        assert_eq!(session.current_col(), 2);
        assert_eq!(session.board().cell(0, 2).content, None);
    }

    #[test]
    fn test_typing_past_end_is_noop() {
        let mut session = session("crane");
        type_word(&mut session, "tracex");
        assert_eq!(session.current_col(), 5);
        assert_eq!(session.board().row_word(0).as_deref(), Some("TRACE"));
    }

    #[test]
    fn test_typing_skips_locked_cells() {
        let mut session = session("crane");
        let mut board = session.board().clone();
        board.set_lock_state(0, 1, LockState::Locked);
        board.set_lock_state(0, 2, LockState::Revealed);
        session.set_board(board);

        type_word(&mut session, "ab");
        assert_eq!(session.board().cell(0, 0).content, Some('A'));
        assert_eq!(session.board().cell(0, 3).content, Some('B'));
        assert_eq!(session.current_col(), 4);

        // Backspace clears col 3, then jumps over the locked cells to col 0
        session.handle_input(Input::Backspace);
        assert_eq!(session.current_col(), 3);
        session.handle_input(Input::Backspace);
        assert_eq!(session.current_col(), 0);
        assert_eq!(session.board().cell(0, 0).content, None);
    }

    #[test]
    fn test_typing_with_no_writable_column_keeps_cursor() {
        let mut session = session("crane");
        let mut board = session.board().clone();
        board.set_lock_state(0, 3, LockState::Locked);
        board.set_lock_state(0, 4, LockState::Locked);
        session.set_board(board);

        type_word(&mut session, "abcd");
        assert_eq!(session.current_col(), 3);
        assert_eq!(session.board().row_word(0), None);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut session = session("crane");
        assert_eq!(session.handle_input(Input::Backspace), InputOutcome::Ok);
        assert_eq!(session.current_col(), 0);
        assert!(session
            .presenter()
            .events()
            .iter()
            .all(|e| !matches!(e, SessionEvent::LetterCleared { .. })));
    }

    #[test]
    fn test_submit_incomplete_and_invalid() {
        let mut session = session("crane");
        type_word(&mut session, "cra");
        assert_eq!(session.handle_input(Input::Enter), InputOutcome::Incomplete);

        type_word(&mut session, "zz");
        assert_eq!(session.handle_input(Input::Enter), InputOutcome::InvalidWord);
        assert_eq!(session.current_row(), 0);
        assert_eq!(session.current_col(), 5);
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn test_wrong_guess_advances_row() {
        let mut session = session("crane");
        type_word(&mut session, "trace");
        assert_eq!(session.handle_input(Input::Enter), InputOutcome::Ok);
        assert_eq!((session.current_row(), session.current_col()), (1, 0));
        assert_eq!(session.keyboard().get('R'), Some(LetterFeedback::Correct));
        assert_eq!(session.keyboard().get('T'), Some(LetterFeedback::Absent));
    }

    #[test]
    fn test_correct_guess_wins() {
        let mut session = session("crane");
        type_word(&mut session, "crane");
        assert_eq!(session.handle_input(Input::Enter), InputOutcome::Won);
        assert_eq!(session.phase(), SessionPhase::Won);
        assert_eq!(
            *session.stats(),
            Stats {
                streak: 1,
                total_games: 1,
                total_wins: 1
            }
        );

        // No further input until restart
        assert_eq!(session.handle_input(Input::Letter('a')), InputOutcome::Ignored);
        assert_eq!(session.handle_input(Input::TriggerEvent), InputOutcome::Ignored);
    }

    #[test]
    fn test_last_row_wrong_guess_loses() {
        let mut session = session("crane");
        session.stats.record_win();

        for _ in 0..5 {
            type_word(&mut session, "trace");
            assert_eq!(session.handle_input(Input::Enter), InputOutcome::Ok);
        }
        assert_eq!(session.current_row(), 5);

        type_word(&mut session, "trace");
        assert_eq!(session.handle_input(Input::Enter), InputOutcome::Lost);
        assert_eq!(session.phase(), SessionPhase::Lost);
        assert_eq!(session.stats().streak, 0);
        assert_eq!(session.stats().total_games, 2);
    }

    #[test]
    fn test_win_signal_skips_board() {
        let mut session = session("crane");
        type_word(&mut session, "cr");
        let before = session.board().cells().to_vec();
        session.set_engine(forced_engine(EventKind::WinGame));

        assert_eq!(session.handle_input(Input::TriggerEvent), InputOutcome::Won);
        assert_eq!(session.phase(), SessionPhase::Won);
        assert_eq!(session.board().cells(), before.as_slice());
        assert_eq!(session.stats().total_wins, 1);
    }

    #[test]
    fn test_lose_signal_ends_game() {
        let mut session = session("crane");
        session.set_engine(forced_engine(EventKind::LoseGame));

        let roll = session.trigger_event().unwrap();
        assert_eq!(roll.outcome, EventOutcome::LoseSignal);
        assert_eq!(session.phase(), SessionPhase::Lost);
        assert!(session.trigger_event().is_none());
    }

    #[test]
    fn test_add_tries_at_first_row_is_reported_noop() {
        let mut session = session("crane");
        session.set_engine(forced_engine(EventKind::AddTries));
        let before = session.board().cells().to_vec();

        assert_eq!(session.handle_input(Input::TriggerEvent), InputOutcome::Ok);
        assert_eq!(session.board().cells(), before.as_slice());
        let expected =
            EventOutcome::BoardMutation(EventEffect::Unchanged(NoOpReason::NoPreviousRows));
        assert!(session.presenter().events().iter().any(|e| matches!(
            e,
            SessionEvent::GachaRolled { roll } if roll.outcome == expected
        )));
    }

    #[test]
    fn test_spin_lands_on_applied_event() {
        let mut session = session("crane");

        let spin = session.spin(DEFAULT_REEL_LENGTH).unwrap();
        assert_eq!(spin.reel[spin.stop], spin.roll.kind);
        assert!(session.presenter().events().iter().any(|e| matches!(
            e,
            SessionEvent::GachaRolled { roll } if *roll == spin.roll
        )));
    }

    #[test]
    fn test_spin_win_ends_game() {
        let mut session = session("crane");
        session.set_engine(forced_engine(EventKind::WinGame));

        let spin = session.spin(DEFAULT_REEL_LENGTH).unwrap();
        assert!(spin.reel.iter().all(|k| *k == EventKind::WinGame));
        assert_eq!(session.phase(), SessionPhase::Won);
        assert!(session.spin(DEFAULT_REEL_LENGTH).is_none());
    }

    #[test]
    fn test_surrender() {
        let mut session = session("crane");
        session.stats.record_win();

        assert!(session.surrender());
        assert_eq!(session.phase(), SessionPhase::Surrendered);
        assert_eq!(
            *session.stats(),
            Stats {
                streak: 0,
                total_games: 2,
                total_wins: 1
            }
        );
        assert!(!session.surrender(), "Already over");
    }

    #[test]
    fn test_restart_keeps_stats() {
        let mut session = session("crane");
        assert!(!session.restart(), "Cannot restart a game in progress");

        type_word(&mut session, "crane");
        session.handle_input(Input::Enter);
        assert!(session.restart());

        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!((session.current_row(), session.current_col()), (0, 0));
        assert_eq!(session.stats().streak, 1);
        assert!(session.keyboard().letters().is_empty());
        assert!(session.board().cells().iter().flatten().all(|c| *c == Cell::default()));
        assert!(session.board().dictionary().contains(&session.board().hidden_word()));
    }

    #[test]
    fn test_reset_to_menu_abandons_started_game() {
        let mut session = session("crane");
        session.stats.record_win();
        type_word(&mut session, "trace");
        session.handle_input(Input::Enter);

        session.reset_to_menu();
        assert_eq!(session.phase(), SessionPhase::Menu);
        assert_eq!(session.stats().streak, 0);
        assert_eq!(session.stats().total_games, 1, "Abandoning is not a finished game");
        assert_eq!(session.handle_input(Input::Letter('a')), InputOutcome::Ignored);

        assert!(session.enter_game());
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert!(!session.enter_game());
    }

    #[test]
    fn test_reset_to_menu_before_first_guess_keeps_streak() {
        let mut session = session("crane");
        session.stats.record_win();
        type_word(&mut session, "tr");

        session.reset_to_menu();
        assert_eq!(session.stats().streak, 1);
        assert_eq!(session.current_col(), 0);
    }

    #[test]
    fn test_snapshot_hides_word_until_over() {
        let mut session = session("crane");
        assert_eq!(session.snapshot().hidden_word, None);

        session.surrender();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.hidden_word.as_deref(), Some("CRANE"));
        assert_eq!(snapshot.phase, SessionPhase::Surrendered);
        assert_eq!(snapshot.cells.len(), 6);
    }

    #[test]
    fn test_config_from_vars() {
        let config = SessionConfig::from_vars(Some("extended"), Some(" 99 ")).unwrap();
        assert_eq!(config.weights, WeightPreset::Extended);
        assert_eq!(config.seed, Some(99));

        assert_eq!(SessionConfig::from_vars(None, None).unwrap(), SessionConfig::default());
        assert_eq!(
            SessionConfig::from_vars(None, Some("abc")),
            Err(ConfigError::InvalidSeed("abc".to_string()))
        );
        assert!(SessionConfig::from_vars(Some("mythic"), None).is_err());
    }

    #[test]
    fn test_seeded_sessions_are_reproducible() {
        let config = SessionConfig {
            weights: WeightPreset::Extended,
            seed: Some(1234),
        };
        let mut a = GameSession::new(config);
        let mut b = GameSession::new(config);

        assert_eq!(a.board().hidden_word(), b.board().hidden_word());
        for _ in 0..10 {
            assert_eq!(a.trigger_event().map(|r| r.kind), b.trigger_event().map(|r| r.kind));
        }
    }
}
