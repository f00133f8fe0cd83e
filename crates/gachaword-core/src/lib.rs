//! Gachaword - a word-guessing game engine with gacha events
//!
//! This crate provides the core game logic for Gachaword, including:
//! - The letter grid with per-cell lock states and hint reveals
//! - Guess evaluation against the hidden word
//! - Weighted random "gacha" events that bless or curse the board
//! - The session state machine with streak and win bookkeeping
//!
//! # Architecture
//!
//! The engine has no UI. A presentation layer drives a [`GameSession`] with
//! [`Input`]s and receives [`SessionEvent`]s through the [`Presenter`] it
//! injects. It can be compiled to:
//! - Native Rust for the WebSocket server
//! - WebAssembly for a browser front end
//!
//! # Modules
//!
//! - [`words`]: Dictionary and hidden-word selection
//! - [`board`]: Grid, lock states and row evaluation
//! - [`gacha`]: Event kinds, weight tables and the event engine
//! - [`stats`]: Streak counters and keyboard letter states
//! - [`actions`]: Inputs, outcomes and session events
//! - [`session`]: Game session state machine

pub mod actions;
pub mod board;
pub mod gacha;
pub mod session;
pub mod stats;
#[cfg(feature = "wasm")]
pub mod wasm;
pub mod words;

// Re-export commonly used types
pub use actions::{
    EventLog, GameEnding, Input, InputOutcome, NullPresenter, Presenter, RejectReason,
    SessionEvent,
};
pub use board::{Board, Cell, LetterFeedback, LockState, RowEvaluation, NUM_TRIES};
pub use gacha::{
    ConfigError, EventCategory, EventEffect, EventKind, EventOutcome, GachaEngine, GachaRoll,
    GachaSpin, NoOpReason, WeightError, WeightPreset, WeightTable, DEFAULT_REEL_LENGTH,
    MAX_REEL_STOP, MIN_REEL_STOP,
};
pub use session::{GameSession, SessionConfig, SessionPhase, SessionSnapshot};
pub use stats::{KeyboardState, Stats};
pub use words::{Dictionary, DictionaryError, WORD_LENGTH};
