//! WebSocket protocol messages for Gachaword.

use gachaword_core::{GachaSpin, Input, InputOutcome, SessionEvent, SessionSnapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Type a letter, delete, submit or roll
    Input { input: Input },

    /// Roll the gacha
    TriggerEvent,

    /// Roll the gacha through an animation strip
    Spin,

    /// Give up the current game
    Surrender,

    /// Start a new game once the previous one ended
    Restart,

    /// Go back to the menu
    ResetToMenu,

    /// Leave the menu and play
    EnterGame,

    /// Request a full snapshot
    GetState,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Result of an `Input` or `TriggerEvent`
    InputResult { outcome: InputOutcome },

    /// Strip to animate; `reel[stop]` is the applied event
    Spin { spin: GachaSpin },

    /// Something happened in the session
    Event { event: SessionEvent },

    /// Full session snapshot
    State { state: SessionSnapshot },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
