//! Per-connection game session hosting.

use gachaword_core::{
    Dictionary, GameSession, Input, Presenter, SessionConfig, SessionEvent, DEFAULT_REEL_LENGTH,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::{ClientMessage, ServerMessage};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("No game in progress")]
    NotInProgress,

    #[error("Game still in progress")]
    GameInProgress,

    #[error("Not on the menu")]
    NotOnMenu,
}

/// Forwards session events to the player's outgoing channel
pub struct ChannelPresenter {
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl ChannelPresenter {
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { sender }
    }
}

impl Presenter for ChannelPresenter {
    fn present(&mut self, event: &SessionEvent) {
        // A closed channel means the player is gone; cleanup happens on disconnect
        let _ = self.sender.send(ServerMessage::Event {
            event: event.clone(),
        });
    }
}

/// One connected player and their game
pub struct PlayerSession {
    pub id: Uuid,
    session: GameSession<ChannelPresenter>,
}

impl PlayerSession {
    pub fn new(
        id: Uuid,
        config: SessionConfig,
        dictionary: Arc<Dictionary>,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self {
            id,
            session: GameSession::with_presenter(config, dictionary, ChannelPresenter::new(sender)),
        }
    }

    pub fn session(&self) -> &GameSession<ChannelPresenter> {
        &self.session
    }

    /// Apply a client message. Returns the direct reply, if any.
    ///
    /// Session events go out through the presenter as they happen.
    pub fn apply(&mut self, msg: ClientMessage) -> Result<Option<ServerMessage>, HostError> {
        match msg {
            ClientMessage::Input { input } => {
                let outcome = self.session.handle_input(input);
                Ok(Some(ServerMessage::InputResult { outcome }))
            }

            ClientMessage::TriggerEvent => {
                if !self.session.is_in_progress() {
                    return Err(HostError::NotInProgress);
                }
                let outcome = self.session.handle_input(Input::TriggerEvent);
                Ok(Some(ServerMessage::InputResult { outcome }))
            }

            ClientMessage::Spin => self
                .session
                .spin(DEFAULT_REEL_LENGTH)
                .map(|spin| Some(ServerMessage::Spin { spin }))
                .ok_or(HostError::NotInProgress),

            ClientMessage::Surrender => {
                if !self.session.surrender() {
                    return Err(HostError::NotInProgress);
                }
                Ok(None)
            }

            ClientMessage::Restart => {
                if !self.session.restart() {
                    return Err(HostError::GameInProgress);
                }
                Ok(None)
            }

            ClientMessage::ResetToMenu => {
                self.session.reset_to_menu();
                Ok(None)
            }

            ClientMessage::EnterGame => {
                if !self.session.enter_game() {
                    return Err(HostError::NotOnMenu);
                }
                Ok(None)
            }

            ClientMessage::GetState => Ok(Some(ServerMessage::State {
                state: self.session.snapshot(),
            })),

            ClientMessage::Ping => Ok(Some(ServerMessage::Pong)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gachaword_core::{InputOutcome, SessionPhase, WeightPreset};
    use pretty_assertions::assert_eq;

    fn player() -> (PlayerSession, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = SessionConfig {
            weights: WeightPreset::Classic,
            seed: Some(42),
        };
        let dictionary = Arc::new(Dictionary::standard());
        let player = PlayerSession::new(Uuid::new_v4(), config, dictionary, tx);
        (player, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    #[test]
    fn test_new_session_announces_game() {
        let (_player, mut rx) = player();
        let messages = drain(&mut rx);

        assert_eq!(
            messages,
            vec![ServerMessage::Event {
                event: SessionEvent::GameStarted {
                    word_length: 5,
                    num_rows: 6
                }
            }]
        );
    }

    #[test]
    fn test_input_replies_with_outcome() {
        let (mut player, mut rx) = player();
        drain(&mut rx);

        let reply = player.apply(ClientMessage::Input {
            input: Input::Letter('q'),
        });
        assert_eq!(
            reply,
            Ok(Some(ServerMessage::InputResult {
                outcome: InputOutcome::Ok
            }))
        );
        assert_eq!(drain(&mut rx).len(), 1, "LetterWritten event");

        let reply = player.apply(ClientMessage::Input { input: Input::Enter });
        assert_eq!(
            reply,
            Ok(Some(ServerMessage::InputResult {
                outcome: InputOutcome::Incomplete
            }))
        );
    }

    #[test]
    fn test_restart_requires_finished_game() {
        let (mut player, _rx) = player();

        assert_eq!(player.apply(ClientMessage::Restart), Err(HostError::GameInProgress));
        assert_eq!(player.apply(ClientMessage::Surrender), Ok(None));
        assert_eq!(player.session().phase(), SessionPhase::Surrendered);

        assert_eq!(player.apply(ClientMessage::Surrender), Err(HostError::NotInProgress));
        assert_eq!(
            player.apply(ClientMessage::TriggerEvent),
            Err(HostError::NotInProgress)
        );
        assert_eq!(player.apply(ClientMessage::Restart), Ok(None));
        assert_eq!(player.session().phase(), SessionPhase::InProgress);
    }

    #[test]
    fn test_menu_round_trip() {
        let (mut player, _rx) = player();

        assert_eq!(player.apply(ClientMessage::EnterGame), Err(HostError::NotOnMenu));
        assert_eq!(player.apply(ClientMessage::ResetToMenu), Ok(None));
        assert_eq!(player.session().phase(), SessionPhase::Menu);
        assert_eq!(player.apply(ClientMessage::EnterGame), Ok(None));
        assert_eq!(player.session().phase(), SessionPhase::InProgress);
    }

    #[test]
    fn test_trigger_event_reports_roll() {
        let (mut player, mut rx) = player();
        drain(&mut rx);

        let reply = player.apply(ClientMessage::TriggerEvent).unwrap();
        assert!(matches!(reply, Some(ServerMessage::InputResult { .. })));
        assert!(drain(&mut rx).iter().any(|m| matches!(
            m,
            ServerMessage::Event {
                event: SessionEvent::GachaRolled { .. }
            }
        )));
    }

    #[test]
    fn test_spin_reply_matches_rolled_event() {
        let (mut player, mut rx) = player();
        drain(&mut rx);

        let spin = match player.apply(ClientMessage::Spin) {
            Ok(Some(ServerMessage::Spin { spin })) => spin,
            other => panic!("Expected Spin, got {:?}", other),
        };
        assert_eq!(spin.reel.len(), DEFAULT_REEL_LENGTH);
        assert_eq!(spin.reel[spin.stop], spin.roll.kind);
        assert!(drain(&mut rx).contains(&ServerMessage::Event {
            event: SessionEvent::GachaRolled { roll: spin.roll }
        }));

        player.apply(ClientMessage::Surrender).unwrap();
        assert_eq!(player.apply(ClientMessage::Spin), Err(HostError::NotInProgress));
    }

    #[test]
    fn test_get_state_hides_word() {
        let (mut player, _rx) = player();

        match player.apply(ClientMessage::GetState) {
            Ok(Some(ServerMessage::State { state })) => {
                assert_eq!(state.phase, SessionPhase::InProgress);
                assert_eq!(state.hidden_word, None);
            }
            other => panic!("Expected State, got {:?}", other),
        }
        assert_eq!(player.apply(ClientMessage::Ping), Ok(Some(ServerMessage::Pong)));
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (mut player, rx) = player();
        drop(rx);

        assert!(player.apply(ClientMessage::Surrender).is_ok());
    }
}
