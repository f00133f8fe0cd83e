//! WebAssembly bindings for the Gachaword engine.
//!
//! This module exposes a game session to JavaScript through wasm-bindgen.
//! Session events are buffered and handed over as JSON by `drainEvents`.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::{EventLog, Input};
#[cfg(feature = "wasm")]
use crate::gacha::{WeightPreset, DEFAULT_REEL_LENGTH};
#[cfg(feature = "wasm")]
use crate::session::{GameSession, SessionConfig};
#[cfg(feature = "wasm")]
use crate::words::Dictionary;
#[cfg(feature = "wasm")]
use std::sync::Arc;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed session wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmSession {
    session: GameSession<EventLog>,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmSession {
    /// Create a session. `weights` is "classic" or "extended".
    #[wasm_bindgen(constructor)]
    pub fn new(weights: Option<String>, seed: Option<u32>) -> Result<WasmSession, JsValue> {
        let weights = match weights {
            Some(name) => name
                .parse::<WeightPreset>()
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => WeightPreset::default(),
        };
        let config = SessionConfig {
            weights,
            seed: seed.map(u64::from),
        };

        Ok(WasmSession {
            session: GameSession::with_presenter(
                config,
                Arc::new(Dictionary::standard()),
                EventLog::new(),
            ),
        })
    }

    /// Apply an input from JSON, returns the outcome as JSON
    #[wasm_bindgen(js_name = handleInput)]
    pub fn handle_input(&mut self, input_json: &str) -> Result<String, JsValue> {
        let input: Input = serde_json::from_str(input_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid input JSON: {}", e)))?;

        let outcome = self.session.handle_input(input);
        Ok(serde_json::to_string(&outcome).unwrap_or_else(|_| "\"Ignored\"".to_string()))
    }

    /// Apply a key name ("a".."z", "enter", "backspace"); other keys are ignored
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&mut self, key: &str) -> String {
        let outcome = match Input::from_key(&key.to_ascii_lowercase()) {
            Some(input) => self.session.handle_input(input),
            None => crate::actions::InputOutcome::Ignored,
        };
        serde_json::to_string(&outcome).unwrap_or_else(|_| "\"Ignored\"".to_string())
    }

    /// Roll the gacha, returns the roll JSON or null when no game is running
    #[wasm_bindgen(js_name = triggerEvent)]
    pub fn trigger_event(&mut self) -> String {
        match self.session.trigger_event() {
            Some(roll) => serde_json::to_string(&roll).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Roll through an animation strip; returns `{reel, stop, roll}` or null
    pub fn spin(&mut self) -> String {
        match self.session.spin(DEFAULT_REEL_LENGTH) {
            Some(spin) => serde_json::to_string(&spin).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    pub fn surrender(&mut self) -> bool {
        self.session.surrender()
    }

    pub fn restart(&mut self) -> bool {
        self.session.restart()
    }

    #[wasm_bindgen(js_name = resetToMenu)]
    pub fn reset_to_menu(&mut self) {
        self.session.reset_to_menu();
    }

    #[wasm_bindgen(js_name = enterGame)]
    pub fn enter_game(&mut self) -> bool {
        self.session.enter_game()
    }

    /// Get the session snapshot as JSON (for rendering)
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.session.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Take buffered session events as a JSON array
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        let events = self.session.presenter_mut().drain();
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }
}
