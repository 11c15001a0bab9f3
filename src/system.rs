use crate::{
    config::GameConfig,
    game::Game,
    logger,
    persist::{KeyValueStore, LocalStorage, MemoryStore},
};
use log::warn;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn now() -> f64 {
    js_sys::Date::now()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!("serialize failed: {}", e);
        "null".into()
    })
}

/// Browser entry point: one game session saved to `localStorage`.
#[wasm_bindgen]
pub struct TerminalQuest {
    game: Game,
    store: Box<dyn KeyValueStore>,
}

impl Default for TerminalQuest {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TerminalQuest {
    fn persist(&mut self) {
        if let Err(e) = self.game.save(self.store.as_mut()) {
            warn!("save failed: {}", e);
        }
    }
}

#[wasm_bindgen]
impl TerminalQuest {
    /// `config` is an optional JSON `GameConfig`; missing fields use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> TerminalQuest {
        let config = match config.as_deref().map(GameConfig::from_json) {
            Some(Ok(cfg)) => cfg,
            Some(Err(e)) => {
                warn!("bad config, using defaults: {}", e);
                GameConfig::default()
            }
            None => GameConfig::default(),
        };
        let store: Box<dyn KeyValueStore> = match LocalStorage::open() {
            Ok(s) => Box::new(s),
            Err(e) => {
                warn!("{}; progress will not survive a reload", e);
                Box::new(MemoryStore::default())
            }
        };
        let mut game = Game::new(config, now());
        if let Err(e) = game.load(store.as_ref(), now()) {
            warn!("ignoring saved game: {}", e);
        }
        TerminalQuest { game, store }
    }

    /// Run one input line; returns the `Turn` as JSON.
    #[wasm_bindgen]
    pub fn exec(&mut self, line: &str) -> String {
        let turn = self.game.submit(line, now());
        self.persist();
        to_json(&turn)
    }

    #[wasm_bindgen]
    pub fn prompt(&self) -> String {
        self.game.prompt()
    }

    #[wasm_bindgen]
    pub fn complete(&self, line: &str) -> String {
        to_json(&self.game.complete(line))
    }

    #[wasm_bindgen]
    pub fn hint(&mut self) -> Option<String> {
        let hint = self.game.reveal_hint();
        self.persist();
        hint
    }

    #[wasm_bindgen]
    pub fn restart_mission(&mut self) -> bool {
        match self.game.restart_mission(now()) {
            Ok(()) => {
                self.persist();
                true
            }
            Err(e) => {
                warn!("restart failed: {}", e);
                false
            }
        }
    }

    /// Load the next mission once the advance delay has passed.
    #[wasm_bindgen]
    pub fn advance_mission(&mut self) -> bool {
        match self.game.advance(now()) {
            Ok(advanced) => {
                self.persist();
                advanced
            }
            Err(e) => {
                warn!("advance failed: {}", e);
                false
            }
        }
    }

    #[wasm_bindgen]
    pub fn reset_account(&mut self) {
        if let Err(e) = self.game.reset_account(self.store.as_mut(), now()) {
            warn!("could not clear saved game: {}", e);
        }
    }

    #[wasm_bindgen]
    pub fn state_json(&self) -> String {
        to_json(self.game.state())
    }

    #[wasm_bindgen]
    pub fn mission_json(&self) -> String {
        to_json(&self.game.mission_view())
    }

    /// Full achievement list with locked/unlocked state, as JSON.
    #[wasm_bindgen]
    pub fn achievements_json(&self) -> String {
        to_json(&self.game.state().player.achievement_list())
    }

    #[wasm_bindgen]
    pub fn advance_delay_ms(&self) -> u32 {
        self.game.config().advance_delay_ms
    }
}

/// Send crate logs at `level` and above to the browser console.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    logger::init_logging(level);
}
