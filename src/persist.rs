use crate::error::GameError;
use std::collections::HashMap;

/// String key/value storage the game saves into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError>;
    fn remove(&mut self, key: &str) -> Result<(), GameError>;
}

/// Store kept in memory; used natively and as the fallback when the browser
/// has no `localStorage`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError> {
        self.entries.insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), GameError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// The browser's `window.localStorage`.
pub struct LocalStorage {
    storage: web_sys::Storage,
}

fn js_err(e: wasm_bindgen::JsValue) -> GameError {
    GameError::Storage(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

impl LocalStorage {
    pub fn open() -> Result<LocalStorage, GameError> {
        let window = web_sys::window().ok_or_else(|| GameError::Storage("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(js_err)?
            .ok_or_else(|| GameError::Storage("localStorage disabled".into()))?;
        Ok(LocalStorage { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        self.storage.get_item(key).map_err(js_err)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError> {
        self.storage.set_item(key, value).map_err(js_err)
    }

    fn remove(&mut self, key: &str) -> Result<(), GameError> {
        self.storage.remove_item(key).map_err(js_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
