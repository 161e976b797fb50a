//! `localStorage` backend

use crate::error::{PlaybackError, Result};
use crate::storage::KeyValueStore;
use wasm_bindgen::JsValue;
use web_sys::Storage;

#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// The window's `localStorage`
    ///
    /// Fails in workers and when storage is disabled (some private modes).
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| PlaybackError::storage("no window"))?;
        let storage = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| PlaybackError::storage("localStorage unavailable"))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

fn js_error(e: JsValue) -> PlaybackError {
    PlaybackError::storage(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}
