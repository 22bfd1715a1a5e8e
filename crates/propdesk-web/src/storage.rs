//! Browser `localStorage` session store

use propdesk_client::SessionStore;
use propdesk_core::{Error, Result, Session};
use tracing::warn;
use wasm_bindgen::JsValue;

/// Key the session is stored under
pub const SESSION_KEY: &str = "propdesk.session";

/// Session store backed by `window.localStorage`
///
/// The storage handle is looked up on every call so the store itself stays
/// `Send + Sync`.
#[derive(Debug, Clone)]
pub struct LocalStorageSessionStore {
    key: String,
}

impl Default for LocalStorageSessionStore {
    fn default() -> Self {
        Self::new(SESSION_KEY)
    }
}

impl LocalStorageSessionStore {
    /// Store using `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

fn storage() -> Result<web_sys::Storage> {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .ok_or_else(|| Error::Storage("localStorage is unavailable".to_string()))
}

fn js_error(err: &JsValue) -> Error {
    Error::Storage(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl SessionStore for LocalStorageSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let Some(raw) = storage()?.get_item(&self.key).map_err(|e| js_error(&e))? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Ignoring unreadable stored session");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        storage()?
            .set_item(&self.key, &raw)
            .map_err(|e| js_error(&e))
    }

    fn clear(&self) -> Result<()> {
        storage()?
            .remove_item(&self.key)
            .map_err(|e| js_error(&e))
    }
}
