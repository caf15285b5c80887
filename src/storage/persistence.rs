//! Persistence adapter owning the stored session record layout.
//!
//! Durable scope holds the token, the serialized profile, and a plain copy of
//! the user id so identity checks can skip JSON parsing. Tab scope holds the
//! relay copy of the profile written during provider callbacks. Reads treat
//! malformed JSON as absent; writes are synchronous.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{BrowserStorage, StorageBackend};
use crate::config::StorageKeys;
use crate::identity::CanonicalIdentity;

/// Which browser storage scope a value lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Survives reloads, shared by every tab of the origin.
    Durable,
    /// Visible only to the current tab.
    Tab,
}

#[derive(Clone)]
pub struct Persistence {
    durable: Rc<dyn StorageBackend>,
    tab: Rc<dyn StorageBackend>,
    keys: StorageKeys,
}

impl Persistence {
    pub fn new(durable: Rc<dyn StorageBackend>, tab: Rc<dyn StorageBackend>, keys: StorageKeys) -> Self {
        Self { durable, tab, keys }
    }

    /// Adapter over `localStorage` + `sessionStorage`.
    pub fn browser(keys: StorageKeys) -> Self {
        Self::new(Rc::new(BrowserStorage::Local), Rc::new(BrowserStorage::Session), keys)
    }

    fn backend(&self, scope: Scope) -> &dyn StorageBackend {
        match scope {
            Scope::Durable => self.durable.as_ref(),
            Scope::Tab => self.tab.as_ref(),
        }
    }

    pub fn get(&self, scope: Scope, key: &str) -> Option<String> {
        self.backend(scope).get_item(key)
    }

    pub fn set(&self, scope: Scope, key: &str, value: &str) {
        self.backend(scope).set_item(key, value);
    }

    pub fn remove(&self, scope: Scope, key: &str) {
        self.backend(scope).remove_item(key);
    }

    /// Load a JSON value; unparseable data reads as `None`.
    pub fn load_json<T: DeserializeOwned>(&self, scope: Scope, key: &str) -> Option<T> {
        let raw = self.get(scope, key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("ignoring malformed {scope:?} value at {key}: {e}");
                None
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, scope: Scope, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(scope, key, &raw),
            Err(e) => log::warn!("failed to serialize {scope:?} value for {key}: {e}"),
        }
    }

    // =========================================================================
    // SESSION RECORD
    // =========================================================================

    /// Stored bearer token; blank values count as absent.
    pub fn token(&self) -> Option<String> {
        self.get(Scope::Durable, &self.keys.token).filter(|t| !t.trim().is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.set(Scope::Durable, &self.keys.token, token);
    }

    pub fn profile(&self) -> Option<CanonicalIdentity> {
        self.load_json(Scope::Durable, &self.keys.profile)
    }

    pub fn user_id(&self) -> Option<String> {
        self.get(Scope::Durable, &self.keys.user_id).filter(|id| !id.is_empty())
    }

    /// Write the profile and its plain user-id copy.
    pub fn set_profile(&self, profile: &CanonicalIdentity) {
        self.save_json(Scope::Durable, &self.keys.profile, profile);
        if profile.is_identified() {
            self.set(Scope::Durable, &self.keys.user_id, &profile.user_id);
        } else {
            self.remove(Scope::Durable, &self.keys.user_id);
        }
    }

    pub fn clear_profile(&self) {
        self.remove(Scope::Durable, &self.keys.profile);
        self.remove(Scope::Durable, &self.keys.user_id);
    }

    pub fn relay_profile(&self) -> Option<CanonicalIdentity> {
        self.load_json(Scope::Tab, &self.keys.relay_profile)
    }

    pub fn set_relay_profile(&self, profile: &CanonicalIdentity) {
        self.save_json(Scope::Tab, &self.keys.relay_profile, profile);
    }

    pub fn clear_relay_profile(&self) {
        self.remove(Scope::Tab, &self.keys.relay_profile);
    }

    /// Best identity available at startup: durable profile, then the tab
    /// relay, then the bare user id.
    pub fn restore_profile(&self) -> CanonicalIdentity {
        self.profile()
            .filter(CanonicalIdentity::is_identified)
            .or_else(|| self.relay_profile().filter(CanonicalIdentity::is_identified))
            .or_else(|| self.user_id().map(|id| CanonicalIdentity::with_user_id(&id)))
            .unwrap_or_default()
    }

    /// Remove every trace of the session from both scopes.
    pub fn clear_session(&self) {
        self.remove(Scope::Durable, &self.keys.token);
        self.clear_profile();
        self.clear_relay_profile();
    }
}
