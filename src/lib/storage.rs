//! Session repository over browser-local key/value storage.
//!
//! Local storage is process-wide, last-write-wins and has no transactions. Routes
//! never touch it directly; they go through [`SessionStore`] so the verification
//! core can run against an in-memory store in tests. Values stored here are visible
//! to any script on the origin, so verification tokens are never persisted.

use super::errors::AppError;
#[cfg(test)]
use std::{cell::RefCell, collections::BTreeMap};

/// Storage keys and the code paths that own them.
pub mod keys {
    /// Signup writes it; the verification reconciler clears it. JSON `{email}`.
    pub const PENDING_VERIFICATION_SESSION: &str = "pending_verification_session";
    /// Plain-text twin of the pending session, kept for older tabs.
    pub const PENDING_VERIFICATION_EMAIL: &str = "pending_verification_email";
    /// Login writes the auth keys; the reconciler clears them before applying a
    /// freshly verified identity.
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    /// Legacy alias of `access_token`.
    pub const LEGACY_TOKEN: &str = "token";
    pub const USER_ROLE: &str = "user_role";
    pub const USER_ID: &str = "user_id";
    /// Reconciler writes it; the login screen consumes it once.
    pub const VERIFIED_EMAIL: &str = "verified_email";

    pub const AUTH_SESSION: [&str; 5] =
        [ACCESS_TOKEN, REFRESH_TOKEN, LEGACY_TOKEN, USER_ROLE, USER_ID];
    pub const PENDING: [&str; 2] = [PENDING_VERIFICATION_SESSION, PENDING_VERIFICATION_EMAIL];
}

/// Minimal get/set/remove contract over a string key/value store.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str);

    /// Removes every key in `keys`.
    fn clear_keys(&self, keys: &[&str]) {
        for key in keys {
            self.remove(key);
        }
    }

    /// Reads a value and removes it in the same call.
    fn take(&self, key: &str) -> Option<String> {
        let value = self.get(key);
        if value.is_some() {
            self.remove(key);
        }
        value
    }
}

/// In-memory store for host tests. `BrowserStore` does not fall back to it.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    writes: RefCell<usize>,
}

#[cfg(test)]
impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }

    /// Number of successful `set`/`remove` calls that changed the store.
    #[must_use]
    pub fn mutations(&self) -> usize {
        *self.writes.borrow()
    }
}

#[cfg(test)]
impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn remove(&self, key: &str) {
        if self.entries.borrow_mut().remove(key).is_some() {
            *self.writes.borrow_mut() += 1;
        }
    }
}

/// `window.localStorage` wrapper. Falls back to a no-op when storage is
/// unavailable (private mode, sandboxed iframes).
#[cfg(target_arch = "wasm32")]
pub struct BrowserStore {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl BrowserStore {
    pub fn local() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        if storage.is_none() {
            tracing::warn!("localStorage is unavailable; session markers will not persist");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| AppError::Storage("localStorage is unavailable.".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|_| AppError::Storage(format!("Failed to write {key}.")))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage.as_ref() {
            let _ = storage.remove_item(key);
        }
    }
}
