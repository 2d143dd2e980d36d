//! Session persistence.
//!
//! The signed-in session (identity plus tokens) is stored in the platform's
//! native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager
//!
//! The access token itself is never written anywhere else.

use keyring::Entry;
use serde::{Deserialize, Serialize};
use solomail_oauth::Token;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "solomail";

/// Keyring entry key for the one persisted session.
const SESSION_KEY: &str = "solomail_session";

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to access the keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// The stored payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for session store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A signed-in account bound to the tenant authority it signed in against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Sign-in address.
    pub username: String,
    /// Tenant authority URL for silent refresh.
    pub authority: String,
}

/// The persisted session: who is signed in, and their current tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in identity.
    pub identity: AccountIdentity,
    /// Current access/refresh token pair.
    pub token: Token,
}

/// Storage for the one persisted session.
pub trait SessionStore {
    /// Loads the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load(&self) -> StoreResult<Option<Session>>;

    /// Persists the session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save(&self, session: &Session) -> StoreResult<()>;

    /// Removes the persisted session. Removing an absent session is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn clear(&self) -> StoreResult<()>;
}

/// Session store backed by the system keyring.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringStore;

impl KeyringStore {
    /// Creates a keyring-backed store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn entry() -> StoreResult<Entry> {
        Ok(Entry::new(SERVICE_NAME, SESSION_KEY)?)
    }
}

impl SessionStore for KeyringStore {
    fn load(&self) -> StoreResult<Option<Session>> {
        match Self::entry()?.get_password() {
            Ok(payload) => {
                let session: Session = serde_json::from_str(&payload)?;
                debug!(username = %session.identity.username, "Loaded persisted session");
                Ok(Some(session))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No persisted session");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        let payload = serde_json::to_string(session)?;
        Self::entry()?.set_password(&payload)?;
        debug!(username = %session.identity.username, "Persisted session");
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) => {
                debug!("Deleted persisted session");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No persisted session to delete");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete persisted session: {e}");
                Err(e.into())
            }
        }
    }
}

/// In-memory session store for tests and ephemeral runs.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Arc<Mutex<Option<Session>>>);

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding a session.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self(Arc::new(Mutex::new(Some(session))))
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> StoreResult<Option<Session>> {
        Ok(self.slot().clone())
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(username: &str) -> Session {
        Session {
            identity: AccountIdentity {
                username: username.to_string(),
                authority: "https://login.microsoftonline.com/consumers".to_string(),
            },
            token: Token::new("access", "Bearer").with_refresh_token("refresh"),
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&session("a@b.com")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.identity.username, "a@b.com");
        assert_eq!(loaded.token.refresh_token.as_deref(), Some("refresh"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.save(&session("a@b.com")).unwrap();
        assert!(other.load().unwrap().is_some());
    }

    #[test]
    fn session_serializes_with_tokens() {
        let payload = serde_json::to_string(&session("a@b.com")).unwrap();
        let restored: Session = serde_json::from_str(&payload).unwrap();
        assert_eq!(restored.identity.username, "a@b.com");
        assert_eq!(restored.token.access_token, "access");
    }

    // These interact with the real system keyring; run manually with
    // `cargo test -- --ignored`.

    #[test]
    #[ignore = "Interacts with system keyring"]
    fn keyring_store_round_trip() {
        let store = KeyringStore::new();
        store.save(&session("keyring-test@example.com")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.identity.username, "keyring-test@example.com");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    #[ignore = "Interacts with system keyring"]
    fn keyring_clear_tolerates_missing_entry() {
        let store = KeyringStore::new();
        store.clear().unwrap();
        store.clear().unwrap();
    }
}
