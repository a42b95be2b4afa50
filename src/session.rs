//! Server side sessions.
//!
//! A [`Session`] is a shared handle: every clone sees the same key/value data
//! and validity flag. The [`SessionStore`] owns the id → session index for the
//! whole server and can persist it as JSON of the form
//! `{"<uuid>": {"valid": true, "data": {...}}}`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::http::Cookie;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "RESTWIRESESSID";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed session document: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionState {
    valid: bool,
    #[serde(default)]
    data: HashMap<String, Value>,
}

#[derive(Debug)]
struct SessionInner {
    id: Uuid,
    state: RwLock<SessionState>,
}

#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Creates a fresh, valid session with a random id.
    ///
    /// The session is not registered anywhere; use [`SessionStore::create`]
    /// for sessions that must survive across requests.
    pub fn new() -> Self {
        Self::restore(Uuid::new_v4(), SessionState { valid: true, data: HashMap::new() })
    }

    fn restore(id: Uuid, state: SessionState) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                state: RwLock::new(state),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(|s| s.data.get(key).cloned())
    }

    /// Reads a value into a typed form, `None` if absent or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.write(|s| {
            s.data.insert(key.into(), value.into());
        });
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.write(|s| s.data.remove(key))
    }

    pub fn keys(&self) -> Vec<String> {
        self.read(|s| s.data.keys().cloned().collect())
    }

    /// Marks the session invalid. It stays in the store but is no longer
    /// attached to requests or sent back to clients.
    pub fn invalidate(&self) {
        self.write(|s| s.valid = false);
    }

    pub fn is_valid(&self) -> bool {
        self.read(|s| s.valid)
    }

    pub fn to_cookie(&self) -> Cookie {
        Cookie::new(SESSION_COOKIE, self.inner.id.to_string())
    }

    /// Whether both handles refer to the same session.
    pub fn same_as(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let state = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of every session the server knows about.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a new valid session.
    pub fn create(&self) -> Session {
        let session = Session::new();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id(), session.clone());
        debug!(session = %session.id(), "session created");
        session
    }

    /// Looks a session up by id, valid or not.
    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Looks a session up from its textual id, as found in a cookie.
    pub fn get_str(&self, id: &str) -> Option<Session> {
        let id = Uuid::parse_str(id.trim()).ok()?;
        self.get(&id)
    }

    /// All sessions that are still valid.
    pub fn list_active(&self) -> Vec<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.is_valid())
            .cloned()
            .collect()
    }

    /// Registers sessions whose ids are not known yet. Existing ids win.
    ///
    /// Returns how many sessions were added.
    pub fn load_many(&self, sessions: impl IntoIterator<Item = Session>) -> usize {
        let mut index = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        for session in sessions {
            if let std::collections::hash_map::Entry::Vacant(slot) = index.entry(session.id()) {
                slot.insert(session);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the active sessions.
    pub fn serialize(&self) -> Result<String, SessionError> {
        let mut snapshot = HashMap::new();
        for session in self.list_active() {
            let value = session.read(|s| serde_json::to_value(s))?;
            snapshot.insert(session.id().to_string(), value);
        }
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Loads sessions from a document produced by [`SessionStore::serialize`].
    ///
    /// Entries with a malformed id or shape are skipped; ids already present
    /// in the store are left untouched. Returns how many sessions were added.
    pub fn deserialize_many(&self, document: &str) -> Result<usize, SessionError> {
        let entries: HashMap<String, Value> = serde_json::from_str(document)?;
        let sessions = entries.into_iter().filter_map(|(id, value)| {
            let Ok(uuid) = Uuid::parse_str(&id) else {
                warn!(id = %id, "skipping session with malformed id");
                return None;
            };
            match serde_json::from_value::<SessionState>(value) {
                Ok(state) => Some(Session::restore(uuid, state)),
                Err(e) => {
                    warn!(id = %id, error = %e, "skipping malformed session");
                    None
                }
            }
        });
        Ok(self.load_many(sessions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let other = session.clone();
        other.put("k", "v");
        assert_eq!(session.get("k"), Some(Value::from("v")));
        assert!(session.same_as(&other));
    }

    #[test]
    fn cookie_carries_the_id() {
        let session = Session::new();
        let cookie = session.to_cookie();
        assert_eq!(cookie.name, SESSION_COOKIE);
        assert_eq!(cookie.value, session.id().to_string());
    }
}
