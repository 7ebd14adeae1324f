//! The authoritative session store and the handle components share
//!
//! A session is persisted as a fixed set of keys. Either every required key is
//! present or the store reports no session; a partially written key set is
//! treated as absent.

use mentorlink_core::{AccountStatus, Session};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;
use crate::{unpoison, SessionError, SessionResult};

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_NAME_KEY: &str = "userName";
pub const USER_ID_KEY: &str = "userId";
pub const USER_ROLE_KEY: &str = "userRole";
pub const USER_STATUS_KEY: &str = "userStatus";

const REQUIRED_KEYS: [&str; 4] = [AUTH_TOKEN_KEY, USER_NAME_KEY, USER_ID_KEY, USER_ROLE_KEY];
const ALL_KEYS: [&str; 5] = [
    AUTH_TOKEN_KEY,
    USER_NAME_KEY,
    USER_ID_KEY,
    USER_ROLE_KEY,
    USER_STATUS_KEY,
];

/// Persisted session plus an in-memory snapshot of it
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open the store and load whatever session survived the last run
    pub fn open(backend: Arc<dyn KeyValueStore>) -> SessionResult<Self> {
        let current = Self::load(backend.as_ref())?;
        match &current {
            Some(session) => debug!(user_id = %session.user_id, "Restored session"),
            None => debug!("No stored session"),
        }

        Ok(Self {
            backend,
            current: RwLock::new(current),
        })
    }

    fn load(backend: &dyn KeyValueStore) -> SessionResult<Option<Session>> {
        let values = backend.get_many(&ALL_KEYS)?;
        let present = values[..REQUIRED_KEYS.len()]
            .iter()
            .filter(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
            .count();

        if present == 0 {
            return Ok(None);
        }
        if present < REQUIRED_KEYS.len() {
            warn!(present, "Stored session is incomplete, treating as signed out");
            return Ok(None);
        }

        let [token, name, user_id, role, status] = <[Option<String>; 5]>::try_from(values)
            .map_err(|_| SessionError::storage("Unexpected number of stored values"))?;

        let session = Session::new(
            token.unwrap_or_default(),
            user_id.unwrap_or_default(),
            name.unwrap_or_default(),
            role.as_deref().unwrap_or_default().into(),
        );

        match session {
            Ok(session) => {
                let status = status.and_then(|s| s.parse::<AccountStatus>().ok());
                Ok(Some(session.with_status(status)))
            }
            Err(e) => {
                warn!(error = %e, "Stored session is invalid, treating as signed out");
                Ok(None)
            }
        }
    }

    /// Snapshot of the current session
    pub fn read(&self) -> Option<Session> {
        unpoison(self.current.read()).clone()
    }

    /// Persist a complete session, replacing any previous one
    pub(crate) fn write(&self, session: &Session) -> SessionResult<()> {
        session.validate()?;

        let mut current = unpoison(self.current.write());
        let mut set = vec![
            (AUTH_TOKEN_KEY, session.token.as_str()),
            (USER_NAME_KEY, session.display_name.as_str()),
            (USER_ID_KEY, session.user_id.as_str()),
            (USER_ROLE_KEY, session.role.as_str()),
        ];
        let mut remove = Vec::new();
        match session.status {
            Some(status) => set.push((USER_STATUS_KEY, status.as_str())),
            None => remove.push(USER_STATUS_KEY),
        }

        self.backend.apply(&set, &remove)?;

        *current = Some(session.clone());
        info!(user_id = %session.user_id, role = %session.role, "Session stored");
        Ok(())
    }

    /// Remove every session key. Other keys, such as dismissals, are kept.
    pub(crate) fn clear(&self) -> SessionResult<()> {
        let mut current = unpoison(self.current.write());
        self.backend.remove_many(&ALL_KEYS)?;
        *current = None;
        info!("Session cleared");
        Ok(())
    }

    /// Clear only while `token` is still the stored one; returns whether it did
    pub(crate) fn clear_if_token(&self, token: &str) -> SessionResult<bool> {
        let mut current = unpoison(self.current.write());
        if current.as_ref().map(|session| session.token.as_str()) != Some(token) {
            return Ok(false);
        }
        self.backend.remove_many(&ALL_KEYS)?;
        *current = None;
        info!("Session cleared");
        Ok(true)
    }
}

/// Shared handle to the session, passed to every component that needs it
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<SessionStore>,
    backend: Arc<dyn KeyValueStore>,
}

impl SessionContext {
    pub fn open(backend: Arc<dyn KeyValueStore>) -> SessionResult<Self> {
        let store = SessionStore::open(Arc::clone(&backend))?;
        Ok(Self {
            store: Arc::new(store),
            backend,
        })
    }

    pub fn read(&self) -> Option<Session> {
        self.store.read()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.read().map(|session| session.token)
    }

    /// Storage shared with other device-local state
    pub fn backend(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.backend)
    }

    pub(crate) fn write(&self, session: &Session) -> SessionResult<()> {
        self.store.write(session)
    }

    /// Sign out: every session key is removed
    pub fn logout(&self) -> SessionResult<()> {
        self.store.clear()
    }

    /// Drop a session the server has rejected.
    ///
    /// Only the session that issued the rejected request is cleared; if the
    /// user has since signed in again, `rejected_token` no longer matches and
    /// the current session is left alone. Returns whether the rejected session
    /// was the current one.
    pub(crate) fn invalidate(&self, component: &str, rejected_token: &str) -> bool {
        match self.store.clear_if_token(rejected_token) {
            Ok(true) => {
                warn!(component, "Server rejected the session token, signed out");
                true
            }
            Ok(false) => {
                debug!(component, "Ignoring rejection of a session that is no longer current");
                false
            }
            Err(e) => {
                warn!(component, error = %e, "Failed to clear rejected session");
                true
            }
        }
    }
}
