use crate::store::SessionStore;
use recap_common::SessionId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

/// Live session stores shared by the ingestion façade and the lifecycle
/// manager. Each session has its own lock so sessions proceed in parallel.
#[derive(Debug, Default)]
pub struct PipelineState {
    sessions: RwLock<HashMap<SessionId, Mutex<SessionStore>>>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the store for `session`, creating it on first use.
    pub fn with_session<R>(&self, session: &SessionId, f: impl FnOnce(&mut SessionStore) -> R) -> R {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(store) = sessions.get(session) {
                return f(&mut lock(store));
            }
        }
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let store = sessions.entry(session.clone()).or_default();
        f(store.get_mut().unwrap_or_else(PoisonError::into_inner))
    }

    /// Runs `f` against the store for `session` if it exists.
    pub fn with_existing<R>(&self, session: &SessionId, f: impl FnOnce(&SessionStore) -> R) -> Option<R> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session).map(|store| f(&lock(store)))
    }

    /// Drops the session's store. Returns whether there was one.
    pub fn remove(&self, session: &SessionId) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session)
            .is_some()
    }

    pub fn sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

fn lock(store: &Mutex<SessionStore>) -> MutexGuard<'_, SessionStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
