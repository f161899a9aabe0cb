use crate::state::PipelineState;
use recap_common::{Record, SessionId};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    #[serde(other)]
    Other,
}

/// Browser-side events that may end a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    TabRemoved(SessionId),
    /// Only a navigation start (`Loading`) ends the session.
    TabUpdated { session: SessionId, status: TabStatus },
    ExitCapture(SessionId),
}

/// A point-in-time copy of a session's sanitized records, in first-seen
/// order. Iterating it never touches the live store, and it can be iterated
/// any number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    records: Vec<Record>,
}

impl SessionSnapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.records.iter().map(Record::to_value).collect())
    }
}

impl IntoIterator for SessionSnapshot {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a SessionSnapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleManager {
    state: Arc<PipelineState>,
}

impl LifecycleManager {
    pub fn new(state: Arc<PipelineState>) -> Self {
        Self { state }
    }

    /// Forgets every record and redaction decision of `session`. Ending a
    /// session that does not exist is a no-op; the return value says whether
    /// anything was removed.
    pub fn end_session(&self, session: &SessionId) -> bool {
        let removed = self.state.remove(session);
        if removed {
            info!(%session, "Session ended");
        } else {
            debug!(%session, "Session already ended");
        }
        removed
    }

    /// Applies a browser signal. Returns whether a session was ended.
    pub fn handle(&self, signal: &SessionSignal) -> bool {
        match signal {
            SessionSignal::TabRemoved(session) | SessionSignal::ExitCapture(session) => {
                self.end_session(session)
            }
            SessionSignal::TabUpdated {
                session,
                status: TabStatus::Loading,
            } => self.end_session(session),
            SessionSignal::TabUpdated { .. } => false,
        }
    }

    /// Snapshot of `session`; empty when the session is unknown.
    pub fn get(&self, session: &SessionId) -> SessionSnapshot {
        self.state
            .with_existing(session, |store| SessionSnapshot {
                records: store.records().cloned().collect(),
            })
            .unwrap_or_default()
    }

    pub fn sessions(&self) -> Vec<SessionId> {
        self.state.sessions()
    }

    pub fn record_count(&self, session: &SessionId) -> usize {
        self.state.with_existing(session, |store| store.len()).unwrap_or(0)
    }

    pub fn export(&self, session: &SessionId) -> Value {
        self.get(session).to_value()
    }
}
