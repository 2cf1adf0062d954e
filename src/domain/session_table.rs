//! Live duel storage with per-session locking.
//!
//! [`SessionTable`] stores every live duel in a `HashMap` where each entry
//! is individually protected by a [`tokio::sync::Mutex`]. Transitions of one
//! duel are serialized; different duels progress independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::duel_session::{DuelSession, SessionSummary};
use super::SessionId;
use crate::error::DuelError;

/// Shared handle to one duel.
pub type SessionHandle = Arc<Mutex<DuelSession>>;

/// Central store for all live duels.
///
/// # Concurrency
///
/// - The outer `RwLock` is only held long enough to clone or remove an
///   entry; it is never held while waiting on a session mutex.
/// - Callers may take the outer lock while holding a session mutex (for
///   example to remove the session they are finishing).
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new duel and returns its shared handle.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::Internal`] if a duel with the same id is already
    /// live (should never happen with UUID v4).
    pub async fn insert(&self, session: DuelSession) -> Result<SessionHandle, DuelError> {
        let session_id = session.session_id;
        let mut map = self.sessions.write().await;
        if map.contains_key(&session_id) {
            return Err(DuelError::Internal(format!(
                "session {session_id} already exists"
            )));
        }
        let handle = Arc::new(Mutex::new(session));
        map.insert(session_id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Returns the shared handle of a live duel.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::SessionNotFound`] if the duel is not live.
    pub async fn get(&self, session_id: SessionId) -> Result<SessionHandle, DuelError> {
        let map = self.sessions.read().await;
        map.get(&session_id)
            .cloned()
            .ok_or(DuelError::SessionNotFound(session_id))
    }

    /// Removes a duel. Returns `false` if it was not live.
    pub async fn remove(&self, session_id: SessionId) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }

    /// Returns `true` if the duel is live.
    pub async fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }

    /// Handles of every live duel.
    pub async fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Summaries of every live duel.
    ///
    /// Duels that are mid-transition are waited for, so call this only from
    /// tasks that hold no session lock.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let handles = self.handles().await;
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }
        summaries
    }

    /// Number of live duels.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no duel is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
