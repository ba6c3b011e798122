//! Session-keyed conversation history.
//!
//! An in-memory, append-only log of turns per session. Sessions are created
//! lazily on first append and destroyed only by an explicit clear; there is
//! no expiry.
//!
//! Locking discipline: the outer map mutex is held only long enough to fetch
//! or create a session handle, and all turn mutation happens under that
//! session's own mutex. Appends for different sessions proceed in parallel;
//! appends for one session serialize; `clear` takes the map lock and then
//! waits out the session lock, so a clear racing an append always leaves the
//! session either fully cleared or cleared-then-one-new-exchange.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use deskbot_core::types::Turn;

use crate::error::ChatError;

struct SessionEntry {
    created_at: DateTime<Utc>,
    turns: Mutex<Vec<Turn>>,
}

/// Ordered, session-keyed log of conversation turns.
pub struct HistoryStore {
    sessions: Mutex<HashMap<String, Arc<SessionEntry>>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the handle for a session, creating it if absent.
    fn entry(&self, session_id: &str) -> Result<Arc<SessionEntry>, ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session map lock poisoned: {}", e)))?;
        Ok(Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(
            || {
                Arc::new(SessionEntry {
                    created_at: Utc::now(),
                    turns: Mutex::new(Vec::new()),
                })
            },
        )))
    }

    /// Fetch the handle for a session if it exists.
    fn get(&self, session_id: &str) -> Result<Option<Arc<SessionEntry>>, ChatError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session map lock poisoned: {}", e)))?;
        Ok(sessions.get(session_id).cloned())
    }

    /// Append one turn, creating the session if absent.
    pub fn append(&self, session_id: &str, turn: Turn) -> Result<(), ChatError> {
        let entry = self.entry(session_id)?;
        let mut turns = entry
            .turns
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        turns.push(turn);
        Ok(())
    }

    /// Append a user/assistant pair under one session lock, so the pair can
    /// never be split by a concurrent writer.
    pub fn append_exchange(
        &self,
        session_id: &str,
        user: Turn,
        assistant: Turn,
    ) -> Result<(), ChatError> {
        let entry = self.entry(session_id)?;
        let mut turns = entry
            .turns
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        turns.push(user);
        turns.push(assistant);
        Ok(())
    }

    /// Return the current turn sequence, empty if the session is unknown.
    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        match self.get(session_id)? {
            Some(entry) => {
                let turns = entry
                    .turns
                    .lock()
                    .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
                Ok(turns.clone())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Erase a session. Reports `SessionNotFound` if it was never seen or
    /// was already cleared.
    pub fn clear(&self, session_id: &str) -> Result<(), ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session map lock poisoned: {}", e)))?;
        match sessions.get(session_id) {
            Some(entry) => {
                // Wait out any in-flight append before dropping the log.
                let mut turns = entry
                    .turns
                    .lock()
                    .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
                turns.clear();
                drop(turns);
                sessions.remove(session_id);
                Ok(())
            }
            None => Err(ChatError::SessionNotFound(session_id.to_string())),
        }
    }

    /// Whether the session currently exists.
    pub fn contains(&self, session_id: &str) -> bool {
        self.get(session_id).map(|e| e.is_some()).unwrap_or(false)
    }

    /// Creation time of a session, if it exists.
    pub fn created_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.get(session_id).ok().flatten().map(|e| e.created_at)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}
