//! Session-keyed transcript store.
//!
//! Replaces ambient process-wide session state with an explicit mapping from
//! session identifier to transcript, with create/get/delete lifecycle. One
//! logical writer exists per session (the active user turn); a per-session
//! pending flag rejects overlapping reply generation instead of interleaving.

use std::collections::HashMap;
use std::sync::Mutex;

use cambium_core::types::{Role, Turn};
use chrono::Local;
use tracing::debug;
use uuid::Uuid;

use crate::error::ChatError;
use crate::transcript::Transcript;

struct Session {
    transcript: Transcript,
    /// True while a reply is being generated for this session.
    pending: bool,
    created_at: i64,
    last_message_at: i64,
}

/// Summary of one session for listings and diagnostics.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: i64,
    pub last_message_at: i64,
    pub turns: usize,
}

/// Process-wide store of session transcripts, keyed by session id.
pub struct SessionStore {
    greeting: String,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionStore {
    /// Create a store whose sessions are seeded with `greeting`.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create a new session seeded with the greeting; returns its id.
    pub fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.initialize_session(id);
        id
    }

    /// Ensure a session exists for `id` and return its transcript.
    ///
    /// Idempotent: an existing transcript is returned unchanged, never
    /// reseeded.
    pub fn initialize_session(&self, id: Uuid) -> Transcript {
        let mut sessions = self.lock();
        let now = Local::now().timestamp();
        let session = sessions.entry(id).or_insert_with(|| {
            debug!(session_id = %id, "Session created");
            Session {
                transcript: Transcript::new(self.greeting.clone()),
                pending: false,
                created_at: now,
                last_message_at: now,
            }
        });
        session.transcript.clone()
    }

    /// Snapshot of a session's transcript.
    pub fn transcript(&self, id: Uuid) -> Result<Transcript, ChatError> {
        let sessions = self.lock();
        sessions
            .get(&id)
            .map(|s| s.transcript.clone())
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Delete a session and its transcript.
    pub fn delete_session(&self, id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self.lock();
        sessions
            .remove(&id)
            .map(|_| debug!(session_id = %id, "Session deleted"))
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Summaries of all live sessions.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.lock();
        sessions
            .iter()
            .map(|(id, s)| SessionSummary {
                id: *id,
                created_at: s.created_at,
                last_message_at: s.last_message_at,
                turns: s.transcript.len(),
            })
            .collect()
    }

    /// Append a user turn to a session.
    ///
    /// Returns `Ok(true)` when a turn was appended. When the transcript
    /// already ends in a user turn (a previous reply failed), nothing is
    /// appended and `Ok(false)` is returned; the caller then retries
    /// generation for the still-pending turn. Rejects the submit while a
    /// reply is in flight.
    pub fn append_user(&self, id: Uuid, text: &str) -> Result<bool, ChatError> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;

        if session.pending {
            return Err(ChatError::ReplyPending(id));
        }
        if session.transcript.last_role() == Some(Role::User) {
            debug!(session_id = %id, "User turn already pending; treating submit as retry");
            return Ok(false);
        }

        let appended = session.transcript.submit_user_input(text);
        if appended {
            session.last_message_at = Local::now().timestamp();
        }
        Ok(appended)
    }

    /// Mark the session as generating and return a transcript snapshot,
    /// or `None` when no reply is owed (last turn is not from the user).
    pub fn begin_reply(&self, id: Uuid) -> Result<Option<Transcript>, ChatError> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;

        if session.pending {
            return Err(ChatError::ReplyPending(id));
        }
        if !session.transcript.needs_reply() {
            return Ok(None);
        }

        session.pending = true;
        Ok(Some(session.transcript.clone()))
    }

    /// Commit a generated reply: append exactly one assistant turn and clear
    /// the pending flag.
    pub fn finish_reply(&self, id: Uuid, content: String) -> Result<Turn, ChatError> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;
        session.pending = false;

        // The snapshot was taken under the same invariant; a violation here
        // means a second writer appeared for this session.
        if !session.transcript.needs_reply() {
            return Err(ChatError::Internal(format!(
                "transcript for session {} no longer ends in a user turn",
                id
            )));
        }

        session.transcript.push_assistant(content);
        session.last_message_at = Local::now().timestamp();
        Ok(session
            .transcript
            .last()
            .cloned()
            .expect("assistant turn just appended"))
    }

    /// Clear the pending flag without committing anything. The transcript
    /// keeps its trailing user turn so the next submit retries generation.
    pub fn abort_reply(&self, id: Uuid) {
        let mut sessions = self.lock();
        if let Some(session) = sessions.get_mut(&id) {
            session.pending = false;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Session>> {
        // A poisoned lock means a panic mid-mutation; propagate rather than
        // serve a corrupt transcript.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}
