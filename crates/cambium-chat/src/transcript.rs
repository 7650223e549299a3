//! Session transcript: an append-only, ordered sequence of turns.

use cambium_core::types::{Role, Turn};
use serde::{Deserialize, Serialize};

/// The ordered conversation history of one session.
///
/// Created with exactly one seed assistant greeting. Turns are only ever
/// appended, never reordered or pruned. The last turn's role decides whether
/// a reply must be generated: generation occurs iff it is `User`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create a transcript seeded with one assistant greeting.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    /// Append a user turn. No-op when `text` is empty or whitespace-only;
    /// returns whether a turn was appended.
    pub fn submit_user_input(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.turns.push(Turn::user(text));
        true
    }

    /// Append an assistant turn. The caller must have verified that the
    /// transcript ends in a user turn; this is enforced by the store.
    pub(crate) fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// True when the last turn is from the user, i.e. a reply is owed.
    pub fn needs_reply(&self) -> bool {
        matches!(self.last_role(), Some(Role::User))
    }

    /// Role of the most recent turn.
    pub fn last_role(&self) -> Option<Role> {
        self.turns.last().map(|t| t.role)
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Content of the most recent user turn, if the transcript ends in one.
    pub fn pending_question(&self) -> Option<&str> {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => Some(&turn.content),
            _ => None,
        }
    }

    /// Lazy chronological view over the transcript for display. Pure read.
    pub fn render(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        self.turns.iter().map(|t| (t.role, t.content.as_str()))
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
