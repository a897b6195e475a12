//! Per-session conversation memories.
//!
//! Replaces a single process-wide buffer: each session key gets its own
//! [`ConversationMemory`], created lazily with the configured window.

use std::collections::HashMap;

use tracing::debug;

use super::memory::ConversationMemory;

/// In-memory map of session key → conversation memory.
#[derive(Debug)]
pub struct SessionStore {
    window: usize,
    sessions: HashMap<String, ConversationMemory>,
}

impl SessionStore {
    /// Create a store whose memories retain at most `window` turns each.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sessions: HashMap::new(),
        }
    }

    /// Get the memory for `key`, creating an empty one if needed.
    pub fn memory_mut(&mut self, key: &str) -> &mut ConversationMemory {
        let window = self.window;
        self.sessions.entry(key.to_string()).or_insert_with(|| {
            debug!(session_key = key, window, "new conversation session");
            ConversationMemory::new(window)
        })
    }

    /// Clear all turns in a session (reset conversation).
    pub fn clear(&mut self, key: &str) {
        if let Some(memory) = self.sessions.get_mut(key) {
            memory.clear();
            debug!(session_key = key, "conversation session cleared");
        }
    }

    /// Number of known sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SnapshotBound;
    use crate::types::ConversationTurn;

    #[test]
    fn test_memory_created_lazily() {
        let mut store = SessionStore::new(4);
        assert!(store.is_empty());

        let memory = store.memory_mut("discord:1");
        assert!(memory.is_empty());
        assert_eq!(memory.capacity(), 4);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut store = SessionStore::new(10);
        store
            .memory_mut("discord:a")
            .append(ConversationTurn::user("hello from a"));
        store
            .memory_mut("discord:b")
            .append(ConversationTurn::user("hello from b"));

        let a: Vec<_> = store
            .memory_mut("discord:a")
            .snapshot(SnapshotBound::Turns(10))
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(a, vec!["hello from a"]);
        assert_eq!(store.memory_mut("discord:b").len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear_only_touches_one_session() {
        let mut store = SessionStore::new(10);
        store.memory_mut("x").append(ConversationTurn::user("1"));
        store.memory_mut("y").append(ConversationTurn::user("2"));

        store.clear("x");
        store.clear("missing");

        assert_eq!(store.len(), 2);
        assert!(store.memory_mut("x").is_empty());
        assert_eq!(store.memory_mut("y").len(), 1);
    }
}
