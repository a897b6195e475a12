//! Bounded, append-only conversation log.
//!
//! Turns are kept in insertion order. Once the retention capacity is reached
//! the oldest turns are evicted first; turns are never reordered.

use std::collections::vec_deque::{self, VecDeque};

use crate::types::ConversationTurn;

/// Upper bound for [`ConversationMemory::snapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotBound {
    /// At most this many turns.
    Turns(usize),
    /// As many recent turns as fit in this many estimated tokens.
    Tokens(usize),
}

/// The conversation log of one chat session.
#[derive(Clone, Debug)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationMemory {
    /// Create an empty memory retaining at most `capacity` turns.
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Append a turn at the tail, evicting the oldest turns beyond capacity.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// The most recent turns within `bound`, oldest first.
    ///
    /// The iterator is lazy and borrows the log; call again for a fresh one.
    pub fn snapshot(&self, bound: SnapshotBound) -> vec_deque::Iter<'_, ConversationTurn> {
        let start = match bound {
            SnapshotBound::Turns(n) => self.turns.len().saturating_sub(n),
            SnapshotBound::Tokens(max) => {
                let mut used = 0usize;
                let mut start = self.turns.len();
                for turn in self.turns.iter().rev() {
                    used += turn.estimated_tokens();
                    if used > max {
                        break;
                    }
                    start -= 1;
                }
                start
            }
        };
        self.turns.range(start..)
    }

    /// Remove every turn (session reset).
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Maximum number of turns retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
