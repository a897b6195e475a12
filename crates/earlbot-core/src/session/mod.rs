//! Conversation memory, partitioned per chat session.
//!
//! Memory lives for the process lifetime only. Each session key
//! (`"{channel}:{chat_id}"`) owns one bounded [`ConversationMemory`].

pub mod manager;
pub mod memory;

pub use manager::SessionStore;
pub use memory::{ConversationMemory, SnapshotBound};
