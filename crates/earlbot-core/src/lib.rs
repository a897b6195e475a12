//! Earlbot Core — shared types, message bus, configuration, errors and
//! per-session conversation memory.
//!
//! This crate contains:
//! - **types**: LLM wire messages and conversation turns
//! - **bus**: inbound/outbound queues between channels and the bot
//! - **config**: schema, loader and env var overrides
//! - **error**: the error taxonomy shared by every other crate
//! - **session**: `ConversationMemory` and the per-session `SessionStore`

pub mod bus;
pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod utils;

pub use error::{ConfigError, PlanError, RegistryError, ServiceError, ToolError, TransportError};
