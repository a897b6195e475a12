//! Completion service layer for Earlbot.
//!
//! # Architecture
//!
//! - [`traits::CompletionService`] — trait the skills call
//! - [`http_provider::HttpProvider`] — OpenAI-compatible HTTP client

pub mod http_provider;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::HttpProvider;
pub use traits::{CompletionRequest, CompletionService, LlmRequestConfig};
