//! Core types for the Steward engine.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (MessageId, ToolCallId, etc.)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for chat, executor, and realtime

mod config;
mod errors;
mod ids;

pub use config::{ChatConfig, Config, ExecutorConfig, ObservabilityConfig, RealtimeConfig};
pub use errors::{Error, Result};
pub use ids::{ContextId, MessageId, SubscriberId, ToolCallId};
