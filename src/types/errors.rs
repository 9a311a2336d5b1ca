//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the Steward engine.
///
/// The `ToolNotFound`/`ToolDisabled`/`PermissionDenied` variants are policy
/// errors: raised before any tool side effect is attempted, never converted
/// into an `error`-status tool call. Everything that goes wrong *inside* a
/// tool invocation is folded into the call record by the executor instead of
/// surfacing here.
#[derive(Error, Debug)]
pub enum Error {
    /// A tool with this name is already registered.
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    /// No tool with this name exists in the registry.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The tool exists but is currently disabled.
    #[error("tool disabled: {0}")]
    ToolDisabled(String),

    /// The role is not permitted to perform this action on the tool.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Validation errors (bad registration input, rejected permission sets).
    #[error("validation error: {0}")]
    Validation(String),

    /// LLM provider failures, surfaced as a chat-turn failure.
    #[error("completion error: {0}")]
    Completion(String),

    /// Bounded wait exceeded.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience constructors
impl Error {
    pub fn duplicate_tool(name: impl Into<String>) -> Self {
        Self::DuplicateTool(name.into())
    }

    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound(name.into())
    }

    pub fn tool_disabled(name: impl Into<String>) -> Self {
        Self::ToolDisabled(name.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// True for errors raised before any tool side effect was attempted.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Error::ToolNotFound(_) | Error::ToolDisabled(_) | Error::PermissionDenied(_)
        )
    }
}
