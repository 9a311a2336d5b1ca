//! Tool call records.

use crate::types::ToolCallId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Pending,
    Success,
    Error,
}

/// One concrete tool invocation, tracked pending → success|error.
///
/// Created the instant the executor accepts an invocation; finalized exactly
/// once by the consuming `succeed`/`fail` constructors and immutable after
/// that. The core does not retain these beyond handing them to analytics and
/// the broadcaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: ToolCallId,
    pub name: String,
    pub args: Map<String, Value>,
    pub status: CallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl ToolCall {
    /// Accept an invocation: fresh id, `pending` status, no result yet.
    pub fn pending(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id: ToolCallId::new(),
            name: name.into(),
            args,
            status: CallStatus::Pending,
            result: None,
        }
    }

    /// Terminal success with the tool's return value.
    pub fn succeed(mut self, result: Value) -> Self {
        self.status = CallStatus::Success;
        self.result = Some(result);
        self
    }

    /// Terminal failure with a printable message.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.status = CallStatus::Error;
        self.result = Some(Value::String(message.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Success
    }
}
