//! Tool infrastructure — registry, permissions, executor, built-in tools.
//!
//! The registry owns tool metadata and handlers, the permission table gates
//! execution by role, and the executor ties them together with analytics
//! recording and bounded invocation.

pub mod builtin;
pub mod call;
pub mod executor;
pub mod permissions;
pub mod registry;

pub use builtin::install_builtin_tools;
pub use call::{CallStatus, ToolCall};
pub use executor::ToolExecutor;
pub use permissions::{Permission, PermissionKind, PermissionTable, ADMIN_ROLE, USER_ROLE};
pub use registry::{
    FnHandler, ParamSpec, ParamType, RegisteredTool, ToolHandler, ToolRegistry, ToolSpec,
};
