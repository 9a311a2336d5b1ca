//! Tool permissions — role-scoped execution gating.
//!
//! Every tool carries a set of `(tool, role)` rows; absence of a row is a
//! deny, not a default-allow. Rows are replaced wholesale, never patched, so
//! a reader can never observe a half-updated permission set.

use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Role granted full access on every tool, always.
pub const ADMIN_ROLE: &str = "admin";

/// Default non-privileged role.
pub const USER_ROLE: &str = "user";

/// One permission row, keyed by `(tool_name, role)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub tool_name: String,
    pub role: String,
    pub can_execute: bool,
    pub can_modify: bool,
    pub can_delete: bool,
}

impl Permission {
    pub fn full(tool_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            role: role.into(),
            can_execute: true,
            can_modify: true,
            can_delete: true,
        }
    }

    pub fn execute_only(tool_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            role: role.into(),
            can_execute: true,
            can_modify: false,
            can_delete: false,
        }
    }
}

/// Which capability a check is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionKind {
    Execute,
    Modify,
    Delete,
}

/// In-memory permission table.
///
/// Written by an external admin surface, read on every tool execution.
#[derive(Debug, Default)]
pub struct PermissionTable {
    rows: RwLock<HashMap<String, Vec<Permission>>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the two default rows for a newly created tool:
    /// admin gets everything, user may execute.
    pub async fn seed_defaults(&self, tool_name: &str) {
        let mut rows = self.rows.write().await;
        rows.insert(
            tool_name.to_string(),
            vec![
                Permission::full(tool_name, ADMIN_ROLE),
                Permission::execute_only(tool_name, USER_ROLE),
            ],
        );
    }

    /// Check one capability for `(tool, role)`. A missing row is a deny.
    pub async fn check(&self, tool_name: &str, role: &str, kind: PermissionKind) -> bool {
        let rows = self.rows.read().await;
        rows.get(tool_name)
            .and_then(|perms| perms.iter().find(|p| p.role == role))
            .map(|p| match kind {
                PermissionKind::Execute => p.can_execute,
                PermissionKind::Modify => p.can_modify,
                PermissionKind::Delete => p.can_delete,
            })
            .unwrap_or(false)
    }

    /// Snapshot of the rows for one tool.
    pub async fn permissions_for(&self, tool_name: &str) -> Vec<Permission> {
        self.rows
            .read()
            .await
            .get(tool_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace all rows for a tool, all-or-nothing.
    ///
    /// Rejected (prior set retained) unless every row targets `tool_name`,
    /// at least one role keeps `can_execute`, and the admin row is present
    /// with all three flags set.
    pub async fn replace(&self, tool_name: &str, new_rows: Vec<Permission>) -> Result<()> {
        if let Some(stray) = new_rows.iter().find(|p| p.tool_name != tool_name) {
            return Err(Error::validation(format!(
                "permission row targets tool '{}', expected '{}'",
                stray.tool_name, tool_name
            )));
        }

        if !new_rows.iter().any(|p| p.can_execute) {
            return Err(Error::validation(format!(
                "tool '{}' must keep at least one role with execute permission",
                tool_name
            )));
        }

        let admin_ok = new_rows
            .iter()
            .any(|p| p.role == ADMIN_ROLE && p.can_execute && p.can_modify && p.can_delete);
        if !admin_ok {
            return Err(Error::validation(format!(
                "tool '{}' must retain full admin permissions",
                tool_name
            )));
        }

        let mut rows = self.rows.write().await;
        rows.insert(tool_name.to_string(), new_rows);
        tracing::debug!(tool = %tool_name, "permission set replaced");
        Ok(())
    }

    /// Drop all rows for a tool.
    pub async fn remove(&self, tool_name: &str) {
        self.rows.write().await.remove(tool_name);
    }
}
