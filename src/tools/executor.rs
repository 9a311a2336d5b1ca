//! Permission-gated tool executor — the orchestration core.
//!
//! Resolve → authorize → validate → invoke → record. Only resolution and
//! authorization failures raise to the caller; everything that happens inside
//! the invocation is folded into the terminal call record. Each accepted
//! invocation runs its side effect at most once — no automatic retries.

use crate::analytics::AnalyticsTracker;
use crate::tools::permissions::{PermissionKind, PermissionTable};
use crate::tools::registry::ToolRegistry;
use crate::tools::ToolCall;
use crate::types::{Error, ExecutorConfig, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;

/// Executes tool invocations against the registry under the permission table.
///
/// All collaborators are passed in at construction; the executor holds no
/// ambient state of its own.
#[derive(Debug)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    permissions: Arc<PermissionTable>,
    analytics: Arc<AnalyticsTracker>,
    config: ExecutorConfig,
}

impl ToolExecutor {
    pub fn new(
        registry: Arc<ToolRegistry>,
        permissions: Arc<PermissionTable>,
        analytics: Arc<AnalyticsTracker>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            registry,
            permissions,
            analytics,
            config,
        }
    }

    /// Execute one tool invocation on behalf of `role`.
    ///
    /// Raises `ToolNotFound`/`ToolDisabled`/`PermissionDenied` before any
    /// side effect; every later failure (bad args, handler error, timeout)
    /// comes back as an `Error`-status [`ToolCall`], which is also recorded
    /// to analytics.
    pub async fn execute(
        &self,
        name: &str,
        args: Map<String, Value>,
        role: &str,
    ) -> Result<ToolCall> {
        // Resolve
        let tool = self
            .registry
            .find(name)
            .await
            .ok_or_else(|| Error::tool_not_found(name))?;
        if !tool.spec.enabled {
            return Err(Error::tool_disabled(name));
        }

        // Authorize; a missing row is a deny
        if !self
            .permissions
            .check(name, role, PermissionKind::Execute)
            .await
        {
            return Err(Error::permission_denied(format!(
                "role \"{}\" cannot execute tool \"{}\"",
                role, name
            )));
        }

        // Invocation accepted
        let call = ToolCall::pending(name, args.clone());
        let started = Instant::now();

        let problems = self.registry.validate_args(name, &args).await?;
        let finished = if !problems.is_empty() {
            call.fail(format!("invalid arguments: {}", problems.join("; ")))
        } else {
            match timeout(self.config.tool_timeout, tool.handler.run(args)).await {
                Ok(Ok(value)) => call.succeed(value),
                Ok(Err(err)) => {
                    tracing::error!(tool = %name, error = %err, "tool execution failed");
                    call.fail(err.to_string())
                }
                Err(_) => call.fail(format!(
                    "tool \"{}\" timed out after {}ms",
                    name,
                    self.config.tool_timeout.as_millis()
                )),
            }
        };

        // Record regardless of outcome; a tracker failure must never mask
        // the execution result.
        if let Err(err) = self.analytics.record(&finished, started).await {
            tracing::warn!(tool = %name, error = %err, "failed to record tool execution");
        }

        Ok(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{MemoryStatsStore, StatsStore};
    use crate::tools::registry::{FnHandler, ParamSpec, ToolSpec};
    use crate::tools::CallStatus;
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        registry: Arc<ToolRegistry>,
        permissions: Arc<PermissionTable>,
        store: Arc<MemoryStatsStore>,
        executor: ToolExecutor,
    }

    async fn harness(tool_timeout: Duration) -> Harness {
        let registry = Arc::new(ToolRegistry::new());
        let permissions = Arc::new(PermissionTable::new());
        let store = Arc::new(MemoryStatsStore::new());
        let analytics = Arc::new(AnalyticsTracker::new(store.clone()));

        registry
            .register(
                ToolSpec::new("echo", "Echo arguments back")
                    .param("text", ParamSpec::string()),
                Arc::new(FnHandler::new(|args| {
                    Box::pin(async move { Ok(json!({ "echoed": args.get("text") })) })
                })),
            )
            .await
            .unwrap();
        registry
            .register(
                ToolSpec::new("broken", "Always fails"),
                Arc::new(FnHandler::new(|_| {
                    Box::pin(async { Err(Error::validation("tool blew up")) })
                })),
            )
            .await
            .unwrap();
        registry
            .register(
                ToolSpec::new("slow", "Never finishes in time"),
                Arc::new(FnHandler::new(|_| {
                    Box::pin(async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(Value::Null)
                    })
                })),
            )
            .await
            .unwrap();

        for tool in ["echo", "broken", "slow"] {
            permissions.seed_defaults(tool).await;
        }

        let executor = ToolExecutor::new(
            registry.clone(),
            permissions.clone(),
            analytics,
            ExecutorConfig { tool_timeout },
        );

        Harness {
            registry,
            permissions,
            store,
            executor,
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    async fn total_for(store: &MemoryStatsStore, tool: &str) -> u64 {
        store
            .get_stats()
            .await
            .unwrap()
            .iter()
            .find(|s| s.tool_name == tool)
            .map(|s| s.total_executions)
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn authorized_success() {
        let h = harness(Duration::from_secs(5)).await;

        let call = h
            .executor
            .execute("echo", args(json!({"text": "hi"})), "admin")
            .await
            .unwrap();

        assert_eq!(call.status, CallStatus::Success);
        assert_eq!(call.result, Some(json!({ "echoed": "hi" })));
        assert_eq!(total_for(&h.store, "echo").await, 1);
    }

    #[tokio::test]
    async fn unknown_tool_raises_before_analytics() {
        let h = harness(Duration::from_secs(5)).await;

        let err = h
            .executor
            .execute("nonexistent", Map::new(), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
        assert!(h.store.get_stats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_tool_raises_before_analytics() {
        let h = harness(Duration::from_secs(5)).await;
        h.registry.set_enabled("echo", false).await.unwrap();

        let err = h
            .executor
            .execute("echo", args(json!({"text": "hi"})), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolDisabled(_)));
        assert_eq!(total_for(&h.store, "echo").await, 0);
    }

    #[tokio::test]
    async fn missing_permission_row_is_denied() {
        let h = harness(Duration::from_secs(5)).await;

        let err = h
            .executor
            .execute("echo", args(json!({"text": "hi"})), "guest")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert_eq!(total_for(&h.store, "echo").await, 0);
    }

    #[tokio::test]
    async fn revoked_execute_is_denied() {
        let h = harness(Duration::from_secs(5)).await;
        h.permissions
            .replace(
                "echo",
                vec![crate::tools::permissions::Permission::full("echo", "admin")],
            )
            .await
            .unwrap();

        let err = h
            .executor
            .execute("echo", args(json!({"text": "hi"})), "user")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn handler_failure_folds_into_error_call() {
        let h = harness(Duration::from_secs(5)).await;

        let call = h.executor.execute("broken", Map::new(), "admin").await.unwrap();
        assert_eq!(call.status, CallStatus::Error);
        let message = call.result.unwrap();
        assert!(message.as_str().unwrap().contains("tool blew up"));
        // Failures are recorded too.
        assert_eq!(total_for(&h.store, "broken").await, 1);
    }

    #[tokio::test]
    async fn invalid_args_fold_into_error_call() {
        let h = harness(Duration::from_secs(5)).await;

        let call = h
            .executor
            .execute("echo", args(json!({"text": 42})), "admin")
            .await
            .unwrap();
        assert_eq!(call.status, CallStatus::Error);
        assert!(call
            .result
            .unwrap()
            .as_str()
            .unwrap()
            .contains("invalid arguments"));
        assert_eq!(total_for(&h.store, "echo").await, 1);
    }

    #[tokio::test]
    async fn timeout_terminates_invocation() {
        let h = harness(Duration::from_millis(50)).await;

        let call = h.executor.execute("slow", Map::new(), "admin").await.unwrap();
        assert_eq!(call.status, CallStatus::Error);
        assert!(call.result.unwrap().as_str().unwrap().contains("timed out"));
        assert_eq!(total_for(&h.store, "slow").await, 1);
    }

    #[tokio::test]
    async fn concurrent_same_tool_executions_accumulate() {
        let h = harness(Duration::from_secs(5)).await;
        let executor = Arc::new(h.executor);

        let mut handles = Vec::new();
        for _ in 0..2 {
            let executor = Arc::clone(&executor);
            handles.push(tokio::spawn(async move {
                executor
                    .execute("echo", args(json!({"text": "hi"})), "admin")
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_success());
        }

        assert_eq!(total_for(&h.store, "echo").await, 2);
    }
}
