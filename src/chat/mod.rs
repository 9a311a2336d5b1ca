//! Chat orchestration — the turn loop tying context, completion, parsing,
//! execution, and broadcast together.
//!
//! One inbound user message drives: append + publish the user message, build
//! the augmented system prompt, call the completion client, extract tool
//! invocations from the reply, execute each in parsed order, publish each
//! call, then append + publish the assistant turn carrying the calls.

pub mod context;
pub mod parser;

pub use context::ContextStore;
pub use parser::{extract_tool_calls, ParsedCall};

use crate::llm::{ChatMessage, ChatRole, CompletionClient};
use crate::realtime::Broadcaster;
use crate::tools::{
    PermissionTable, ToolCall, ToolExecutor, ToolHandler, ToolRegistry, ToolSpec,
};
use crate::types::{ChatConfig, ContextId, MessageId, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

// =============================================================================
// Wire message
// =============================================================================

/// Wire shape of one chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: ChatRole,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
            tool_calls: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            id: MessageId::new(),
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
            tool_calls,
        }
    }
}

// =============================================================================
// Chat engine
// =============================================================================

/// Composition root: owns per-conversation state and drives one chat turn
/// end to end.
///
/// Every collaborator is passed in at construction; the engine holds no
/// ambient or singleton state.
pub struct ChatEngine {
    contexts: ContextStore,
    registry: Arc<ToolRegistry>,
    permissions: Arc<PermissionTable>,
    executor: Arc<ToolExecutor>,
    broadcaster: Arc<Broadcaster>,
    client: Arc<dyn CompletionClient>,
    config: RwLock<ChatConfig>,
}

impl fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatEngine")
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

impl ChatEngine {
    pub fn new(
        registry: Arc<ToolRegistry>,
        permissions: Arc<PermissionTable>,
        executor: Arc<ToolExecutor>,
        broadcaster: Arc<Broadcaster>,
        client: Arc<dyn CompletionClient>,
        config: ChatConfig,
    ) -> Self {
        Self {
            contexts: ContextStore::new(),
            registry,
            permissions,
            executor,
            broadcaster,
            client,
            config: RwLock::new(config),
        }
    }

    /// Handle one inbound user message for `context_id` on behalf of `role`.
    ///
    /// A provider failure surfaces as a chat-turn failure. Tool-side failures
    /// — including policy rejections of model-initiated invocations — are
    /// folded into `error`-status calls on the assistant turn so the
    /// conversation continues; a rejected invocation was never accepted and
    /// does not touch analytics.
    pub async fn handle_message(
        &self,
        context_id: &ContextId,
        text: &str,
        role: &str,
    ) -> Result<Message> {
        self.contexts
            .append(context_id, ChatMessage::user(text))
            .await;
        self.broadcaster.publish_message(Message::user(text)).await;

        let (system_message, temperature, max_tokens) = {
            let config = self.config.read().await;
            (
                config.system_message.clone(),
                config.temperature,
                config.max_tokens,
            )
        };
        let prompt_block = self.registry.prompt_block().await;
        let base = if prompt_block.is_empty() {
            system_message
        } else {
            format!("{system_message}\n\n{prompt_block}")
        };
        let system = self
            .contexts
            .with_last_tool_results(context_id, &base)
            .await;

        let history = self.contexts.history(context_id).await;
        let reply = self
            .client
            .complete(&history, &system, temperature, max_tokens)
            .await?;

        let mut calls = Vec::new();
        for parsed in extract_tool_calls(&reply) {
            let call = match self
                .executor
                .execute(&parsed.name, parsed.args.clone(), role)
                .await
            {
                Ok(call) => call,
                Err(err) => {
                    tracing::warn!(tool = %parsed.name, error = %err, "tool invocation rejected");
                    ToolCall::pending(&parsed.name, parsed.args).fail(err.to_string())
                }
            };
            self.broadcaster.publish_tool_call(call.clone()).await;
            calls.push(call);
        }

        let assistant_message = Message::assistant(
            reply.as_str(),
            if calls.is_empty() {
                None
            } else {
                Some(calls.clone())
            },
        );
        self.contexts
            .append(context_id, ChatMessage::assistant(reply.as_str()))
            .await;
        self.contexts.set_last_tool_calls(context_id, calls).await;
        self.broadcaster
            .publish_message(assistant_message.clone())
            .await;

        Ok(assistant_message)
    }

    /// Dynamically register a tool and seed its default permission rows.
    pub async fn register_tool(
        &self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<()> {
        let name = spec.name.clone();
        self.registry.register(spec, handler).await?;
        self.permissions.seed_defaults(&name).await;
        tracing::info!(tool = %name, "tool registered dynamically");
        Ok(())
    }

    /// Current chat configuration.
    pub async fn config(&self) -> ChatConfig {
        self.config.read().await.clone()
    }

    /// Replace the chat configuration.
    pub async fn update_config(&self, config: ChatConfig) {
        *self.config.write().await = config;
    }

    /// History snapshot for one conversation.
    pub async fn history(&self, context_id: &ContextId) -> Vec<ChatMessage> {
        self.contexts.history(context_id).await
    }

    /// Administrative context reset.
    pub async fn clear_context(&self, context_id: &ContextId) {
        self.contexts.clear(context_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn message_wire_shape_is_camel_case() {
        let call = ToolCall::pending("fileSystem", Map::new()).succeed(json!("ok"));
        let message = Message::assistant("done", Some(vec![call]));

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "done");
        assert!(json["timestamp"].is_i64());
        assert_eq!(json["toolCalls"][0]["name"], "fileSystem");
    }

    #[test]
    fn message_without_calls_omits_the_field() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("toolCalls").is_none());
    }
}
