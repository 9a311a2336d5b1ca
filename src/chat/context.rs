//! Conversation context — per-conversation history and last tool results.
//!
//! Contexts are created lazily on first append and mutated only by appending;
//! history is never rewritten. `clear` is an administrative reset, not part of
//! the normal chat flow.

use crate::llm::ChatMessage;
use crate::tools::ToolCall;
use crate::types::ContextId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Default)]
struct Conversation {
    messages: Vec<ChatMessage>,
    last_tool_calls: Vec<ToolCall>,
}

/// Per-conversation state store.
///
/// The outer map is held only long enough to find or create a context; each
/// context then has its own lock. Turns on different contexts never contend,
/// turns on the same context serialize.
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: RwLock<HashMap<ContextId, Arc<Mutex<Conversation>>>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, id: &ContextId) -> Arc<Mutex<Conversation>> {
        if let Some(ctx) = self.contexts.read().await.get(id) {
            return Arc::clone(ctx);
        }
        let mut contexts = self.contexts.write().await;
        Arc::clone(contexts.entry(id.clone()).or_default())
    }

    async fn find(&self, id: &ContextId) -> Option<Arc<Mutex<Conversation>>> {
        self.contexts.read().await.get(id).cloned()
    }

    /// Append one message. Ordering preserved, no dedup.
    pub async fn append(&self, id: &ContextId, message: ChatMessage) {
        let ctx = self.entry(id).await;
        ctx.lock().await.messages.push(message);
    }

    /// Snapshot of the history. Empty for an unknown context.
    pub async fn history(&self, id: &ContextId) -> Vec<ChatMessage> {
        match self.find(id).await {
            Some(ctx) => ctx.lock().await.messages.clone(),
            None => Vec::new(),
        }
    }

    /// Record the turn's tool calls for the next augmentation. Each turn
    /// replaces the previous turn's list.
    pub async fn set_last_tool_calls(&self, id: &ContextId, calls: Vec<ToolCall>) {
        let ctx = self.entry(id).await;
        ctx.lock().await.last_tool_calls = calls;
    }

    /// Base instructions plus one `Tool {name} returned: {json}` line per
    /// last-turn call, newline-joined. Exactly `base` when there are none.
    pub async fn with_last_tool_results(&self, id: &ContextId, base: &str) -> String {
        let Some(ctx) = self.find(id).await else {
            return base.to_string();
        };

        let conversation = ctx.lock().await;
        if conversation.last_tool_calls.is_empty() {
            return base.to_string();
        }

        let lines: Vec<String> = conversation
            .last_tool_calls
            .iter()
            .map(|call| {
                let result = call.result.clone().unwrap_or(Value::Null);
                format!("Tool {} returned: {}", call.name, result)
            })
            .collect();

        format!("{base}\n{}", lines.join("\n"))
    }

    /// Drop a context entirely.
    pub async fn clear(&self, id: &ContextId) {
        self.contexts.write().await.remove(id);
    }

    /// Number of live contexts.
    pub async fn context_count(&self) -> usize {
        self.contexts.read().await.len()
    }
}
