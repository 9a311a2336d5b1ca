//! Execution analytics — per-tool running aggregates.
//!
//! The tracker computes elapsed time and applies an online mean; durable
//! persistence sits behind the [`StatsStore`] trait so the engine only ships
//! the in-memory implementation. Store failures are the caller's problem to
//! swallow: the executor logs them and keeps the primary result.

use crate::tools::ToolCall;
use crate::types::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Running aggregate for one tool, recomputed incrementally on every
/// execution — never from full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStat {
    pub tool_name: String,
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub avg_execution_time_ms: u64,
    pub last_executed_at: DateTime<Utc>,
}

/// One execution's contribution to the aggregates.
#[derive(Debug, Clone, Copy)]
pub struct StatDelta {
    pub success: bool,
    pub elapsed_ms: u64,
    pub at: DateTime<Utc>,
}

/// A single recorded execution row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub tool_call: ToolCall,
    pub elapsed_ms: u64,
    pub at: DateTime<Utc>,
}

/// Persistence seam for execution telemetry.
///
/// `upsert_stat` must be atomic with respect to concurrent executions of the
/// same tool name — two simultaneous completions may not lose an update.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn record_execution(&self, call: &ToolCall, elapsed_ms: u64) -> Result<()>;
    async fn upsert_stat(&self, tool_name: &str, delta: StatDelta) -> Result<()>;
    async fn get_stats(&self) -> Result<Vec<ExecutionStat>>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Bound on the retained execution log.
const RECENT_EXECUTIONS_CAP: usize = 1000;

/// In-memory [`StatsStore`].
#[derive(Debug)]
pub struct MemoryStatsStore {
    stats: RwLock<HashMap<String, ExecutionStat>>,
    executions: RwLock<VecDeque<ExecutionRecord>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(HashMap::new()),
            executions: RwLock::new(VecDeque::with_capacity(RECENT_EXECUTIONS_CAP)),
        }
    }

    /// Newest-first slice of the retained execution log.
    pub async fn recent_executions(&self, limit: usize) -> Vec<ExecutionRecord> {
        let executions = self.executions.read().await;
        executions.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for MemoryStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn record_execution(&self, call: &ToolCall, elapsed_ms: u64) -> Result<()> {
        let mut executions = self.executions.write().await;
        if executions.len() >= RECENT_EXECUTIONS_CAP {
            executions.pop_front();
        }
        executions.push_back(ExecutionRecord {
            tool_call: call.clone(),
            elapsed_ms,
            at: Utc::now(),
        });
        Ok(())
    }

    async fn upsert_stat(&self, tool_name: &str, delta: StatDelta) -> Result<()> {
        // Single write lock couples the read and the write; two completions
        // for the same tool cannot interleave here.
        let mut stats = self.stats.write().await;
        match stats.get_mut(tool_name) {
            None => {
                stats.insert(
                    tool_name.to_string(),
                    ExecutionStat {
                        tool_name: tool_name.to_string(),
                        total_executions: 1,
                        successful_executions: u64::from(delta.success),
                        failed_executions: u64::from(!delta.success),
                        // First execution: the mean is the sample itself.
                        avg_execution_time_ms: delta.elapsed_ms,
                        last_executed_at: delta.at,
                    },
                );
            }
            Some(stat) => {
                let old_total = stat.total_executions;
                let new_total = old_total + 1;
                let running = stat.avg_execution_time_ms as f64 * old_total as f64;
                stat.avg_execution_time_ms =
                    ((running + delta.elapsed_ms as f64) / new_total as f64).round() as u64;
                stat.total_executions = new_total;
                if delta.success {
                    stat.successful_executions += 1;
                } else {
                    stat.failed_executions += 1;
                }
                stat.last_executed_at = delta.at;
            }
        }
        Ok(())
    }

    async fn get_stats(&self) -> Result<Vec<ExecutionStat>> {
        let stats = self.stats.read().await;
        let mut all: Vec<ExecutionStat> = stats.values().cloned().collect();
        all.sort_by(|a, b| a.tool_name.cmp(&b.tool_name));
        Ok(all)
    }
}

// =============================================================================
// Tracker
// =============================================================================

/// Records each execution and maintains the running aggregates.
pub struct AnalyticsTracker {
    store: Arc<dyn StatsStore>,
}

impl std::fmt::Debug for AnalyticsTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsTracker").finish_non_exhaustive()
    }
}

impl AnalyticsTracker {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// Record one finished call. Elapsed time is measured from `started`.
    pub async fn record(&self, call: &ToolCall, started: Instant) -> Result<()> {
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.store.record_execution(call, elapsed_ms).await?;
        self.store
            .upsert_stat(
                &call.name,
                StatDelta {
                    success: call.is_success(),
                    elapsed_ms,
                    at: Utc::now(),
                },
            )
            .await?;

        tracing::debug!(tool = %call.name, elapsed_ms, status = ?call.status, "execution recorded");
        Ok(())
    }

    /// Aggregates for all tools, sorted by name.
    pub async fn stats(&self) -> Result<Vec<ExecutionStat>> {
        self.store.get_stats().await
    }
}

// =============================================================================
// Tests
// =============================================================================
