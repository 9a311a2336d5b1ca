//! Configuration structures.
//!
//! Configuration is loaded from environment variables and config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat completion configuration.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Tool executor configuration.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Realtime broadcast configuration.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Chat completion configuration.
///
/// Mutable at runtime through the engine's config surface; the system message
/// is the base instruction block that tool descriptions and last tool results
/// are appended to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base system instructions sent with every completion.
    pub system_message: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Completion token budget.
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_message: "You are a helpful AI assistant with access to various system tools.\n\
                When you need to use a tool, emit a tag of the form \
                <tool>NAME:{\"param\": \"value\"}</tool> with a single JSON object of arguments.\n\
                Explain what you are going to do, use the tool with proper parameters, \
                then explain the result to the user.\n\
                Always validate inputs and handle errors gracefully."
                .to_string(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

/// Tool executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Bounded wait for a single tool invocation. Exceeding it terminates the
    /// invocation as an error-status call, never leaves it pending.
    #[serde(with = "humantime_serde")]
    pub tool_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// Realtime broadcast configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Interval between liveness sweeps of the subscriber set.
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = Config::default();
        assert!((cfg.chat.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.chat.max_tokens, 2048);
        assert_eq!(cfg.executor.tool_timeout, Duration::from_secs(30));
        assert_eq!(cfg.realtime.heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    fn durations_use_humantime() {
        let toml_like = r#"{"executor": {"tool_timeout": "5s"}}"#;
        let cfg: Config = serde_json::from_str(toml_like).unwrap();
        assert_eq!(cfg.executor.tool_timeout, Duration::from_secs(5));
    }
}
