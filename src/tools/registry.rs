//! Tool registry — typed metadata, parameter validation, prompt generation.
//!
//! Owns tool metadata and execution handlers. Registration is the only way a
//! tool comes into existence; `enabled` is the only field that changes after
//! that. The registry never talks to storage.

use crate::types::{Error, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::String => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("expected string, got {}", value_type_name(value)))
                }
            }
            ParamType::Number => {
                if value.is_number() {
                    Ok(())
                } else {
                    Err(format!("expected number, got {}", value_type_name(value)))
                }
            }
            ParamType::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected boolean, got {}", value_type_name(value)))
                }
            }
        }
    }

    /// Human-readable type name for prompt generation.
    pub fn display_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter specification
// =============================================================================

/// Schema for a single tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub optional: bool,
    /// Closed set of accepted string values, if any.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn string() -> Self {
        Self {
            param_type: ParamType::String,
            optional: false,
            allowed: None,
            description: None,
        }
    }

    pub fn number() -> Self {
        Self {
            param_type: ParamType::Number,
            optional: false,
            allowed: None,
            description: None,
        }
    }

    pub fn boolean() -> Self {
        Self {
            param_type: ParamType::Boolean,
            optional: false,
            allowed: None,
            description: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    fn display_name(&self) -> String {
        match &self.allowed {
            Some(values) => format!("enum({})", values.join("|")),
            None => self.param_type.display_name().to_string(),
        }
    }
}

// =============================================================================
// Tool specification
// =============================================================================

/// Complete tool metadata, serializable for admin surfaces.
///
/// `name` is the immutable identity; `enabled` is the only field mutated
/// after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// BTreeMap keeps prompt and wire output deterministic.
    pub parameters: BTreeMap<String, ParamSpec>,
    pub enabled: bool,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
            enabled: true,
        }
    }

    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }

    /// Generate a prompt line for this tool.
    ///
    /// Format: `- name(param1: type, param2?: type): description`
    pub fn to_prompt_line(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|(name, p)| {
                let optional = if p.optional { "?" } else { "" };
                format!("{}{}: {}", name, optional, p.display_name())
            })
            .collect();

        format!("- {}({}): {}", self.name, params.join(", "), self.description)
    }
}

// =============================================================================
// Tool handlers
// =============================================================================

/// Execution side of a tool. Implementations may perform I/O; the executor
/// bounds the wait and folds failures into the call record.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn run(&self, args: Map<String, Value>) -> Result<Value>;
}

type HandlerFn = dyn Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// Closure-backed handler for dynamically registered tools.
pub struct FnHandler {
    f: Box<HandlerFn>,
}

impl FnHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolHandler for FnHandler {
    async fn run(&self, args: Map<String, Value>) -> Result<Value> {
        (self.f)(args).await
    }
}

/// A registered tool: metadata plus its handler.
#[derive(Clone)]
pub struct RegisteredTool {
    pub spec: ToolSpec,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tool registry
// =============================================================================

/// In-memory tool registry.
///
/// Reads vastly outnumber writes; mutations go through the write lock so a
/// reader never observes a half-applied registration or enable flip.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, RegisteredTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool. Fails with `DuplicateTool` if the name is taken.
    pub async fn register(&self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> Result<()> {
        if spec.name.is_empty() {
            return Err(Error::validation("tool name cannot be empty"));
        }

        let mut tools = self.tools.write().await;
        if tools.contains_key(&spec.name) {
            return Err(Error::duplicate_tool(&spec.name));
        }

        tracing::debug!(tool = %spec.name, "registered tool");
        tools.insert(spec.name.clone(), RegisteredTool { spec, handler });
        Ok(())
    }

    /// Look up a tool by name.
    pub async fn find(&self, name: &str) -> Option<RegisteredTool> {
        self.tools.read().await.get(name).cloned()
    }

    /// Snapshot of all tool specs, sorted by name. Callers cannot mutate
    /// registry state through the returned copies.
    pub async fn list(&self) -> Vec<ToolSpec> {
        let tools = self.tools.read().await;
        let mut specs: Vec<ToolSpec> = tools.values().map(|t| t.spec.clone()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Flip a tool's enabled state. Fails with `ToolNotFound` if absent.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let mut tools = self.tools.write().await;
        match tools.get_mut(name) {
            Some(tool) => {
                tool.spec.enabled = enabled;
                tracing::debug!(tool = %name, enabled, "tool enabled state changed");
                Ok(())
            }
            None => Err(Error::tool_not_found(name)),
        }
    }

    /// Validate arguments against a tool's parameter schema.
    ///
    /// Returns a list of validation problems (empty = valid).
    pub async fn validate_args(&self, name: &str, args: &Map<String, Value>) -> Result<Vec<String>> {
        let tools = self.tools.read().await;
        let tool = tools
            .get(name)
            .ok_or_else(|| Error::tool_not_found(name))?;

        let mut problems = Vec::new();

        for (param_name, spec) in &tool.spec.parameters {
            match args.get(param_name) {
                None => {
                    if !spec.optional {
                        problems.push(format!("missing required parameter: {}", param_name));
                    }
                }
                Some(value) => {
                    if let Err(e) = spec.param_type.validate(value) {
                        problems.push(format!("parameter '{}': {}", param_name, e));
                    } else if let (Some(allowed), Some(s)) = (&spec.allowed, value.as_str()) {
                        if !allowed.iter().any(|v| v == s) {
                            problems.push(format!(
                                "parameter '{}': invalid value '{}', expected one of: {}",
                                param_name,
                                s,
                                allowed.join(", ")
                            ));
                        }
                    }
                }
            }
        }

        for key in args.keys() {
            if !tool.spec.parameters.contains_key(key) {
                problems.push(format!("unknown parameter: {}", key));
            }
        }

        Ok(problems)
    }

    /// Generate the "Available tools" prompt section for LLM consumption.
    /// Disabled tools are omitted; empty when nothing is enabled.
    pub async fn prompt_block(&self) -> String {
        let specs = self.list().await;
        let enabled: Vec<&ToolSpec> = specs.iter().filter(|s| s.enabled).collect();

        if enabled.is_empty() {
            return String::new();
        }

        let mut lines = Vec::with_capacity(enabled.len() + 1);
        lines.push("Available tools:".to_string());
        for spec in enabled {
            lines.push(spec.to_prompt_line());
        }
        lines.join("\n")
    }

    /// Number of registered tools.
    pub async fn len(&self) -> usize {
        self.tools.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tools.read().await.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
