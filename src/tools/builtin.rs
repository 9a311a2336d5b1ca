//! Built-in tools — file I/O, system commands, natural-language computer
//! control.
//!
//! These ship with the engine and are installed at startup via
//! [`install_builtin_tools`]. Dynamically registered tools go through the same
//! registry path; built-ins are not special beyond being known at compile
//! time.

use crate::llm::{ChatMessage, CompletionClient};
use crate::tools::permissions::PermissionTable;
use crate::tools::registry::{ParamSpec, ToolHandler, ToolRegistry, ToolSpec};
use crate::types::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::process::Command;

/// Commands `computerControl` may run after interpretation.
const SAFE_COMMANDS: &[&str] = &[
    "ps", "ls", "pwd", "whoami", "df", "free", "uptime", "date", "cal",
];

fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::validation(format!("missing required parameter: {name}")))
}

/// Run a bare command (no arguments) and return its stdout.
async fn run_command(command: &str) -> Result<Value> {
    let output = Command::new(command).output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Io(std::io::Error::other(format!(
            "command \"{}\" exited with {}: {}",
            command,
            output.status,
            stderr.trim()
        ))));
    }
    Ok(Value::String(
        String::from_utf8_lossy(&output.stdout).into_owned(),
    ))
}

// =============================================================================
// fileSystem
// =============================================================================

/// File system operations: read, write, list, delete.
#[derive(Debug, Default)]
pub struct FileSystemTool;

#[async_trait]
impl ToolHandler for FileSystemTool {
    async fn run(&self, args: Map<String, Value>) -> Result<Value> {
        let operation = required_str(&args, "operation")?;
        let path = required_str(&args, "path")?;

        match operation {
            "read" => {
                let contents = tokio::fs::read_to_string(path).await?;
                Ok(Value::String(contents))
            }
            "write" => {
                let content = required_str(&args, "content")?;
                tokio::fs::write(path, content).await?;
                Ok(Value::String("File written successfully".to_string()))
            }
            "list" => {
                let mut entries = tokio::fs::read_dir(path).await?;
                let mut names = Vec::new();
                while let Some(entry) = entries.next_entry().await? {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
                names.sort();
                Ok(Value::Array(names.into_iter().map(Value::String).collect()))
            }
            "delete" => {
                tokio::fs::remove_file(path).await?;
                Ok(Value::String("File deleted successfully".to_string()))
            }
            other => Err(Error::validation(format!("invalid operation: {other}"))),
        }
    }
}

// =============================================================================
// systemControl
// =============================================================================

/// Fixed system information commands.
#[derive(Debug, Default)]
pub struct SystemControlTool;

#[async_trait]
impl ToolHandler for SystemControlTool {
    async fn run(&self, args: Map<String, Value>) -> Result<Value> {
        let command = required_str(&args, "command")?;
        run_command(command).await
    }
}

// =============================================================================
// computerControl
// =============================================================================

/// Natural-language commands, interpreted by the completion client against the
/// safe-command allow-list before execution.
pub struct ComputerControlTool {
    client: Arc<dyn CompletionClient>,
}

impl ComputerControlTool {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

impl fmt::Debug for ComputerControlTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputerControlTool").finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolHandler for ComputerControlTool {
    async fn run(&self, args: Map<String, Value>) -> Result<Value> {
        let command = required_str(&args, "command")?;

        let prompt = format!(
            "Convert this natural language command to a safe system command. \
             Only return one of these commands: {}. Command: \"{}\"",
            SAFE_COMMANDS.join(", "),
            command
        );
        let history = [ChatMessage::user(prompt)];
        let interpreted = self
            .client
            .complete(
                &history,
                "You are a computer command interpreter. Only respond with a \
                 single valid command from the allowed list, nothing else.",
                0.1,
                50,
            )
            .await?;
        let interpreted = interpreted.trim();

        if !SAFE_COMMANDS.contains(&interpreted) {
            return Err(Error::validation(format!(
                "invalid or unsafe command: {interpreted}"
            )));
        }

        run_command(interpreted).await
    }
}

// =============================================================================
// Installation
// =============================================================================

fn file_system_spec() -> ToolSpec {
    ToolSpec::new("fileSystem", "Perform file system operations")
        .param(
            "operation",
            ParamSpec::string().one_of(["read", "write", "list", "delete"]),
        )
        .param("path", ParamSpec::string())
        .param("content", ParamSpec::string().optional())
}

fn system_control_spec() -> ToolSpec {
    ToolSpec::new(
        "systemControl",
        "Execute system commands and get system information",
    )
    .param(
        "command",
        ParamSpec::string().one_of(["ps", "df", "free", "uptime"]),
    )
}

fn computer_control_spec() -> ToolSpec {
    ToolSpec::new(
        "computerControl",
        "Execute computer commands with natural language interpretation",
    )
    .param(
        "command",
        ParamSpec::string().describe("Natural language command to execute"),
    )
}

/// Register the built-in tools and seed their default permission rows.
pub async fn install_builtin_tools(
    registry: &ToolRegistry,
    permissions: &PermissionTable,
    client: Arc<dyn CompletionClient>,
) -> Result<()> {
    registry
        .register(file_system_spec(), Arc::new(FileSystemTool))
        .await?;
    registry
        .register(system_control_spec(), Arc::new(SystemControlTool))
        .await?;
    registry
        .register(
            computer_control_spec(),
            Arc::new(ComputerControlTool::new(client)),
        )
        .await?;

    for tool in ["fileSystem", "systemControl", "computerControl"] {
        permissions.seed_defaults(tool).await;
    }

    tracing::info!("installed built-in tools");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct ScriptedClient(String);

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            _history: &[ChatMessage],
            _system: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn file_system_write_read_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let path_str = path.to_string_lossy().into_owned();
        let tool = FileSystemTool;

        let written = tool
            .run(args(json!({
                "operation": "write",
                "path": path_str,
                "content": "hello",
            })))
            .await
            .unwrap();
        assert_eq!(written, json!("File written successfully"));

        let read = tool
            .run(args(json!({"operation": "read", "path": path_str})))
            .await
            .unwrap();
        assert_eq!(read, json!("hello"));

        let listed = tool
            .run(args(json!({
                "operation": "list",
                "path": dir.path().to_string_lossy(),
            })))
            .await
            .unwrap();
        assert_eq!(listed, json!(["note.txt"]));

        let deleted = tool
            .run(args(json!({"operation": "delete", "path": path_str})))
            .await
            .unwrap();
        assert_eq!(deleted, json!("File deleted successfully"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn file_system_read_missing_file_fails() {
        let tool = FileSystemTool;
        let result = tool
            .run(args(json!({
                "operation": "read",
                "path": "/definitely/not/a/real/path.txt",
            })))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn file_system_rejects_unknown_operation() {
        let tool = FileSystemTool;
        let err = tool
            .run(args(json!({"operation": "move", "path": "/tmp/x"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid operation"));
    }

    #[tokio::test]
    async fn system_control_runs_command() {
        let tool = SystemControlTool;
        let out = tool.run(args(json!({"command": "df"}))).await.unwrap();
        assert!(!out.as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn system_control_missing_binary_fails() {
        let result = run_command("steward-no-such-binary").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn computer_control_executes_interpreted_command() {
        let tool = ComputerControlTool::new(Arc::new(ScriptedClient("pwd\n".to_string())));
        let out = tool
            .run(args(json!({"command": "show the current directory"})))
            .await
            .unwrap();
        assert!(!out.as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn computer_control_rejects_unsafe_interpretation() {
        let tool = ComputerControlTool::new(Arc::new(ScriptedClient("rm -rf /".to_string())));
        let err = tool
            .run(args(json!({"command": "delete everything"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid or unsafe command"));
    }

    #[tokio::test]
    async fn install_registers_tools_and_seeds_permissions() {
        let registry = ToolRegistry::new();
        let permissions = PermissionTable::new();
        install_builtin_tools(
            &registry,
            &permissions,
            Arc::new(ScriptedClient(String::new())),
        )
        .await
        .unwrap();

        assert_eq!(registry.len().await, 3);
        let prompt = registry.prompt_block().await;
        for name in ["fileSystem", "systemControl", "computerControl"] {
            assert!(prompt.contains(name));
            assert!(
                permissions
                    .check(name, crate::tools::ADMIN_ROLE, crate::tools::PermissionKind::Delete)
                    .await
            );
            assert!(
                permissions
                    .check(name, crate::tools::USER_ROLE, crate::tools::PermissionKind::Execute)
                    .await
            );
        }
    }
}
