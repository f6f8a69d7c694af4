use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::errors::{ToolError, ToolResult};
use crate::models::tool::Tool;

/// list_files truncates silently past this many entries.
const MAX_LISTED_FILES: usize = 50;
const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(10);

/// The fixed catalog of local actions the model may request.
///
/// Execution never surfaces an error to the caller: every outcome is
/// folded into a serialized `{"success": ...}` payload suitable for
/// re-insertion into the conversation as text.
pub struct Toolkit {
    tools: Vec<Tool>,
    exec_timeout: Duration,
}

impl Default for Toolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolkit {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_EXEC_TIMEOUT)
    }

    /// The subprocess wall-clock limit is a parameter so tests can use a
    /// short one.
    pub fn with_timeout(exec_timeout: Duration) -> Self {
        let tools = vec![
            Tool::new(
                "read_file",
                "Read the contents of a file",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Path to the file to read"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            Tool::new(
                "write_file",
                "Write content to a file",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Path to the file to write"
                        },
                        "content": {
                            "type": "string",
                            "description": "Content to write to the file"
                        }
                    },
                    "required": ["file_path", "content"]
                }),
            ),
            Tool::new(
                "list_files",
                "List files in a directory",
                json!({
                    "type": "object",
                    "properties": {
                        "directory": {
                            "type": "string",
                            "description": "Directory path (default: current directory)"
                        }
                    },
                    "required": []
                }),
            ),
            Tool::new(
                "execute_python",
                "Execute Python code",
                json!({
                    "type": "object",
                    "properties": {
                        "code": {
                            "type": "string",
                            "description": "Python code to execute"
                        }
                    },
                    "required": ["code"]
                }),
            ),
            Tool::new(
                "bash_command",
                "Execute bash command",
                json!({
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "Bash command to execute"
                        }
                    },
                    "required": ["command"]
                }),
            ),
        ];

        Self {
            tools,
            exec_timeout,
        }
    }

    /// Declarations to advertise to the provider.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Execute a named tool and serialize the outcome.
    pub async fn dispatch(&self, name: &str, args: &Value) -> String {
        let result = match name {
            "read_file" => self.read_file(str_arg(args, "file_path")).await,
            "write_file" => {
                self.write_file(str_arg(args, "file_path"), str_arg(args, "content"))
                    .await
            }
            "list_files" => {
                let directory = args
                    .get("directory")
                    .and_then(|v| v.as_str())
                    .unwrap_or(".");
                self.list_files(directory).await
            }
            "execute_python" => self.execute_python(str_arg(args, "code")).await,
            "bash_command" => self.bash_command(str_arg(args, "command")).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        };

        render_result(result)
    }

    async fn read_file(&self, file_path: &str) -> ToolResult<Value> {
        let path = Path::new(file_path);
        if !path.exists() {
            return Err(ToolError::Execution(format!("File not found: {file_path}")));
        }
        if !path.is_file() {
            return Err(ToolError::InvalidParameters(format!(
                "Not a file: {file_path}"
            )));
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok(json!({ "content": content }))
    }

    async fn write_file(&self, file_path: &str, content: &str) -> ToolResult<Value> {
        let path = Path::new(file_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ToolError::Execution(e.to_string()))?;
            }
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok(json!({ "message": format!("File written: {file_path}") }))
    }

    async fn list_files(&self, directory: &str) -> ToolResult<Value> {
        let root = PathBuf::from(directory);
        if !root.exists() {
            return Err(ToolError::Execution(format!(
                "Directory not found: {directory}"
            )));
        }
        let mut files = Vec::new();
        collect_files(&root, &root, &mut files)
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok(json!({ "files": files }))
    }

    async fn execute_python(&self, code: &str) -> ToolResult<Value> {
        let mut command = Command::new("python3");
        command.arg("-c").arg(code);
        self.run_subprocess(command, "Code execution timeout").await
    }

    async fn bash_command(&self, shell_command: &str) -> ToolResult<Value> {
        let mut command = Command::new("bash");
        command.arg("-c").arg(shell_command);
        self.run_subprocess(command, "Command timeout").await
    }

    /// Non-zero exit is still a successful tool run; stderr is simply
    /// reported alongside stdout. A timeout kills the child (via
    /// kill_on_drop) and maps to a tool-level failure.
    async fn run_subprocess(&self, mut command: Command, timeout_label: &str) -> ToolResult<Value> {
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        let output = match timeout(self.exec_timeout, child.wait_with_output()).await {
            Ok(waited) => waited.map_err(|e| ToolError::Execution(e.to_string()))?,
            Err(_) => {
                return Err(ToolError::Timeout(format!(
                    "{} ({}s)",
                    timeout_label,
                    self.exec_timeout.as_secs()
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        Ok(json!({
            "output": stdout,
            "error": if stderr.is_empty() { Value::Null } else { Value::String(stderr) },
        }))
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn render_result(result: ToolResult<Value>) -> String {
    match result {
        Ok(Value::Object(mut map)) => {
            map.insert("success".to_string(), Value::Bool(true));
            Value::Object(map).to_string()
        }
        Ok(other) => json!({ "success": true, "result": other }).to_string(),
        Err(e) => json!({ "success": false, "error": e.to_string() }).to_string(),
    }
}

/// Depth-first walk collecting regular files relative to `root`, skipping
/// entries whose relative path starts with "." and truncating silently at
/// `MAX_LISTED_FILES`.
fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        if files.len() >= MAX_LISTED_FILES {
            return Ok(());
        }
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if relative.to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &path, files)?;
        } else if file_type.is_file() {
            files.push(relative.to_string_lossy().into_owned());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(serialized: &str) -> Value {
        serde_json::from_str(serialized).unwrap()
    }

    #[tokio::test]
    async fn test_read_file_missing_is_failure_not_panic() {
        let toolkit = Toolkit::new();
        let result = toolkit
            .dispatch("read_file", &json!({"file_path": "/no/such/file"}))
            .await;
        let value = parse(&result);
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("File not found"));
    }

    #[tokio::test]
    async fn test_read_file_on_directory() {
        let dir = tempdir().unwrap();
        let toolkit = Toolkit::new();
        let result = toolkit
            .dispatch(
                "read_file",
                &json!({"file_path": dir.path().to_str().unwrap()}),
            )
            .await;
        let value = parse(&result);
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("Not a file"));
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("nested/deep/note.txt");
        let file_path = file_path.to_str().unwrap();
        let toolkit = Toolkit::new();

        let written = toolkit
            .dispatch(
                "write_file",
                &json!({"file_path": file_path, "content": "line one\nline two"}),
            )
            .await;
        assert_eq!(parse(&written)["success"], true);

        let read = toolkit
            .dispatch("read_file", &json!({"file_path": file_path}))
            .await;
        let value = parse(&read);
        assert_eq!(value["success"], true);
        assert_eq!(value["content"], "line one\nline two");
    }

    #[tokio::test]
    async fn test_list_files_caps_at_fifty_and_skips_dotfiles() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join(".hidden/secret.txt"), "x").unwrap();
        std::fs::write(dir.path().join(".dotfile"), "x").unwrap();
        for i in 0..60 {
            std::fs::write(dir.path().join(format!("file_{i:02}.txt")), "x").unwrap();
        }

        let toolkit = Toolkit::new();
        let result = toolkit
            .dispatch(
                "list_files",
                &json!({"directory": dir.path().to_str().unwrap()}),
            )
            .await;
        let value = parse(&result);
        assert_eq!(value["success"], true);

        let files = value["files"].as_array().unwrap();
        assert_eq!(files.len(), 50);
        for file in files {
            assert!(!file.as_str().unwrap().starts_with('.'));
        }
    }

    #[tokio::test]
    async fn test_list_files_missing_directory() {
        let toolkit = Toolkit::new();
        let result = toolkit
            .dispatch("list_files", &json!({"directory": "/no/such/dir"}))
            .await;
        let value = parse(&result);
        assert_eq!(value["success"], false);
    }

    #[tokio::test]
    async fn test_list_files_defaults_to_current_directory() {
        let toolkit = Toolkit::new();
        let result = toolkit.dispatch("list_files", &json!({})).await;
        let value = parse(&result);
        assert_eq!(value["success"], true);
        assert!(value["files"].is_array());
    }

    #[tokio::test]
    async fn test_bash_command_captures_stdout() {
        let toolkit = Toolkit::new();
        let result = toolkit
            .dispatch("bash_command", &json!({"command": "echo hello"}))
            .await;
        let value = parse(&result);
        assert_eq!(value["success"], true);
        assert_eq!(value["output"], "hello\n");
        assert!(value["error"].is_null());
    }

    #[tokio::test]
    async fn test_bash_command_nonzero_exit_is_still_success() {
        let toolkit = Toolkit::new();
        let result = toolkit
            .dispatch(
                "bash_command",
                &json!({"command": "echo oops >&2; exit 3"}),
            )
            .await;
        let value = parse(&result);
        // success=false is reserved for the tool itself failing to run
        assert_eq!(value["success"], true);
        assert_eq!(value["error"], "oops\n");
    }

    #[tokio::test]
    async fn test_subprocess_timeout_kills_child() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("marker");
        let marker_str = marker.to_str().unwrap();

        let toolkit = Toolkit::with_timeout(Duration::from_millis(200));
        let result = toolkit
            .dispatch(
                "bash_command",
                &json!({"command": format!("sleep 2 && touch {marker_str}")}),
            )
            .await;
        let value = parse(&result);
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("timeout"));

        // The child was killed, so it never gets to create the marker.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_execute_python_timeout_message() {
        let toolkit = Toolkit::with_timeout(Duration::from_millis(200));
        let result = toolkit
            .dispatch(
                "execute_python",
                &json!({"code": "import time; time.sleep(5)"}),
            )
            .await;
        let value = parse(&result);
        assert_eq!(value["success"], false);
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("Code execution timeout"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let toolkit = Toolkit::new();
        let result = toolkit.dispatch("telepathy", &json!({})).await;
        let value = parse(&result);
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("Unknown tool"));
    }

    #[test]
    fn test_catalog_declares_five_tools() {
        let toolkit = Toolkit::new();
        let names: Vec<&str> = toolkit.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "read_file",
                "write_file",
                "list_files",
                "execute_python",
                "bash_command"
            ]
        );
    }
}
