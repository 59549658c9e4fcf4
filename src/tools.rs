use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use agent_config::PermissionGate;
use thiserror::Error;
use wait_timeout::ChildExt;

use crate::logging::DisplaySink;

/// Default wall-clock budget for one `run_code` invocation.
pub const DEFAULT_RUN_CODE_TIMEOUT: Duration = Duration::from_secs(300);
const STDERR_EXCERPT_MAX_BYTES: usize = 500;

/// One parsed tool invocation, ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    WriteFile { path: String, content: String },
    RunCode { command: String },
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WriteFile { .. } => "write_file",
            Self::RunCode { .. } => "run_code",
        }
    }

    /// Argument names only; values may be large or sensitive.
    pub fn describe(&self) -> String {
        match self {
            Self::WriteFile { path, .. } => format!("write_file with args: path={path}, content=..."),
            Self::RunCode { .. } => "run_code with args: command=...".to_string(),
        }
    }
}

/// Transcript-facing result of one tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub ok: bool,
    pub content: String,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            ok: true,
            content: content.into(),
        }
    }

    pub fn fail(content: impl Into<String>) -> Self {
        Self {
            ok: false,
            content: content.into(),
        }
    }
}

/// Typed failure taxonomy for tool execution. Every variant is returned as
/// a value; the orchestrator only ever sees a [`ToolOutput`].
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{action} is blocked by permissions. Change permissions.json to enable.")]
    PermissionDenied { action: &'static str },

    #[error("Invalid path '{path}'. Path must be relative and inside the project folder.")]
    InvalidPath { path: String },

    #[error("Failed to write file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch command: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {timeout_sec}s")]
    Timeout { timeout_sec: u64 },

    #[error("Command failed (Code {exit_label}).\n{stderr_excerpt}\nOutput:\n{stdout}")]
    CommandFailed {
        exit_label: String,
        stderr_excerpt: String,
        stdout: String,
    },
}

/// Execution seam between the agent loop and side effects.
pub trait ToolExecutor {
    fn execute(&mut self, call: ToolCall) -> ToolOutput;
}

/// Executor confined to a single sandbox root directory.
///
/// The permission gate is consulted on every call, never cached: the
/// backing file may be edited between turns. The executor itself holds no
/// mutable state across calls.
pub struct SandboxToolExecutor {
    sandbox_root: PathBuf,
    permissions: Arc<dyn PermissionGate>,
    display: Arc<dyn DisplaySink>,
    run_code_timeout: Duration,
}

impl SandboxToolExecutor {
    pub fn new(
        sandbox_root: impl Into<PathBuf>,
        permissions: Arc<dyn PermissionGate>,
        display: Arc<dyn DisplaySink>,
    ) -> std::io::Result<Self> {
        let sandbox_root = sandbox_root.into();
        fs::create_dir_all(&sandbox_root)?;
        let sandbox_root = sandbox_root.canonicalize()?;

        Ok(Self {
            sandbox_root,
            permissions,
            display,
            run_code_timeout: DEFAULT_RUN_CODE_TIMEOUT,
        })
    }

    pub fn with_run_code_timeout(mut self, timeout: Duration) -> Self {
        self.run_code_timeout = timeout;
        self
    }

    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    /// Writes `content` verbatim to `path` under the sandbox root, creating
    /// missing parent directories and overwriting existing files.
    pub fn write_file(&self, path: &str, content: &str) -> Result<String, ToolError> {
        if !self.permissions.is_allowed("allow_file_io") {
            return Err(ToolError::PermissionDenied { action: "File I/O" });
        }

        validate_sandbox_relative(path)?;
        let full_path = self.sandbox_root.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ToolError::Io {
                path: path.to_string(),
                source,
            })?;
        }

        fs::write(&full_path, content).map_err(|source| ToolError::Io {
            path: path.to_string(),
            source,
        })?;

        self.display
            .write_line(&format!("[TOOL:INFO] File written successfully: {path}"));
        Ok(format!("File written: {path}"))
    }

    /// Runs `command` through the shell with the sandbox root as working
    /// directory, bounded by the configured timeout.
    pub fn run_code(&self, command: &str) -> Result<String, ToolError> {
        if !self.permissions.is_allowed("allow_code_execution") {
            return Err(ToolError::PermissionDenied {
                action: "Code execution",
            });
        }

        self.display
            .write_line(&format!("[TOOL:EXEC] Running command: '{command}'"));

        let mut child = Command::new("bash")
            .arg("-c")
            .arg(command)
            .current_dir(&self.sandbox_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn { source })?;

        let status = match child.wait_timeout(self.run_code_timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::Timeout {
                    timeout_sec: self.run_code_timeout.as_secs(),
                });
            }
            Err(source) => {
                let _ = child.kill();
                return Err(ToolError::Spawn { source });
            }
        };

        let stdout = read_pipe_text(child.stdout.take());
        let stderr = read_pipe_text(child.stderr.take());

        if status.success() {
            self.display
                .write_line("[TOOL:SUCCESS] Command executed (Code 0).");
            Ok(format!("OUTPUT:\n{}", stdout.trim()))
        } else {
            Err(ToolError::CommandFailed {
                exit_label: format_exit_status(status),
                stderr_excerpt: stderr_excerpt(&stderr),
                stdout: stdout.trim().to_string(),
            })
        }
    }
}

impl ToolExecutor for SandboxToolExecutor {
    fn execute(&mut self, call: ToolCall) -> ToolOutput {
        let result = match &call {
            ToolCall::WriteFile { path, content } => self.write_file(path, content),
            ToolCall::RunCode { command } => self.run_code(command),
        };

        match result {
            Ok(message) => ToolOutput::ok(format!("TOOL:SUCCESS: {message}")),
            Err(error) => {
                self.display
                    .write_line(&format!("[TOOL:ERROR] {} failed: {error}", call.name()));
                ToolOutput::fail(format!("TOOL:ERROR: {error}"))
            }
        }
    }
}

fn validate_sandbox_relative(path: &str) -> Result<(), ToolError> {
    let invalid = || ToolError::InvalidPath {
        path: path.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid());
    }

    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Err(invalid());
    }

    for component in candidate.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid());
            }
        }
    }

    Ok(())
}

fn read_pipe_text(pipe: Option<impl Read>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };

    let mut bytes = Vec::new();
    let _ = pipe.read_to_end(&mut bytes);
    String::from_utf8_lossy(&bytes).into_owned()
}

fn stderr_excerpt(stderr: &str) -> String {
    if stderr.len() > STDERR_EXCERPT_MAX_BYTES {
        let mut cutoff = STDERR_EXCERPT_MAX_BYTES;
        while cutoff > 0 && !stderr.is_char_boundary(cutoff) {
            cutoff -= 1;
        }
        format!("Stderr (Truncated):\n{}...", &stderr[..cutoff])
    } else {
        format!("Stderr:\n{stderr}")
    }
}

fn format_exit_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => code.to_string(),
        None => "terminated_by_signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;

    use agent_config::PermissionSet;

    use super::{SandboxToolExecutor, ToolCall, ToolError, ToolExecutor};
    use crate::logging::MemoryDisplay;

    fn executor_with(permissions: PermissionSet) -> (tempfile::TempDir, SandboxToolExecutor) {
        let dir = tempfile::tempdir().expect("tempdir");
        let executor = SandboxToolExecutor::new(
            dir.path().join("sandbox"),
            Arc::new(permissions),
            Arc::new(MemoryDisplay::default()),
        )
        .expect("executor should construct");
        (dir, executor)
    }

    fn executor() -> (tempfile::TempDir, SandboxToolExecutor) {
        executor_with(PermissionSet::default())
    }

    #[test]
    fn write_file_creates_parents_and_reports_relative_path() {
        let (_dir, mut executor) = executor();

        let output = executor.execute(ToolCall::WriteFile {
            path: "nested/dir/hello.txt".to_string(),
            content: "Hi".to_string(),
        });

        assert!(output.ok);
        assert_eq!(output.content, "TOOL:SUCCESS: File written: nested/dir/hello.txt");
        let written = fs::read_to_string(executor.sandbox_root().join("nested/dir/hello.txt"))
            .expect("file should exist");
        assert_eq!(written, "Hi");
    }

    #[test]
    fn write_file_overwrites_existing_content() {
        let (_dir, executor) = executor();

        executor.write_file("a.txt", "first").expect("first write");
        executor.write_file("a.txt", "second").expect("second write");

        let written =
            fs::read_to_string(executor.sandbox_root().join("a.txt")).expect("file should exist");
        assert_eq!(written, "second");
    }

    #[test]
    fn parent_directory_segments_are_rejected() {
        let (dir, executor) = executor();

        let error = executor
            .write_file("../etc/passwd", "x")
            .expect_err("escape should be rejected");
        assert!(matches!(error, ToolError::InvalidPath { .. }));
        assert!(!dir.path().join("etc/passwd").exists());
    }

    #[test]
    fn absolute_paths_are_rejected() {
        let (_dir, executor) = executor();

        let error = executor
            .write_file("/etc/passwd", "x")
            .expect_err("absolute path should be rejected");
        assert!(matches!(error, ToolError::InvalidPath { .. }));
    }

    #[test]
    fn write_file_requires_file_io_permission() {
        let (_dir, mut executor) = executor_with(PermissionSet {
            allow_file_io: false,
            ..PermissionSet::default()
        });

        let output = executor.execute(ToolCall::WriteFile {
            path: "blocked.txt".to_string(),
            content: "x".to_string(),
        });

        assert!(!output.ok);
        assert!(output.content.starts_with("TOOL:ERROR: File I/O is blocked"));
        assert!(!executor.sandbox_root().join("blocked.txt").exists());
    }

    #[test]
    fn run_code_returns_trimmed_stdout_on_success() {
        let (_dir, mut executor) = executor();

        let output = executor.execute(ToolCall::RunCode {
            command: "echo hello".to_string(),
        });

        assert!(output.ok);
        assert_eq!(output.content, "TOOL:SUCCESS: OUTPUT:\nhello");
    }

    #[test]
    fn run_code_runs_in_the_sandbox_root() {
        let (_dir, executor) = executor();
        executor.write_file("marker.txt", "here").expect("seed file");

        let stdout = executor.run_code("ls").expect("ls should succeed");
        assert!(stdout.contains("marker.txt"));
    }

    #[test]
    fn run_code_failure_carries_exit_code_and_stderr() {
        let (_dir, executor) = executor();

        let error = executor
            .run_code("echo partial; echo boom >&2; exit 3")
            .expect_err("non-zero exit should fail");

        match error {
            ToolError::CommandFailed {
                exit_label,
                stderr_excerpt,
                stdout,
            } => {
                assert_eq!(exit_label, "3");
                assert!(stderr_excerpt.contains("boom"));
                assert_eq!(stdout, "partial");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn run_code_truncates_long_stderr() {
        let (_dir, executor) = executor();

        let error = executor
            .run_code("printf 'e%.0s' {1..2000} >&2; exit 1")
            .expect_err("non-zero exit should fail");

        match error {
            ToolError::CommandFailed { stderr_excerpt, .. } => {
                assert!(stderr_excerpt.starts_with("Stderr (Truncated):"));
                assert!(stderr_excerpt.len() < 600);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn run_code_times_out_with_distinct_error() {
        let (_dir, executor) = executor();
        let executor = executor.with_run_code_timeout(Duration::from_millis(200));

        let error = executor
            .run_code("sleep 5")
            .expect_err("sleep should exceed the timeout");
        assert!(matches!(error, ToolError::Timeout { .. }));
    }

    #[test]
    fn run_code_requires_code_execution_permission() {
        let (_dir, mut executor) = executor_with(PermissionSet {
            allow_code_execution: false,
            ..PermissionSet::default()
        });

        let output = executor.execute(ToolCall::RunCode {
            command: "echo hi".to_string(),
        });

        assert!(!output.ok);
        assert!(output
            .content
            .starts_with("TOOL:ERROR: Code execution is blocked"));
    }
}
