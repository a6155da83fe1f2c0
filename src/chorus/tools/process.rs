//! Subprocess execution and lint adapter.
//!
//! Runs caller-provided source through configured command lines — an
//! interpreter for `execute`, a linter for `lint` — the way an agent
//! would shell out to `python3` and `pylint`. The source is written to a
//! uniquely-named scratch file, the command gets the file path as its last
//! argument, and the child is killed when the per-call deadline expires.
//!
//! Operations:
//!
//! - `execute {source}` → `{stdout, stderr, exit_status}` — a non-zero
//!   exit status is data, not a failure; only spawn errors and timeouts
//!   fail the call.
//! - `lint {source}` → `{diagnostics: [..]}` — one entry per non-empty
//!   output line; an empty list means clean.
//!
//! # Example
//!
//! ```rust,no_run
//! use chorus::tools::ProcessTool;
//! use chorus::tool::{ToolAdapter, ToolRequest};
//! use serde_json::json;
//!
//! # async {
//! let tool = ProcessTool::new(vec!["python3".into()])
//!     .with_linter(vec!["pylint".into(), "--disable=all".into(), "--enable=E".into()])
//!     .with_extension("py");
//!
//! let run = tool
//!     .call(ToolRequest::new("execute", json!({"source": "print(40 + 2)"})))
//!     .await
//!     .unwrap();
//! assert_eq!(run["exit_status"], 0);
//! # };
//! ```

use crate::chorus::tool::{ToolAdapter, ToolFailure, ToolOutcome, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes and lints source snippets via configured subprocess commands.
pub struct ProcessTool {
    interpreter: Vec<String>,
    linter: Option<Vec<String>>,
    scratch_dir: PathBuf,
    extension: String,
    timeout: Duration,
}

impl ProcessTool {
    /// Create a tool that executes source with the given argv prefix
    /// (e.g. `["python3"]`). The scratch file path is appended as the final
    /// argument.
    pub fn new(interpreter: Vec<String>) -> Self {
        Self {
            interpreter,
            linter: None,
            scratch_dir: std::env::temp_dir(),
            extension: "txt".into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Configure the lint command argv prefix (builder pattern). Without
    /// one, `lint` calls fail with [`ToolFailure::InvalidInput`].
    pub fn with_linter(mut self, linter: Vec<String>) -> Self {
        self.linter = Some(linter);
        self
    }

    /// Directory for scratch files (builder pattern). Defaults to the
    /// system temp directory.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// File extension for scratch files (builder pattern), so interpreters
    /// that sniff extensions behave.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Override the per-call deadline (builder pattern).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_command(
        &self,
        argv: &[String],
        source: &str,
    ) -> Result<std::process::Output, ToolFailure> {
        let program = argv.first().ok_or_else(|| {
            ToolFailure::InvalidInput("empty command line configured".into())
        })?;

        let scratch = self.scratch_dir.join(format!(
            "chorus-{}.{}",
            uuid::Uuid::new_v4(),
            self.extension
        ));
        tokio::fs::write(&scratch, source).await.map_err(|e| {
            ToolFailure::NonZeroStatus(format!(
                "could not write scratch file {}: {}",
                scratch.display(),
                e
            ))
        })?;

        let mut command = Command::new(program);
        command
            .args(&argv[1..])
            .arg(&scratch)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!("process: {} {}", program, scratch.display());
        let outcome = tokio::time::timeout(self.timeout, command.output()).await;
        let _ = tokio::fs::remove_file(&scratch).await;

        match outcome {
            Err(_) => Err(ToolFailure::Timeout(format!(
                "'{}' after {:?}",
                program, self.timeout
            ))),
            Ok(Err(e)) => Err(ToolFailure::NonZeroStatus(format!(
                "could not spawn '{}': {}",
                program, e
            ))),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

#[async_trait]
impl ToolAdapter for ProcessTool {
    fn name(&self) -> &str {
        "process"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        let source = request.params["source"]
            .as_str()
            .ok_or_else(|| ToolFailure::InvalidInput("missing string parameter 'source'".into()))?;

        match request.operation.as_str() {
            "execute" => {
                let output = self.run_command(&self.interpreter, source).await?;
                Ok(json!({
                    "stdout": String::from_utf8_lossy(&output.stdout),
                    "stderr": String::from_utf8_lossy(&output.stderr),
                    "exit_status": output.status.code().unwrap_or(-1),
                }))
            }
            "lint" => {
                let linter = self.linter.as_ref().ok_or_else(|| {
                    ToolFailure::InvalidInput("no lint command configured".into())
                })?;
                let output = self.run_command(linter, source).await?;
                // Linters report on stdout (pylint) or stderr (shells);
                // collect both.
                let diagnostics: Vec<String> = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .chain(String::from_utf8_lossy(&output.stderr).lines())
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(json!({ "diagnostics": diagnostics }))
            }
            other => Err(ToolFailure::InvalidInput(format!(
                "process has no operation '{}'",
                other
            ))),
        }
    }
}
