//! Remote command execution seam.
//!
//! The pipeline only needs one capability from the transport: run a command
//! in one container, optionally feeding it stdin, and report back a coarse
//! status class together with whatever was captured.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::ContainerRef;

/// Coarse outcome of a remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Success,
    /// The executable does not exist in the container.
    CommandNotFound,
    /// The executable exists but could not be started.
    CannotExecute,
    /// The command ran and exited with a non-zero code.
    Failed(i32),
}

impl ExecStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the status proves the command is unavailable in the container.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::CommandNotFound | Self::CannotExecute)
    }
}

/// Captured result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub status: ExecStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ExecOutput {
    pub fn new(status: ExecStatus) -> Self {
        Self {
            status,
            stdout: Vec::new(),
            stderr: String::new(),
        }
    }

    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: ExecStatus::Success,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Best available description of a failure.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            ExecStatus::Success => String::new(),
            ExecStatus::CommandNotFound => "command not found".to_string(),
            ExecStatus::CannotExecute => "command cannot be executed".to_string(),
            ExecStatus::Failed(code) => format!("command exited with code {code}"),
        }
    }
}

/// Transport-level failure: the command never got a status at all.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on exec stream for {target}: {source}")]
    Stream {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one command in one container.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn exec(
        &self,
        target: &ContainerRef,
        command: &[String],
        stdin: Option<Vec<u8>>,
    ) -> Result<ExecOutput, ExecError>;
}

/// Split a probe command such as `"stat /bin/cat"` into its arguments.
pub fn command_args(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
