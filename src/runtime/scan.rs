//! Scan dispatch: run the enumeration script in every testable container.

use std::sync::Arc;
use tracing::{debug, warn};

use super::executor::{RemoteExecutor, command_args};
use super::sink::{LogSink, StatusMessage};
use crate::cli::OutputFormat;
use crate::script::normalize_line_endings;
use crate::types::{CapabilityResult, ScanResult};

/// Runs the script in one container per call.
pub struct ScanDispatcher {
    executor: Arc<dyn RemoteExecutor>,
    sink: Arc<dyn LogSink>,
    format: OutputFormat,
    script: Vec<u8>,
}

impl ScanDispatcher {
    /// The script's line endings are normalised once, here.
    pub fn new(
        executor: Arc<dyn RemoteExecutor>,
        sink: Arc<dyn LogSink>,
        format: OutputFormat,
        script: &[u8],
    ) -> Self {
        Self {
            executor,
            sink,
            format,
            script: normalize_line_endings(script),
        }
    }

    /// Command that feeds the script to `shell` over stdin.
    ///
    /// Plain text needs the script's `-c` flag, so the shell is told to read
    /// the program from stdin (`-s`) and pass the remaining arguments on.
    pub fn invocation(shell: &str, format: OutputFormat) -> Vec<String> {
        if format.is_plain_text() {
            command_args(&format!("{shell} -s -- -c"))
        } else {
            command_args(shell)
        }
    }

    /// Scan one container. `None` when the remote execution failed.
    pub async fn scan(&self, target: CapabilityResult) -> Option<ScanResult> {
        let command = Self::invocation(&target.shell, self.format);
        let container = target.container;
        debug!(pod = %container.pod, container = %container.container, ?command, "running script");

        let reason = match self
            .executor
            .exec(&container, &command, Some(self.script.clone()))
            .await
        {
            Ok(output) if output.status.is_success() => {
                return Some(ScanResult {
                    container,
                    raw_output: output.stdout,
                });
            }
            Ok(output) => output.error_text(),
            Err(e) => e.to_string(),
        };

        warn!(pod = %container.pod, container = %container.container, %reason, "script execution failed");
        self.sink
            .send(StatusMessage::warn(format!(
                "[{}:{}] enumeration failed: {}",
                container.pod, container.container, reason
            )))
            .await;
        None
    }
}
