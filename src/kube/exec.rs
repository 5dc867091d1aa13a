//! `kubectl exec` as the remote execution transport.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use super::Kubectl;
use crate::runtime::{ExecError, ExecOutput, ExecStatus, RemoteExecutor};
use crate::types::ContainerRef;

/// Map a finished `kubectl exec` onto a status class.
///
/// `code` is `None` when the process was killed by a signal.
pub fn classify_exit(code: Option<i32>, stderr: &str) -> ExecStatus {
    let stderr = stderr.to_lowercase();
    let start_failed = stderr.contains("exec failed") || stderr.contains("unable to start");
    match code {
        Some(0) => ExecStatus::Success,
        Some(127) => ExecStatus::CommandNotFound,
        Some(126) => ExecStatus::CannotExecute,
        _ if stderr.contains("executable file not found")
            || (start_failed && stderr.contains("no such file or directory")) =>
        {
            ExecStatus::CommandNotFound
        }
        _ if start_failed && stderr.contains("permission denied") => ExecStatus::CannotExecute,
        Some(code) => ExecStatus::Failed(code),
        None => ExecStatus::Failed(-1),
    }
}

impl Kubectl {
    /// Arguments of `kubectl exec` for one container.
    pub fn exec_args(&self, target: &ContainerRef, command: &[String], interactive: bool) -> Vec<String> {
        let mut args = vec!["exec".to_string()];
        if interactive {
            args.push("-i".to_string());
        }
        args.extend([
            target.pod.clone(),
            "-c".to_string(),
            target.container.clone(),
            "--".to_string(),
        ]);
        args.extend(command.iter().cloned());
        self.args(args)
    }
}

#[async_trait]
impl RemoteExecutor for Kubectl {
    async fn exec(
        &self,
        target: &ContainerRef,
        command: &[String],
        stdin: Option<Vec<u8>>,
    ) -> Result<ExecOutput, ExecError> {
        let args = self.exec_args(target, command, stdin.is_some());
        trace!(?args, "kubectl exec");

        let mut cmd = self.command(&args);
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: self.binary.display().to_string(),
            source,
        })?;

        // Feed stdin concurrently so a chatty script cannot fill the stdout
        // pipe while we are still writing.
        let writer = match (stdin, child.stdin.take()) {
            (Some(payload), Some(mut pipe)) => Some(tokio::spawn(async move {
                pipe.write_all(&payload).await?;
                pipe.shutdown().await
            })),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ExecError::Stream {
                target: target.to_string(),
                source,
            })?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The remote side may exit before reading everything.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!(container = %target, "stdin closed early by remote command");
                }
                Ok(Err(source)) => {
                    return Err(ExecError::Stream {
                        target: target.to_string(),
                        source,
                    });
                }
                Err(e) => {
                    return Err(ExecError::Stream {
                        target: target.to_string(),
                        source: std::io::Error::other(e),
                    });
                }
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let status = classify_exit(output.status.code(), &stderr);
        debug!(container = %target, ?command, ?status, "kubectl exec finished");

        Ok(ExecOutput {
            status,
            stdout: output.stdout,
            stderr,
        })
    }
}
