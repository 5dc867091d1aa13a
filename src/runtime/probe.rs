//! Capability probing: which containers can run the enumeration script.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::executor::{RemoteExecutor, command_args};
use super::pool::{StageSizing, available_parallelism, run_stage};
use super::sink::{LogSink, StatusMessage};
use crate::types::{CapabilityResult, ContainerRef};

/// Probes one container at a time for a shell and the required utilities.
pub struct CapabilityProber {
    executor: Arc<dyn RemoteExecutor>,
    sink: Arc<dyn LogSink>,
    shells: Vec<String>,
    utilities: Vec<String>,
}

impl CapabilityProber {
    pub fn new(
        executor: Arc<dyn RemoteExecutor>,
        sink: Arc<dyn LogSink>,
        shells: Vec<String>,
        utilities: Vec<String>,
    ) -> Self {
        Self {
            executor,
            sink,
            shells,
            utilities,
        }
    }

    pub fn utilities(&self) -> &[String] {
        &self.utilities
    }

    /// Probe one container. Failures are folded into the result, never raised.
    pub async fn probe(&self, target: &ContainerRef) -> CapabilityResult {
        let shell = self.detect_shell(target).await;
        let utilities_present = self.utilities_present(target).await;
        let result = CapabilityResult::new(target.clone(), shell, utilities_present);
        debug!(
            pod = %target.pod,
            container = %target.container,
            shell = %result.shell,
            testable = result.testable,
            "probed container"
        );
        result
    }

    /// First candidate shell whose `--version` probe succeeds.
    async fn detect_shell(&self, target: &ContainerRef) -> Option<String> {
        let mut last_error = None;
        for shell in &self.shells {
            let command = vec![shell.clone(), "--version".to_string()];
            match self.executor.exec(target, &command, None).await {
                Ok(output) if output.status.is_success() => return Some(shell.clone()),
                Ok(output) => last_error = Some(output.error_text()),
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        let reason = last_error.unwrap_or_else(|| "no candidate shells configured".to_string());
        warn!(pod = %target.pod, container = %target.container, %reason, "no usable shell");
        self.sink
            .send(StatusMessage::warn(format!(
                "[{}:{}] no usable shell: {}",
                target.pod, target.container, reason
            )))
            .await;
        None
    }

    /// Stops at the first missing utility.
    async fn utilities_present(&self, target: &ContainerRef) -> bool {
        for utility in &self.utilities {
            if !self.utility_present(target, utility).await {
                return false;
            }
        }
        true
    }

    /// A utility counts as present unless the transport failed or the
    /// command is reported as not found / not executable.
    async fn utility_present(&self, target: &ContainerRef, utility: &str) -> bool {
        let reason = match self.executor.exec(target, &command_args(utility), None).await {
            Ok(output) if !output.status.is_unavailable() => return true,
            Ok(output) => output.error_text(),
            Err(e) => e.to_string(),
        };

        warn!(pod = %target.pod, container = %target.container, utility, %reason, "utility probe failed");
        self.sink
            .send(StatusMessage::warn(format!(
                "[{}:{}] {:?} failed: {}",
                target.pod, target.container, utility, reason
            )))
            .await;
        false
    }
}

/// Probe results split by testability, in completion order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    pub testable: Vec<CapabilityResult>,
    pub nontestable: Vec<CapabilityResult>,
}

impl Classification {
    pub fn push(&mut self, result: CapabilityResult) {
        if result.testable {
            self.testable.push(result);
        } else {
            self.nontestable.push(result);
        }
    }

    pub fn total(&self) -> usize {
        self.testable.len() + self.nontestable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Drain the prober output queue to completion.
    pub async fn collect(mut rx: mpsc::Receiver<CapabilityResult>) -> Self {
        let mut classification = Self::default();
        while let Some(result) = rx.recv().await {
            classification.push(result);
        }
        classification
    }
}

/// Probe every container concurrently and classify the results.
///
/// With no utility probes configured nothing is probed and the
/// classification is empty.
pub async fn probe_all(
    prober: Arc<CapabilityProber>,
    containers: Vec<ContainerRef>,
    ceiling: usize,
) -> Classification {
    if prober.utilities().is_empty() || containers.is_empty() {
        return Classification::default();
    }

    let sizing = StageSizing::new(containers.len(), ceiling)
        .with_output_capacity(available_parallelism());
    let work = move |target: ContainerRef| {
        let prober = Arc::clone(&prober);
        async move { Some(prober.probe(&target).await) }
    };

    run_stage(containers, sizing, work, Classification::collect).await
}
