//! Pipeline orchestration.
//!
//! A run moves through the stages strictly in order: probing completes and
//! is classified before the gate is consulted, and scanning starts only
//! after a positive answer. Each stage fans out internally.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::context::RunContext;
use super::executor::RemoteExecutor;
use super::gate::{AutoProceed, ConfirmationGate};
use super::pool::{StageSizing, available_parallelism, run_stage};
use super::probe::{CapabilityProber, Classification, probe_all};
use super::scan::ScanDispatcher;
use super::sink::{LogSink, StatusMessage};
use crate::error::{LseError, Result};
use crate::reporter::ReportWriter;
use crate::reporter::table::container_columns;
use crate::types::{CapabilityResult, ContainerRef};

/// A stage in the enumeration pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Shell and utility probing.
    Probe,
    /// Partition into testable / nontestable.
    Classify,
    /// Confirmation gate.
    Confirm,
    /// Script execution.
    Scan,
    /// Report persistence.
    Report,
}

impl PipelineStage {
    /// Get the next stage in the pipeline.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Probe => Some(Self::Classify),
            Self::Classify => Some(Self::Confirm),
            Self::Confirm => Some(Self::Scan),
            Self::Scan => Some(Self::Report),
            Self::Report => None,
        }
    }

    /// Get the stage name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Classify => "classify",
            Self::Confirm => "confirm",
            Self::Scan => "scan",
            Self::Report => "report",
        }
    }
}

/// Counts describing one completed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub testable: usize,
    pub nontestable: usize,
    pub reports_written: usize,
    pub scans_failed: usize,
    pub writes_failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Saved {} of {} reports ({} scans failed, {} writes failed)",
            self.reports_written, self.testable, self.scans_failed, self.writes_failed
        )
    }
}

/// One enumeration run over an already discovered container list.
pub struct Pipeline {
    context: RunContext,
    executor: Arc<dyn RemoteExecutor>,
    sink: Arc<dyn LogSink>,
    gate: Arc<dyn ConfirmationGate>,
}

impl Pipeline {
    /// Create a pipeline that proceeds without asking.
    pub fn new(
        context: RunContext,
        executor: Arc<dyn RemoteExecutor>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            context,
            executor,
            sink,
            gate: Arc::new(AutoProceed),
        }
    }

    /// Gate consulted before scanning. Ignored in quiet mode.
    pub fn with_gate(mut self, gate: Arc<dyn ConfirmationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub async fn run(&self, containers: Vec<ContainerRef>) -> Result<RunSummary> {
        if containers.is_empty() {
            return Err(LseError::NoContainersFound {
                namespace: self.context.namespace.clone(),
            });
        }

        let mut summary = RunSummary {
            discovered: containers.len(),
            ..Default::default()
        };
        self.sink
            .send(StatusMessage::info(format!(
                "Found {} containers in {} namespace",
                containers.len(),
                self.context.namespace
            )))
            .await;

        self.enter(PipelineStage::Probe);
        let classification = self.probe(containers).await;

        self.enter(PipelineStage::Classify);
        summary.testable = classification.testable.len();
        summary.nontestable = classification.nontestable.len();
        self.announce(&classification).await;
        if classification.testable.is_empty() {
            return Err(LseError::NothingToTest);
        }

        self.enter(PipelineStage::Confirm);
        if !self.context.quiet {
            if !self.gate.confirm(self.sink.as_ref()).await? {
                return Err(LseError::Cancelled);
            }
            self.sink
                .send(StatusMessage::Line("Proceeding with testing...".to_string()))
                .await;
        }

        self.enter(PipelineStage::Scan);
        let targets = classification.testable;
        let sizing = StageSizing::new(targets.len(), self.context.workers)
            .with_input_capacity(available_parallelism() * 2)
            .with_output_capacity(available_parallelism() * 2);
        let dispatcher = Arc::new(ScanDispatcher::new(
            Arc::clone(&self.executor),
            Arc::clone(&self.sink),
            self.context.format,
            &self.context.script,
        ));
        let writer = ReportWriter::new(
            self.context.directory.clone(),
            self.context.format,
            Arc::clone(&self.sink),
        );

        let work = move |target: CapabilityResult| {
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.scan(target).await }
        };
        let tally = run_stage(targets, sizing, work, move |rx| writer.consume(rx)).await;
        self.enter(PipelineStage::Report);

        summary.reports_written = tally.written;
        summary.writes_failed = tally.failed;
        summary.scans_failed = summary
            .testable
            .saturating_sub(tally.written + tally.failed);

        info!(
            discovered = summary.discovered,
            testable = summary.testable,
            reports = summary.reports_written,
            scans_failed = summary.scans_failed,
            writes_failed = summary.writes_failed,
            "run complete"
        );
        self.sink.send(StatusMessage::info(summary.to_string())).await;
        Ok(summary)
    }

    async fn probe(&self, containers: Vec<ContainerRef>) -> Classification {
        self.sink
            .send(StatusMessage::step("Identifying containers that can be tested"))
            .await;
        let prober = Arc::new(CapabilityProber::new(
            Arc::clone(&self.executor),
            Arc::clone(&self.sink),
            self.context.shells.clone(),
            self.context.utilities.clone(),
        ));
        let classification = probe_all(prober, containers, self.context.workers).await;
        self.sink
            .send(StatusMessage::info(format!(
                "Found {} containers",
                classification.total()
            )))
            .await;
        classification
    }

    async fn announce(&self, classification: &Classification) {
        if !classification.testable.is_empty() {
            self.sink
                .send(StatusMessage::info(format!(
                    "Following {} containers can be tested:",
                    classification.testable.len()
                )))
                .await;
            let columns = container_columns(classification.testable.iter().map(|r| &r.container));
            self.sink.send(StatusMessage::Raw(columns)).await;
        }
        if !classification.nontestable.is_empty() {
            self.sink
                .send(StatusMessage::warn(format!(
                    "Following {} containers cannot be tested:",
                    classification.nontestable.len()
                )))
                .await;
            let columns =
                container_columns(classification.nontestable.iter().map(|r| &r.container));
            self.sink.send(StatusMessage::Raw(columns)).await;
        }
    }

    fn enter(&self, stage: PipelineStage) {
        debug!(stage = stage.name(), namespace = %self.context.namespace, "pipeline stage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::runtime::executor::ExecOutput;
    use crate::runtime::sink::MemorySink;
    use crate::test_utils::fixtures::{RecordingGate, ScriptedExecutor};
    use std::fs;
    use tempfile::TempDir;

    fn context(dir: &TempDir, utilities: &[&str]) -> RunContext {
        RunContext::new("test", dir.path())
            .with_utilities(utilities.iter().map(|s| s.to_string()).collect())
            .with_script(b"echo hi\n".to_vec())
    }

    fn three_container_executor() -> ScriptedExecutor {
        ScriptedExecutor::new()
            .healthy("p1", "c1", &["stat A", "stat B"])
            .respond("p1", "c1", "sh", ExecOutput::success("report p1/c1"))
            .respond("p1", "c2", "sh --version", ExecOutput::success(""))
            .respond("p1", "c2", "stat A", ExecOutput::success(""))
            .respond("p2", "c1", "stat A", ExecOutput::success(""))
            .respond("p2", "c1", "stat B", ExecOutput::success(""))
    }

    fn three_containers() -> Vec<ContainerRef> {
        vec![
            ContainerRef::new("p1", "c1"),
            ContainerRef::new("p1", "c2"),
            ContainerRef::new("p2", "c1"),
        ]
    }

    #[test]
    fn test_stage_next_chain() {
        let mut stage = PipelineStage::Probe;
        let mut names = vec![stage.name()];
        while let Some(next) = stage.next() {
            stage = next;
            names.push(stage.name());
        }
        assert_eq!(names, vec!["probe", "classify", "confirm", "scan", "report"]);
    }

    #[tokio::test]
    async fn test_three_container_scenario() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(three_container_executor());
        let sink = Arc::new(MemorySink::new());
        let gate = Arc::new(RecordingGate::answering(true));

        let pipeline = Pipeline::new(
            context(&dir, &["stat A", "stat B"]),
            executor.clone(),
            sink.clone(),
        )
        .with_gate(gate.clone());
        let summary = pipeline.run(three_containers()).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                discovered: 3,
                testable: 1,
                nontestable: 2,
                reports_written: 1,
                scans_failed: 0,
                writes_failed: 0,
            }
        );
        assert_eq!(gate.times_asked(), 1);

        let reports: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("p1-c1-"));
        assert!(reports[0].ends_with(".ansi"));

        // only the testable container is scanned
        assert!(executor.was_called("p1", "c1", "sh"));
        assert!(!executor.was_called("p1", "c2", "sh"));
        assert!(!executor.was_called("p2", "c1", "sh"));

        assert!(sink.contains("Following 1 containers can be tested:"));
        assert!(sink.contains("Following 2 containers cannot be tested:"));
        assert!(sink.contains("Proceeding with testing..."));
        assert!(sink.contains("Analyzed 1 containers"));
    }

    #[tokio::test]
    async fn test_quiet_transport_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(
            ScriptedExecutor::new()
                .healthy("p1", "c1", &["stat A"])
                .fail_transport("p1", "c1", "sh"),
        );
        let sink = Arc::new(MemorySink::new());
        let gate = Arc::new(RecordingGate::answering(false));

        let pipeline = Pipeline::new(
            context(&dir, &["stat A"]).with_quiet(true),
            executor,
            sink.clone(),
        )
        .with_gate(gate.clone());
        let summary = pipeline
            .run(vec![ContainerRef::new("p1", "c1")])
            .await
            .unwrap();

        assert_eq!(summary.reports_written, 0);
        assert_eq!(summary.scans_failed, 1);
        assert_eq!(gate.times_asked(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        let failures = sink
            .messages()
            .iter()
            .filter(|m| m.text().contains("enumeration failed"))
            .count();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_empty_container_list_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(ScriptedExecutor::new());
        let pipeline = Pipeline::new(
            context(&dir, &["stat A"]),
            executor.clone(),
            Arc::new(MemorySink::new()),
        );

        let err = pipeline.run(Vec::new()).await.unwrap_err();
        assert!(matches!(err, LseError::NoContainersFound { ref namespace } if namespace == "test"));
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_utilities_is_nothing_to_test() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(three_container_executor());
        let pipeline = Pipeline::new(
            context(&dir, &[]),
            executor.clone(),
            Arc::new(MemorySink::new()),
        );

        let err = pipeline.run(three_containers()).await.unwrap_err();
        assert!(matches!(err, LseError::NothingToTest));
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_declined_gate_cancels_before_scanning() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(three_container_executor());
        let pipeline = Pipeline::new(
            context(&dir, &["stat A", "stat B"]),
            executor.clone(),
            Arc::new(MemorySink::new()),
        )
        .with_gate(Arc::new(RecordingGate::answering(false)));

        let err = pipeline.run(three_containers()).await.unwrap_err();
        assert!(matches!(err, LseError::Cancelled));
        assert!(!executor.was_called("p1", "c1", "sh"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_html_reports_for_many_containers() {
        let dir = TempDir::new().unwrap();
        let mut executor = ScriptedExecutor::new();
        let mut containers = Vec::new();
        for i in 0..12 {
            let pod = format!("pod-{i}");
            executor = executor
                .healthy(&pod, "app", &["stat A"])
                .respond(&pod, "app", "sh", ExecOutput::success("\x1b[31mred\x1b[0m"));
            containers.push(ContainerRef::new(pod, "app"));
        }

        let pipeline = Pipeline::new(
            context(&dir, &["stat A"])
                .with_quiet(true)
                .with_workers(4)
                .with_format(OutputFormat::Html),
            Arc::new(executor),
            Arc::new(MemorySink::new()),
        );
        let summary = pipeline.run(containers).await.unwrap();

        assert_eq!(summary.reports_written, 12);
        for entry in fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            assert_eq!(path.extension().unwrap(), "html");
            let body = fs::read_to_string(&path).unwrap();
            assert!(body.contains("red"));
        }
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            testable: 3,
            reports_written: 2,
            scans_failed: 1,
            ..Default::default()
        };
        assert_eq!(
            summary.to_string(),
            "Saved 2 of 3 reports (1 scans failed, 0 writes failed)"
        );
    }
}
