//! Scan mode: discover, probe, confirm, scan, report.

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

use super::{HandlerResult, report_error, shutdown_sink, status_sink};
use crate::config::EffectiveConfig;
use crate::error::Result;
use crate::kube::{Kubectl, Selection};
use crate::runtime::{
    ChannelSink, LogSink, Pipeline, PromptGate, RunContext, RunSummary, StatusMessage,
};

/// Run the enumeration pipeline against the selected containers.
pub async fn run_scan_mode(config: &EffectiveConfig) -> ExitCode {
    info!(namespace = %config.namespace, format = %config.format, "Starting scan");
    let (sink, consumer) = status_sink(config.quiet);

    let outcome = scan(config, sink.clone()).await;
    shutdown_sink(sink, consumer).await;

    match outcome {
        Ok(summary) => {
            debug!(?summary, "scan finished");
            HandlerResult::Success.into()
        }
        Err(e) => report_error(&e).into(),
    }
}

async fn scan(config: &EffectiveConfig, sink: ChannelSink) -> Result<RunSummary> {
    let selection = Selection::from_flags(&config.pods, &config.containers)?;
    let kubectl = Arc::new(Kubectl::from_config(config));

    sink.send(StatusMessage::info("Started")).await;
    sink.send(StatusMessage::info("Creating a list of unique pods")).await;
    let containers = kubectl.discover(&selection).await?;

    let pipeline = Pipeline::new(RunContext::from(config), kubectl, Arc::new(sink))
        .with_gate(Arc::new(PromptGate::stdin()));
    pipeline.run(containers).await
}
