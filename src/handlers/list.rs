//! List mode: show the pods and containers a scan would consider.

use std::process::ExitCode;
use tracing::info;

use super::{HandlerResult, report_error, shutdown_sink, status_sink};
use crate::config::EffectiveConfig;
use crate::error::Result;
use crate::kube::{Kubectl, Pod, Selection};
use crate::reporter::table::Table;
use crate::runtime::{ChannelSink, LogSink, StatusMessage};

pub async fn run_list_mode(config: &EffectiveConfig) -> ExitCode {
    info!(namespace = %config.namespace, "Listing containers");
    let (sink, consumer) = status_sink(config.quiet);

    let outcome = list(config, &sink).await;
    shutdown_sink(sink, consumer).await;

    match outcome {
        Ok(()) => HandlerResult::Success.into(),
        Err(e) => report_error(&e).into(),
    }
}

async fn list(config: &EffectiveConfig, sink: &ChannelSink) -> Result<()> {
    let selection = Selection::from_flags(&config.pods, &[])?;
    let kubectl = Kubectl::from_config(config);

    sink.send(StatusMessage::info("Started")).await;
    sink.send(StatusMessage::info(format!(
        "Creating a list of pods/containers for {} namespace",
        config.namespace
    )))
    .await;

    let pods = kubectl.list_pods(&selection).await?;
    sink.send(StatusMessage::Raw(pod_table(&pods).render())).await;
    Ok(())
}

/// `# / Pod / Container` table, one header row per pod.
pub(crate) fn pod_table(pods: &[Pod]) -> Table {
    let mut table = Table::new(["#", "Pod", "Container"]);
    for pod in pods {
        table.push_row([pod.name.clone(), String::new(), String::new()]);
        for (idx, container) in pod.containers.iter().enumerate() {
            table.push_row([(idx + 1).to_string(), pod.name.clone(), container.clone()]);
        }
    }
    table
}
