//! CLI mode handlers.
//!
//! Kept out of main.rs so the wiring from configuration to pipeline can be
//! unit tested.

mod list;
mod scan;

use colored::Colorize;
use std::process::ExitCode;
use tokio::io::AsyncWrite;
use tracing::warn;

use crate::error::LseError;
use crate::runtime::{ChannelSink, SinkConsumer, pool::available_parallelism};

pub use list::run_list_mode;
pub use scan::run_scan_mode;

/// Result type for handler functions that can be tested.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    Success,
    Error(u8),
}

impl From<HandlerResult> for ExitCode {
    fn from(result: HandlerResult) -> Self {
        match result {
            HandlerResult::Success => ExitCode::SUCCESS,
            HandlerResult::Error(code) => ExitCode::from(code),
        }
    }
}

impl From<&LseError> for HandlerResult {
    /// Terminal conditions exit with 1, genuine failures with 2.
    fn from(error: &LseError) -> Self {
        if error.is_terminal_condition() {
            Self::Error(1)
        } else {
            Self::Error(2)
        }
    }
}

type StatusWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Status stream on stderr, or a sink that discards everything when quiet.
pub(crate) fn status_sink(quiet: bool) -> (ChannelSink, SinkConsumer<StatusWriter>) {
    let writer: StatusWriter = if quiet {
        Box::new(tokio::io::sink())
    } else {
        Box::new(tokio::io::stderr())
    };
    ChannelSink::spawn(writer, available_parallelism())
}

/// Close the status stream and wait until it is fully written.
pub(crate) async fn shutdown_sink(sink: ChannelSink, consumer: SinkConsumer<StatusWriter>) {
    sink.close().await;
    drop(sink);
    if let Err(e) = consumer.finish().await {
        warn!(error = %e, "failed to write status stream");
    }
}

/// Report a run-level error on stderr and pick the exit code.
pub(crate) fn report_error(error: &LseError) -> HandlerResult {
    if error.is_terminal_condition() {
        eprintln!("{} {}", "[-]".red(), error);
    } else {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }
    HandlerResult::from(error)
}
