//! Runtime execution control.
//!
//! - `executor`: the remote execution capability the stages run against
//! - `probe` / `scan`: the two worker pools
//! - `gate`: confirmation between them
//! - `sink`: serialized status stream
//! - `pool`: feeder / worker / collector plumbing shared by both pools
//! - `pipeline`: orchestration of one run

pub mod context;
pub mod executor;
pub mod gate;
pub mod pipeline;
pub mod pool;
pub mod probe;
pub mod scan;
pub mod sink;

pub use context::RunContext;
pub use executor::{ExecError, ExecOutput, ExecStatus, RemoteExecutor};
pub use gate::{AutoProceed, ConfirmationGate, PromptGate};
pub use pipeline::{Pipeline, PipelineStage, RunSummary};
pub use probe::{CapabilityProber, Classification};
pub use scan::ScanDispatcher;
pub use sink::{ChannelSink, LogSink, MemorySink, SinkConsumer, StatusMessage};
