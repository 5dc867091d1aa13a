pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod kube;
pub mod reporter;
pub mod runtime;
pub mod script;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use cli::{Cli, OutputFormat};
pub use config::{Config, EffectiveConfig};
pub use error::{LseError, Result};
pub use kube::Kubectl;
pub use reporter::ReportWriter;
pub use runtime::{Pipeline, RunContext, RunSummary};
pub use types::{CapabilityResult, ContainerRef, ScanResult};
