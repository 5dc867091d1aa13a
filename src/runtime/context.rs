//! Per-run settings threaded through every pipeline stage.

use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::config::{DEFAULT_NAMESPACE, DEFAULT_SHELLS, DEFAULT_UTILITIES, DEFAULT_WORKERS, EffectiveConfig};
use crate::script::SCRIPT;

/// Context for one enumeration run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Namespace the containers were discovered in.
    pub namespace: String,
    /// Report format.
    pub format: OutputFormat,
    /// Directory reports are written to.
    pub directory: PathBuf,
    /// Concurrency ceiling of each pool.
    pub workers: usize,
    /// Skip the confirmation gate.
    pub quiet: bool,
    /// Candidate shells, in probe order.
    pub shells: Vec<String>,
    /// Utility probe commands, in probe order.
    pub utilities: Vec<String>,
    /// Script fed to every testable container.
    pub script: Vec<u8>,
}

impl RunContext {
    /// Create a context with default probing and the embedded script.
    pub fn new(namespace: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            namespace: namespace.into(),
            format: OutputFormat::default(),
            directory: directory.into(),
            workers: DEFAULT_WORKERS,
            quiet: false,
            shells: DEFAULT_SHELLS.iter().map(|s| s.to_string()).collect(),
            utilities: DEFAULT_UTILITIES.iter().map(|s| s.to_string()).collect(),
            script: SCRIPT.to_vec(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Set the concurrency ceiling (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_shells(mut self, shells: Vec<String>) -> Self {
        self.shells = shells;
        self
    }

    pub fn with_utilities(mut self, utilities: Vec<String>) -> Self {
        self.utilities = utilities;
        self
    }

    pub fn with_script(mut self, script: impl Into<Vec<u8>>) -> Self {
        self.script = script.into();
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, ".")
    }
}

impl From<&EffectiveConfig> for RunContext {
    fn from(config: &EffectiveConfig) -> Self {
        Self::new(config.namespace.clone(), config.directory.clone())
            .with_format(config.format)
            .with_quiet(config.quiet)
            .with_workers(config.workers)
            .with_shells(config.shells.clone())
            .with_utilities(config.utilities.clone())
    }
}
