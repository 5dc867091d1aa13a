//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Namespace enumerated when neither the CLI nor the config names one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Ceiling on simultaneous remote sessions per pipeline stage.
pub const DEFAULT_WORKERS: usize = 200;

/// Candidate shells, in the order they are probed.
pub const DEFAULT_SHELLS: &[&str] = &["sh", "bash"];

/// Utility probes the enumeration script depends on.
pub const DEFAULT_UTILITIES: &[&str] = &["stat /usr/bin/find", "stat /bin/cat", "stat /bin/grep"];

/// Main configuration structure for k8s-lse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace to enumerate.
    pub namespace: Option<String>,
    /// Path to the kubeconfig file.
    pub kubeconfig: Option<String>,
    /// kubectl binary.
    pub kubectl: Option<String>,
    /// Scan stage settings.
    pub scan: ScanConfig,
    /// Probe stage settings.
    pub probe: ProbeConfig,
}

/// Scan configuration (corresponds to CLI options).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Output format: "ansi", "text", "html".
    pub format: Option<String>,
    /// Directory reports are written to.
    pub directory: Option<String>,
    /// Concurrency ceiling for both worker pools.
    pub workers: Option<usize>,
    /// Quiet mode: no status output, no confirmation prompt.
    pub quiet: bool,
}

/// Capability probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Shells tried in order; the first answering `--version` wins.
    pub shells: Vec<String>,
    /// Commands that must run for a container to be testable.
    pub utilities: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            shells: DEFAULT_SHELLS.iter().map(|s| s.to_string()).collect(),
            utilities: DEFAULT_UTILITIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
