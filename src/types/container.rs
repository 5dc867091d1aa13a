//! Container identity and per-stage results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one container within one pod.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerRef {
    pub pod: String,
    pub container: String,
}

impl ContainerRef {
    pub fn new(pod: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            pod: pod.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pod, self.container)
    }
}

impl<P: Into<String>, C: Into<String>> From<(P, C)> for ContainerRef {
    fn from((pod, container): (P, C)) -> Self {
        Self::new(pod, container)
    }
}

/// Outcome of probing one container for a shell and the required utilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResult {
    pub container: ContainerRef,
    /// First candidate shell that answered its version probe, empty if none did.
    pub shell: String,
    pub testable: bool,
}

impl CapabilityResult {
    /// Build a result; a container without a shell is never testable.
    pub fn new(container: ContainerRef, shell: Option<String>, utilities_present: bool) -> Self {
        let shell = shell.unwrap_or_default();
        let testable = !shell.is_empty() && utilities_present;
        Self {
            container,
            shell,
            testable,
        }
    }

    pub fn has_shell(&self) -> bool {
        !self.shell.is_empty()
    }
}

/// Raw output of the audit script for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub container: ContainerRef,
    pub raw_output: Vec<u8>,
}
