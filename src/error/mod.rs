//! Error types for k8s-lse.
//!
//! Per-container failures never surface here; they are absorbed by the
//! pipeline stage that hit them and logged. What remains are whole-run
//! failures:
//! - terminal conditions (`NoContainersFound`, `NothingToTest`, `Cancelled`)
//!   which abort a run without being a crash
//! - genuine failures (configuration, inventory, file system)

mod context;

pub use context::IoOperation;

use crate::config::ConfigError;
use crate::kube::KubeError;
use crate::runtime::ExecError;
use std::path::PathBuf;
use thiserror::Error;

/// Run-level error type.
#[derive(Error, Debug)]
pub enum LseError {
    /// Inventory returned no containers at all.
    #[error("No pods/containers found in namespace {namespace:?}")]
    NoContainersFound { namespace: String },

    /// Probing finished without a single testable container.
    #[error("Did not find any containers that can be tested")]
    NothingToTest,

    /// The confirmation gate was answered negatively.
    #[error("Action cancelled")]
    Cancelled,

    /// Pod/container selection flags do not make sense together.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Failed to {operation} {path}: {source}")]
    Io {
        path: PathBuf,
        operation: IoOperation,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    #[error("Remote execution error: {0}")]
    Exec(#[from] ExecError),
}

impl LseError {
    /// Create an I/O write error.
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::Write,
            source,
        }
    }

    /// Create an I/O create error.
    pub fn create_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::Create,
            source,
        }
    }

    /// Whether this error is one of the run-aborting conditions that end a
    /// run normally rather than signalling a malfunction.
    pub fn is_terminal_condition(&self) -> bool {
        matches!(
            self,
            Self::NoContainersFound { .. } | Self::NothingToTest | Self::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, LseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_no_containers() {
        let err = LseError::NoContainersFound {
            namespace: "prod".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No pods/containers found in namespace \"prod\""
        );
    }

    #[test]
    fn test_error_display_nothing_to_test() {
        assert_eq!(
            LseError::NothingToTest.to_string(),
            "Did not find any containers that can be tested"
        );
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(LseError::Cancelled.to_string(), "Action cancelled");
    }

    #[test]
    fn test_write_error() {
        let err = LseError::write_error(
            "/reports/a.html",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/reports/a.html"));
        assert!(err.to_string().contains("write"));
    }

    #[test]
    fn test_terminal_conditions() {
        assert!(LseError::NothingToTest.is_terminal_condition());
        assert!(LseError::Cancelled.is_terminal_condition());
        assert!(
            LseError::NoContainersFound {
                namespace: "default".to_string()
            }
            .is_terminal_condition()
        );
        assert!(!LseError::InvalidSelection("x".to_string()).is_terminal_condition());
        assert!(
            !LseError::create_error("/tmp", io::Error::other("boom")).is_terminal_condition()
        );
    }

    #[test]
    fn test_from_config_error() {
        let err: LseError = ConfigError::InvalidValue {
            key: "scan.workers".to_string(),
            message: "must be at least 1".to_string(),
        }
        .into();
        assert!(err.to_string().contains("scan.workers"));
    }
}
