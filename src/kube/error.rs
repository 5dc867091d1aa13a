use thiserror::Error;

/// Errors from inventory calls against the cluster.
#[derive(Debug, Error)]
pub enum KubeError {
    /// kubectl could not be started at all
    #[error("Failed to run {program}: {source}. Is kubectl installed and on PATH?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Pod {0:?} not found")]
    PodNotFound(String),
}
