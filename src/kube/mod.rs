//! kubectl-backed cluster access.
//!
//! [`Kubectl`] is both the inventory source (pod listing) and the
//! [`RemoteExecutor`](crate::runtime::RemoteExecutor) the pipeline runs
//! its probes and scans through.

mod error;
mod exec;
pub mod inventory;

pub use error::KubeError;
pub use exec::classify_exit;
pub use inventory::{Pod, Selection};

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::EffectiveConfig;
use crate::types::ContainerRef;

/// Handle on the kubectl binary, bound to one namespace.
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    kubeconfig: Option<PathBuf>,
    namespace: String,
}

impl Kubectl {
    pub fn new(binary: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig: None,
            namespace: namespace.into(),
        }
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    pub fn from_config(config: &EffectiveConfig) -> Self {
        Self::new(config.kubectl.clone(), config.namespace.clone())
            .with_kubeconfig(config.kubeconfig.clone())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Global flags shared by every invocation, followed by `args`.
    pub fn args<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut full = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            full.push("--kubeconfig".to_string());
            full.push(kubeconfig.display().to_string());
        }
        full.push("-n".to_string());
        full.push(self.namespace.clone());
        full.extend(args.into_iter().map(Into::into));
        full
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run an inventory command and return its stdout.
    async fn query(&self, args: Vec<String>) -> Result<Vec<u8>, KubeError> {
        let args = self.args(args);
        debug!(binary = %self.binary.display(), ?args, "kubectl query");

        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| KubeError::Spawn {
                program: self.binary.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(KubeError::CommandFailed {
                command: format!("kubectl {}", args.join(" ")),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Every pod in the namespace.
    pub async fn get_pods(&self) -> Result<Vec<Pod>, KubeError> {
        let stdout = self.query(vec!["get".into(), "pods".into(), "-o".into(), "json".into()]).await?;
        inventory::parse_pod_list(&stdout)
    }

    /// One named pod.
    pub async fn get_pod(&self, name: &str) -> Result<Pod, KubeError> {
        let result = self
            .query(vec!["get".into(), "pod".into(), name.into(), "-o".into(), "json".into()])
            .await;
        match result {
            Ok(stdout) => inventory::parse_pod(&stdout),
            Err(KubeError::CommandFailed { stderr, .. }) if stderr.contains("NotFound") => {
                Err(KubeError::PodNotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// One representative pod per workload.
    pub async fn get_unique_pods(&self) -> Result<Vec<Pod>, KubeError> {
        Ok(inventory::unique_pods(self.get_pods().await?))
    }

    /// Pods shown in list mode: the named ones, or the unique set.
    pub async fn list_pods(&self, selection: &Selection) -> Result<Vec<Pod>, KubeError> {
        match selection {
            Selection::Namespace => self.get_unique_pods().await,
            Selection::Pods(names) => self.named_pods(names).await,
            Selection::Containers { pod, .. } => Ok(vec![self.get_pod(pod).await?]),
        }
    }

    /// Containers to probe for `selection`.
    pub async fn discover(&self, selection: &Selection) -> Result<Vec<ContainerRef>, KubeError> {
        let pods = match selection {
            Selection::Containers { .. } => return Ok(selection.explicit_containers()),
            Selection::Pods(names) => self.named_pods(names).await?,
            Selection::Namespace => self.get_unique_pods().await?,
        };
        Ok(inventory::running_containers(&pods))
    }

    async fn named_pods(&self, names: &[String]) -> Result<Vec<Pod>, KubeError> {
        let mut pods = Vec::with_capacity(names.len());
        for name in names {
            pods.push(self.get_pod(name).await?);
        }
        Ok(pods)
    }
}
