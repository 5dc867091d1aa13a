//! Pod inventory: parsing `kubectl get` output and choosing what to probe.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use super::error::KubeError;
use crate::error::LseError;
use crate::types::ContainerRef;

const RUNNING: &str = "Running";
const POD_TEMPLATE_HASH: &str = "pod-template-hash";

/// The parts of a pod the tool cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    pub phase: String,
    /// `Kind/name` of the controlling workload, if any.
    pub workload: Option<String>,
    pub containers: Vec<String>,
}

impl Pod {
    pub fn is_running(&self) -> bool {
        self.phase == RUNNING
    }

    pub fn container_refs(&self) -> impl Iterator<Item = ContainerRef> + '_ {
        self.containers
            .iter()
            .map(|container| ContainerRef::new(self.name.clone(), container.clone()))
    }
}

#[derive(Deserialize)]
struct RawPodList {
    #[serde(default)]
    items: Vec<RawPod>,
}

#[derive(Deserialize)]
struct RawPod {
    metadata: RawMetadata,
    #[serde(default)]
    spec: RawSpec,
    #[serde(default)]
    status: RawStatus,
}

#[derive(Deserialize)]
struct RawMetadata {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default, rename = "ownerReferences")]
    owner_references: Vec<RawOwner>,
}

#[derive(Deserialize)]
struct RawOwner {
    kind: String,
    name: String,
    #[serde(default)]
    controller: Option<bool>,
}

#[derive(Deserialize, Default)]
struct RawSpec {
    #[serde(default)]
    containers: Vec<RawContainer>,
}

#[derive(Deserialize)]
struct RawContainer {
    name: String,
}

#[derive(Deserialize, Default)]
struct RawStatus {
    #[serde(default)]
    phase: Option<String>,
}

impl From<RawPod> for Pod {
    fn from(raw: RawPod) -> Self {
        let workload = workload_of(&raw.metadata);
        Self {
            name: raw.metadata.name,
            phase: raw.status.phase.unwrap_or_default(),
            workload,
            containers: raw.spec.containers.into_iter().map(|c| c.name).collect(),
        }
    }
}

/// Controlling owner as `Kind/name`. A ReplicaSet stands for the Deployment
/// it was stamped from, so every rollout of a Deployment maps to one key.
fn workload_of(metadata: &RawMetadata) -> Option<String> {
    let owner = metadata
        .owner_references
        .iter()
        .find(|o| o.controller == Some(true))
        .or_else(|| metadata.owner_references.first())?;

    if owner.kind == "ReplicaSet"
        && let Some(hash) = metadata.labels.get(POD_TEMPLATE_HASH)
        && let Some(deployment) = owner.name.strip_suffix(&format!("-{hash}"))
    {
        return Some(format!("Deployment/{deployment}"));
    }
    Some(format!("{}/{}", owner.kind, owner.name))
}

/// Parse the output of `kubectl get pods -o json`.
pub fn parse_pod_list(json: &[u8]) -> Result<Vec<Pod>, KubeError> {
    let list: RawPodList = serde_json::from_slice(json).map_err(|source| KubeError::Parse {
        what: "pod list".to_string(),
        source,
    })?;
    Ok(list.items.into_iter().map(Pod::from).collect())
}

/// Parse the output of `kubectl get pod NAME -o json`.
pub fn parse_pod(json: &[u8]) -> Result<Pod, KubeError> {
    let pod: RawPod = serde_json::from_slice(json).map_err(|source| KubeError::Parse {
        what: "pod".to_string(),
        source,
    })?;
    Ok(pod.into())
}

/// Keep the first pod of every workload. Ownerless pods are all kept.
pub fn unique_pods(pods: Vec<Pod>) -> Vec<Pod> {
    let mut seen = HashSet::new();
    pods.into_iter()
        .filter(|pod| match &pod.workload {
            Some(key) => seen.insert(key.clone()),
            None => true,
        })
        .collect()
}

/// Every container of every running pod, in pod order.
pub fn running_containers(pods: &[Pod]) -> Vec<ContainerRef> {
    pods.iter()
        .filter(|pod| pod.is_running())
        .flat_map(Pod::container_refs)
        .collect()
}

/// Which containers a run targets, derived from `--pods` / `--containers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every running container of the de-duplicated namespace.
    Namespace,
    /// Every running container of the named pods.
    Pods(Vec<String>),
    /// Exactly these containers of one pod.
    Containers { pod: String, containers: Vec<String> },
}

impl Selection {
    pub fn from_flags(pods: &[String], containers: &[String]) -> Result<Self, LseError> {
        match (pods, containers) {
            ([], []) => Ok(Self::Namespace),
            (pods, []) => Ok(Self::Pods(pods.to_vec())),
            ([pod], containers) => Ok(Self::Containers {
                pod: pod.clone(),
                containers: containers.to_vec(),
            }),
            ([], _) => Err(LseError::InvalidSelection(
                "--containers requires the pod they belong to (--pods)".to_string(),
            )),
            (_, _) => Err(LseError::InvalidSelection(
                "List of containers to be tested can be provided only for a single pod"
                    .to_string(),
            )),
        }
    }

    /// Containers named outright; empty unless this is [`Selection::Containers`].
    pub fn explicit_containers(&self) -> Vec<ContainerRef> {
        match self {
            Self::Containers { pod, containers } => containers
                .iter()
                .map(|container| ContainerRef::new(pod.clone(), container.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}
