//! Bootstrap configuration types
//!
//! [`BootstrapConfig`] carries the Bottlerocket-specific knobs of a kubeadm
//! bootstrap request. It is read-only for the whole pipeline.

pub mod loader;

use crate::cloudinit::{ControlPlaneInput, ControlPlaneJoinInput, NodeInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kubelet extra argument holding comma separated `key=value` node labels
pub const NODE_LABELS_ARG: &str = "node-labels";

/// Kubelet extra argument holding the cloud provider id of the node
pub const PROVIDER_ID_ARG: &str = "provider-id";

/// Bottlerocket settings for one bootstrap request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BootstrapConfig {
    /// Sandbox (pause) image used as `pod-infra-container-image`
    pub pause: ImageMeta,

    /// Privileged host container that runs kubeadm
    pub bottlerocket_bootstrap: ImageMeta,

    /// Outbound proxy settings
    pub proxy: ProxyConfiguration,

    /// Registry mirror settings
    pub registry_mirror: RegistryMirrorConfiguration,

    /// Extra kubelet arguments; only `node-labels` and `provider-id` are read
    pub kubelet_extra_args: BTreeMap<String, String>,

    /// Pre-formatted `[settings.kubernetes.node-taints]` body
    pub node_taints: String,

    /// Additional host containers
    pub host_containers: Vec<HostContainer>,
}

/// Container image reference split into repository and tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageMeta {
    pub image_repository: String,
    pub image_tag: String,
}

impl ImageMeta {
    /// Image reference in `repository:tag` form
    pub fn source(&self) -> String {
        format!("{}:{}", self.image_repository, self.image_tag)
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyConfiguration {
    pub https_proxy: String,
    pub no_proxy: Vec<String>,
}

/// Registry mirror configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryMirrorConfiguration {
    /// Mirror host (and optional port/path), without scheme
    pub endpoint: String,
    /// PEM encoded CA bundle trusted for the mirror
    pub ca_cert: String,
}

/// A generic Bottlerocket host container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostContainer {
    pub name: String,
    pub enabled: bool,
    pub superpowered: bool,
    /// Image source; omitted from the settings when empty
    pub image: String,
    /// Raw user-data; base64 encoded when rendered, omitted when empty
    pub user_data: String,
}

/// A complete request as read from disk by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    #[serde(default)]
    pub config: BootstrapConfig,
    pub node: NodeRequest,
}

/// Flow-specific inner document input, tagged by `flow`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "kebab-case")]
pub enum NodeRequest {
    /// First control plane node of a new cluster
    InitControlPlane(ControlPlaneInput),
    /// Control plane node joining an existing cluster
    JoinControlPlane(ControlPlaneJoinInput),
    /// Worker node joining a cluster
    Worker(NodeInput),
}

impl NodeRequest {
    /// Flow name as written in request documents
    pub fn flow(&self) -> &'static str {
        match self {
            NodeRequest::InitControlPlane(_) => "init-control-plane",
            NodeRequest::JoinControlPlane(_) => "join-control-plane",
            NodeRequest::Worker(_) => "worker",
        }
    }
}
