//! Bottlerocket settings input
//!
//! [`SettingsInput`] is the flat, fully pre-formatted view of a
//! [`BootstrapConfig`] that the section templates read. All quoting and
//! encoding happens while building it; templates only interpolate.

pub mod sections;

pub use sections::{Section, SettingsTemplates};

use crate::BootstrapError;
use crate::cloudinit::User;
use crate::config::{BootstrapConfig, HostContainer, NODE_LABELS_ARG, PROVIDER_ID_ARG};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use tracing::debug;

/// Values interpolated into the settings templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsInput {
    /// Base64 cloud-config for the bootstrap container
    pub bootstrap_container_user_data: String,
    /// Base64 JSON with the admin container's SSH keys
    pub admin_container_user_data: String,
    pub bootstrap_container_source: String,
    pub pause_container_source: String,
    pub https_proxy_endpoint: String,
    /// Each entry already quoted
    pub no_proxy_endpoints: Vec<String>,
    pub registry_mirror_endpoint: String,
    /// Base64 PEM bundle
    pub registry_mirror_ca_cert: String,
    /// `"key" = "value"` lines
    pub node_labels: String,
    pub node_taints: String,
    pub provider_id: String,
    pub host_containers: Vec<HostContainerInput>,
}

/// A host container entry ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostContainerInput {
    /// Table key, quoted unless it is a bare TOML key
    pub name: String,
    /// `true` or `false`
    pub enabled: String,
    pub superpowered: String,
    pub source: String,
    /// Base64 user-data
    pub user_data: String,
}

impl From<&HostContainer> for HostContainerInput {
    fn from(container: &HostContainer) -> Self {
        Self {
            name: table_key(&container.name),
            enabled: container.enabled.to_string(),
            superpowered: container.superpowered.to_string(),
            source: container.image.clone(),
            user_data: encode_if_present(&container.user_data),
        }
    }
}

impl SettingsInput {
    /// Build the settings input for a node
    ///
    /// `bootstrap_user_data` is the rendered cloud-config of the bootstrap
    /// container; `users` provide the SSH keys for the admin container.
    pub fn build(
        bootstrap_user_data: &[u8],
        users: &[User],
        config: &BootstrapConfig,
        templates: &SettingsTemplates,
    ) -> Result<Self, BootstrapError> {
        let authorized_keys = authorized_keys(users);
        let admin_user_data = templates.render_admin_user_data(&authorized_keys)?;

        let extra_arg = |name: &str| {
            config
                .kubelet_extra_args
                .get(name)
                .cloned()
                .unwrap_or_default()
        };

        let input = Self {
            bootstrap_container_user_data: BASE64.encode(bootstrap_user_data),
            admin_container_user_data: BASE64.encode(admin_user_data),
            bootstrap_container_source: config.bottlerocket_bootstrap.source(),
            pause_container_source: config.pause.source(),
            https_proxy_endpoint: config.proxy.https_proxy.clone(),
            no_proxy_endpoints: config.proxy.no_proxy.iter().map(|e| quote(e)).collect(),
            registry_mirror_endpoint: config.registry_mirror.endpoint.clone(),
            registry_mirror_ca_cert: encode_if_present(&config.registry_mirror.ca_cert),
            node_labels: parse_node_labels(&extra_arg(NODE_LABELS_ARG)),
            node_taints: config.node_taints.clone(),
            provider_id: extra_arg(PROVIDER_ID_ARG),
            host_containers: config
                .host_containers
                .iter()
                .filter(|container| {
                    if container.name.is_empty() {
                        debug!("Skipping host container without a name");
                    }
                    !container.name.is_empty()
                })
                .map(Into::into)
                .collect(),
        };

        debug!(
            "Built settings input ({} no-proxy entries, {} host containers)",
            input.no_proxy_endpoints.len(),
            input.host_containers.len()
        );

        Ok(input)
    }
}

/// Quote a value as a TOML basic string (JSON string syntax is a subset)
pub fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// A table key for `name`, quoted when it is not a bare key
pub fn table_key(name: &str) -> String {
    let bare = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if bare { name.to_string() } else { quote(name) }
}

/// Turn `a=1,b=2` into `"a" = "1"` lines
///
/// Pairs that do not split into exactly a key and a value are skipped.
pub fn parse_node_labels(node_labels: &str) -> String {
    if node_labels.is_empty() {
        return String::new();
    }

    node_labels
        .split(',')
        .filter_map(|pair| {
            let parts: Vec<&str> = pair.split('=').collect();
            match parts.as_slice() {
                [key, value] => Some(format!("{} = {}", quote(key), quote(value))),
                _ => {
                    debug!("Skipping malformed node label: {}", pair);
                    None
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every user's SSH keys, quoted and comma joined
pub fn authorized_keys(users: &[User]) -> String {
    users
        .iter()
        .flat_map(|user| user.ssh_authorized_keys.iter())
        .map(|key| quote(key))
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_if_present(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        BASE64.encode(value)
    }
}
