//! Bottlerocket settings sections
//!
//! Each [`Section`] is one self-contained TOML block backed by a named
//! template. [`SettingsTemplates::render_document`] walks [`Section::ALL`] in
//! order and concatenates the sections whose driving field is set.

use super::SettingsInput;
use crate::BootstrapError;
use crate::template::{self, NamedTemplate};
use minijinja::{Environment, context};
use tracing::debug;

/// Comment lines opening every settings document
pub const DOCUMENT_HEADER: &str =
    "# Bottlerocket settings for a kubeadm bootstrapped node\n# Generated by bottlerocket-userdata; do not edit\n";

const ADMIN_USER_DATA_NAME: &str = "adminContainerUserData";

const ADMIN_USER_DATA_TEMPLATE: &str = "{
\t\"ssh\": {
\t\t\"authorized-keys\": [{{ authorized_keys }}]
\t}
}
";

const BOOTSTRAP_HOST_CONTAINER_TEMPLATE: &str = r#"[settings.host-containers.kubeadm-bootstrap]
enabled = true
superpowered = true
source = "{{ bootstrap_container_source }}"
user-data = "{{ bootstrap_container_user_data }}""#;

const ADMIN_CONTAINER_TEMPLATE: &str = r#"[settings.host-containers.admin]
enabled = true
user-data = "{{ admin_container_user_data }}""#;

const KUBERNETES_TEMPLATE: &str = r#"[settings.kubernetes]
cluster-domain = "cluster.local"
standalone-mode = true
authentication-mode = "tls"
server-tls-bootstrap = false
pod-infra-container-image = "{{ pause_container_source }}"
{%- if provider_id %}
provider-id = "{{ provider_id }}"
{%- endif %}"#;

const NETWORK_TEMPLATE: &str = r#"[settings.network]
https-proxy = "{{ https_proxy_endpoint }}"
no-proxy = [{{ no_proxy_endpoints | join(",") }}]"#;

const REGISTRY_MIRROR_TEMPLATE: &str = r#"[settings.container-registry.mirrors]
"public.ecr.aws" = ["https://{{ registry_mirror_endpoint }}"]"#;

const REGISTRY_MIRROR_CA_CERT_TEMPLATE: &str = r#"[settings.pki.registry-mirror-ca]
data = "{{ registry_mirror_ca_cert }}"
trusted = true"#;

const NODE_LABELS_TEMPLATE: &str = r#"[settings.kubernetes.node-labels]
{{ node_labels }}"#;

const NODE_TAINTS_TEMPLATE: &str = r#"[settings.kubernetes.node-taints]
{{ node_taints }}"#;

const HOST_CONTAINERS_TEMPLATE: &str = r#"{% for container in host_containers -%}
{% if not loop.first %}

{% endif -%}
[settings.host-containers.{{ container.name }}]
enabled = {{ container.enabled }}
superpowered = {{ container.superpowered }}
{%- if container.source %}
source = "{{ container.source }}"
{%- endif %}
{%- if container.user_data %}
user-data = "{{ container.user_data }}"
{%- endif %}
{%- endfor %}"#;

/// One optional block of the settings document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    BootstrapHostContainer,
    AdminContainer,
    Kubernetes,
    Network,
    RegistryMirror,
    RegistryMirrorCaCert,
    NodeLabels,
    NodeTaints,
    HostContainers,
}

impl Section {
    /// Every section in emission order
    pub const ALL: [Section; 9] = [
        Section::BootstrapHostContainer,
        Section::AdminContainer,
        Section::Kubernetes,
        Section::Network,
        Section::RegistryMirror,
        Section::RegistryMirrorCaCert,
        Section::NodeLabels,
        Section::NodeTaints,
        Section::HostContainers,
    ];

    /// Template name the section is registered under
    pub fn name(self) -> &'static str {
        match self {
            Section::BootstrapHostContainer => "bootstrapHostContainerSettings",
            Section::AdminContainer => "adminContainerInitSettings",
            Section::Kubernetes => "kubernetesInitSettings",
            Section::Network => "networkInitSettings",
            Section::RegistryMirror => "registryMirrorSettings",
            Section::RegistryMirrorCaCert => "registryMirrorCACertSettings",
            Section::NodeLabels => "nodeLabelSettings",
            Section::NodeTaints => "nodeTaintsSettings",
            Section::HostContainers => "hostContainerSettings",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Section::BootstrapHostContainer => BOOTSTRAP_HOST_CONTAINER_TEMPLATE,
            Section::AdminContainer => ADMIN_CONTAINER_TEMPLATE,
            Section::Kubernetes => KUBERNETES_TEMPLATE,
            Section::Network => NETWORK_TEMPLATE,
            Section::RegistryMirror => REGISTRY_MIRROR_TEMPLATE,
            Section::RegistryMirrorCaCert => REGISTRY_MIRROR_CA_CERT_TEMPLATE,
            Section::NodeLabels => NODE_LABELS_TEMPLATE,
            Section::NodeTaints => NODE_TAINTS_TEMPLATE,
            Section::HostContainers => HOST_CONTAINERS_TEMPLATE,
        }
    }

    /// Whether the section's driving field is set
    pub fn is_included(self, input: &SettingsInput) -> bool {
        match self {
            Section::BootstrapHostContainer | Section::AdminContainer | Section::Kubernetes => true,
            Section::Network => !input.https_proxy_endpoint.is_empty(),
            Section::RegistryMirror => !input.registry_mirror_endpoint.is_empty(),
            Section::RegistryMirrorCaCert => !input.registry_mirror_ca_cert.is_empty(),
            Section::NodeLabels => !input.node_labels.is_empty(),
            Section::NodeTaints => !input.node_taints.is_empty(),
            Section::HostContainers => !input.host_containers.is_empty(),
        }
    }
}

/// Registry of every settings template
pub struct SettingsTemplates {
    env: Environment<'static>,
}

impl SettingsTemplates {
    /// Build the registry, parsing every section template
    pub fn new() -> Result<Self, BootstrapError> {
        let mut env = template::environment();

        let mut templates: Vec<NamedTemplate> = Section::ALL
            .iter()
            .map(|section| (section.name(), section.source()))
            .collect();
        templates.push((ADMIN_USER_DATA_NAME, ADMIN_USER_DATA_TEMPLATE));
        template::add_templates(&mut env, &templates)?;

        Ok(Self { env })
    }

    /// Render a single section, regardless of whether it would be included
    pub fn render_section(
        &self,
        section: Section,
        input: &SettingsInput,
    ) -> Result<String, BootstrapError> {
        template::render(&self.env, section.name(), input)
    }

    /// Render the admin container user-data for a pre-quoted key list
    pub fn render_admin_user_data(&self, authorized_keys: &str) -> Result<String, BootstrapError> {
        template::render(
            &self.env,
            ADMIN_USER_DATA_NAME,
            context! { authorized_keys => authorized_keys },
        )
    }

    /// Sections of `input` that end up in the document, in order
    pub fn included_sections(input: &SettingsInput) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| section.is_included(input))
            .collect()
    }

    /// Render the full settings document
    pub fn render_document(&self, input: &SettingsInput) -> Result<String, BootstrapError> {
        let mut blocks = Vec::new();
        for section in Self::included_sections(input) {
            debug!("Including settings section: {}", section.name());
            let block = self.render_section(section, input)?;
            blocks.push(block.trim_end_matches('\n').to_string());
        }

        let mut document = String::from(DOCUMENT_HEADER);
        document.push_str(&blocks.join("\n\n"));
        document.push('\n');
        Ok(document)
    }
}
