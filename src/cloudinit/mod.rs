//! Cloud-config handed to the kubeadm bootstrap container
//!
//! The bootstrap host container receives a cloud-init style document as its
//! user-data: a header, a `write_files` list and a `runcmd` marker telling it
//! which kubeadm phase to run. Each flow owns one template; all of them share
//! the `files` template.

pub mod certs;

pub use certs::{Certificate, CertificatePurpose, Certificates};

use crate::BootstrapError;
use crate::template;
use minijinja::context;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Directive header of every generated cloud-config
pub const CLOUD_CONFIG_HEADER: &str = "## template: jinja\n#cloud-config\n";

/// `runcmd` marker for the first control plane node
pub const CONTROL_PLANE_INIT_CMD: &str = "ControlPlaneInit";
/// `runcmd` marker for control plane nodes joining a cluster
pub const CONTROL_PLANE_JOIN_CMD: &str = "ControlPlaneJoin";
/// `runcmd` marker for worker nodes
pub const WORKER_JOIN_CMD: &str = "WorkerJoin";

const FILES_TEMPLATE_NAME: &str = "files";

const FILES_TEMPLATE: &str = r#"write_files:{% for file in write_files %}
-   path: {{ file.path }}
{%- if file.encoding %}
    encoding: "{{ file.encoding }}"
{%- endif %}
{%- if file.owner %}
    owner: {{ file.owner }}
{%- endif %}
{%- if file.permissions %}
    permissions: '{{ file.permissions }}'
{%- endif %}
{%- if file.append %}
    append: true
{%- endif %}
    content: |
{{ file.content | yaml_indent(6) }}
{%- endfor %}"#;

const INIT_CONTROL_PLANE_NAME: &str = "InitBootstrapContainer";

const INIT_CONTROL_PLANE_TEMPLATE: &str = r#"{{ header }}
{% include "files" %}
-   path: /tmp/kubeadm.yaml
    owner: root:root
    permissions: '0640'
    content: |
      ---
{{ cluster_configuration | yaml_indent(6) }}
      ---
{{ init_configuration | yaml_indent(6) }}
runcmd: "{{ runcmd }}"
"#;

const JOIN_CONTROL_PLANE_NAME: &str = "JoinControlplane";

const JOIN_CONTROL_PLANE_TEMPLATE: &str = r#"{{ header }}
{% include "files" %}
-   path: /tmp/kubeadm-join-config.yaml
    owner: root:root
    permissions: '0640'
    content: |
{{ join_configuration | yaml_indent(6) }}
runcmd: "{{ runcmd }}"
"#;

const WORKER_NAME: &str = "Node";

const WORKER_TEMPLATE: &str = r#"{{ header }}
{% include "files" %}
-   path: /tmp/kubeadm-join-config.yaml
    owner: root:root
    permissions: '0640'
    content: |
      ---
{{ join_configuration | yaml_indent(6) }}
runcmd: "{{ runcmd }}"
"#;

/// A file to write on the node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct File {
    pub path: String,
    pub owner: String,
    pub permissions: String,
    pub content: String,
    pub encoding: String,
    pub append: bool,
    /// Certificate this file was derived from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificatePurpose>,
}

/// A user whose SSH keys are installed in the admin container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub ssh_authorized_keys: Vec<String>,
}

/// Fields shared by every flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BaseUserData {
    pub header: String,
    /// Files rendered into the document; assembled by the pipeline
    pub write_files: Vec<File>,
    /// Caller supplied files appended after generated ones
    pub additional_files: Vec<File>,
    pub users: Vec<User>,
    pub kubeadm_verbosity: String,
    pub kubeadm_command: String,
    pub control_plane: bool,
}

/// Input for the first control plane node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlPlaneInput {
    #[serde(flatten)]
    pub base: BaseUserData,
    pub certificates: Certificates,
    pub cluster_configuration: String,
    pub init_configuration: String,
}

/// Input for a control plane node joining an existing cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlPlaneJoinInput {
    #[serde(flatten)]
    pub base: BaseUserData,
    pub certificates: Certificates,
    pub join_configuration: String,
}

/// Input for a worker node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeInput {
    #[serde(flatten)]
    pub base: BaseUserData,
    pub join_configuration: String,
}

impl ControlPlaneInput {
    /// Render the bootstrap container cloud-config
    pub fn render(&self) -> Result<Vec<u8>, BootstrapError> {
        render_cloud_config(
            INIT_CONTROL_PLANE_NAME,
            INIT_CONTROL_PLANE_TEMPLATE,
            context! {
                header => &self.base.header,
                write_files => &self.base.write_files,
                cluster_configuration => &self.cluster_configuration,
                init_configuration => &self.init_configuration,
                runcmd => CONTROL_PLANE_INIT_CMD,
            },
        )
    }
}

impl ControlPlaneJoinInput {
    /// Render the bootstrap container cloud-config
    pub fn render(&self) -> Result<Vec<u8>, BootstrapError> {
        render_cloud_config(
            JOIN_CONTROL_PLANE_NAME,
            JOIN_CONTROL_PLANE_TEMPLATE,
            context! {
                header => &self.base.header,
                write_files => &self.base.write_files,
                join_configuration => &self.join_configuration,
                runcmd => CONTROL_PLANE_JOIN_CMD,
            },
        )
    }
}

impl NodeInput {
    /// Render the bootstrap container cloud-config
    pub fn render(&self) -> Result<Vec<u8>, BootstrapError> {
        render_cloud_config(
            WORKER_NAME,
            WORKER_TEMPLATE,
            context! {
                header => &self.base.header,
                write_files => &self.base.write_files,
                join_configuration => &self.join_configuration,
                runcmd => WORKER_JOIN_CMD,
            },
        )
    }
}

fn render_cloud_config(
    kind: &'static str,
    source: &'static str,
    ctx: minijinja::Value,
) -> Result<Vec<u8>, BootstrapError> {
    debug!("Generating {} cloud-config", kind);

    let mut env = template::environment();
    template::add_templates(&mut env, &[(FILES_TEMPLATE_NAME, FILES_TEMPLATE), (kind, source)])?;

    template::render(&env, kind, ctx).map(String::into_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> File {
        File {
            path: path.to_string(),
            owner: "root:root".to_string(),
            permissions: "0640".to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn render_string(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_render_init_control_plane() {
        let input = ControlPlaneInput {
            base: BaseUserData {
                header: CLOUD_CONFIG_HEADER.to_string(),
                write_files: vec![file("/etc/motd", "hello\nworld")],
                ..Default::default()
            },
            cluster_configuration: "kind: ClusterConfiguration".to_string(),
            init_configuration: "kind: InitConfiguration".to_string(),
            ..Default::default()
        };

        let rendered = render_string(input.render().unwrap());
        let expected = "## template: jinja
#cloud-config

write_files:
-   path: /etc/motd
    owner: root:root
    permissions: '0640'
    content: |
      hello
      world
-   path: /tmp/kubeadm.yaml
    owner: root:root
    permissions: '0640'
    content: |
      ---
      kind: ClusterConfiguration
      ---
      kind: InitConfiguration
runcmd: \"ControlPlaneInit\"
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_join_control_plane() {
        let input = ControlPlaneJoinInput {
            join_configuration: "kind: JoinConfiguration\ncontrolPlane: {}".to_string(),
            ..Default::default()
        };

        let rendered = render_string(input.render().unwrap());
        let expected = "
write_files:
-   path: /tmp/kubeadm-join-config.yaml
    owner: root:root
    permissions: '0640'
    content: |
      kind: JoinConfiguration
      controlPlane: {}
runcmd: \"ControlPlaneJoin\"
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_worker_has_document_marker() {
        let input = NodeInput {
            join_configuration: "kind: JoinConfiguration".to_string(),
            ..Default::default()
        };

        let rendered = render_string(input.render().unwrap());
        assert!(rendered.contains("    content: |\n      ---\n      kind: JoinConfiguration\n"));
        assert!(rendered.ends_with("runcmd: \"WorkerJoin\"\n"));
    }

    #[test]
    fn test_files_optional_fields() {
        let input = NodeInput {
            base: BaseUserData {
                write_files: vec![
                    File {
                        path: "/opt/bin/run.sh".to_string(),
                        encoding: "base64".to_string(),
                        append: true,
                        content: "IyEvYmluL3No".to_string(),
                        ..Default::default()
                    },
                    file("/etc/two", "2"),
                ],
                ..Default::default()
            },
            ..Default::default()
        };

        let rendered = render_string(input.render().unwrap());
        assert!(rendered.contains(
            "-   path: /opt/bin/run.sh\n    encoding: \"base64\"\n    append: true\n    content: |\n      IyEvYmluL3No\n-   path: /etc/two\n    owner: root:root\n"
        ));
    }

    #[test]
    fn test_rendered_document_is_yaml() {
        let input = ControlPlaneInput {
            base: BaseUserData {
                header: CLOUD_CONFIG_HEADER.to_string(),
                write_files: vec![file("/etc/kubernetes/pki/ca.crt", "-----BEGIN-----\nabc\n")],
                ..Default::default()
            },
            cluster_configuration: "apiVersion: kubeadm.k8s.io/v1beta3\nkind: ClusterConfiguration\n"
                .to_string(),
            init_configuration: "kind: InitConfiguration\n".to_string(),
            ..Default::default()
        };

        let rendered = render_string(input.render().unwrap());
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();

        let files = doc["write_files"].as_sequence().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["content"].as_str(), Some("-----BEGIN-----\nabc\n"));
        assert_eq!(doc["runcmd"].as_str(), Some("ControlPlaneInit"));
    }
}
