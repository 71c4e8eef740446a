//! Bottlerocket node user-data
//!
//! Entry points for the three kubeadm flows. Each one assembles the bootstrap
//! container's cloud-config, embeds it (base64) in the host settings and
//! returns the TOML document handed to the instance at first boot.

use crate::BootstrapError;
use crate::cloudinit::{
    CLOUD_CONFIG_HEADER, ControlPlaneInput, ControlPlaneJoinInput, File, NodeInput, User,
};
use crate::config::{BootstrapConfig, BootstrapRequest, NodeRequest};
use crate::manifest::patch_kube_vip_file;
use crate::settings::{SettingsInput, SettingsTemplates};
use tracing::{debug, info};

/// Join command recorded for worker nodes, before the verbosity flag
pub const STANDARD_JOIN_COMMAND: &str = "kubeadm join --config /tmp/kubeadm-join-config.yaml";

const INIT_CONTROL_PLANE: &str = "init-control-plane";
const JOIN_CONTROL_PLANE: &str = "join-control-plane";

/// User-data for the first control plane node of a cluster
///
/// Writes the cluster certificates and additional files, patches the kube-vip
/// manifest among them and embeds the cluster and init configurations.
pub fn new_init_control_plane(
    input: &mut ControlPlaneInput,
    config: &BootstrapConfig,
) -> Result<Vec<u8>, BootstrapError> {
    info!("Generating init control plane user-data");

    input.base.header = CLOUD_CONFIG_HEADER.to_string();
    input.base.write_files = input.certificates.as_files();
    input
        .base
        .write_files
        .extend(input.base.additional_files.iter().cloned());
    input.base.write_files = patch_files(&input.base.write_files, INIT_CONTROL_PLANE)?;

    let bootstrap_user_data = input.render()?;
    node_user_data(&bootstrap_user_data, &input.base.users, config)
}

/// User-data for a control plane node joining an existing cluster
pub fn new_join_control_plane(
    input: &mut ControlPlaneJoinInput,
    config: &BootstrapConfig,
) -> Result<Vec<u8>, BootstrapError> {
    info!("Generating join control plane user-data");

    input.base.header = CLOUD_CONFIG_HEADER.to_string();
    input.base.control_plane = true;
    input.base.write_files = input.certificates.as_files();
    input
        .base
        .write_files
        .extend(input.base.additional_files.iter().cloned());
    input.base.write_files = patch_files(&input.base.write_files, JOIN_CONTROL_PLANE)?;

    let bootstrap_user_data = input.render()?;
    node_user_data(&bootstrap_user_data, &input.base.users, config)
}

/// User-data for a worker node
///
/// Workers carry no certificates and no kube-vip manifest, so nothing is
/// patched.
pub fn new_node(input: &mut NodeInput, config: &BootstrapConfig) -> Result<Vec<u8>, BootstrapError> {
    info!("Generating worker node user-data");

    input.base.header = CLOUD_CONFIG_HEADER.to_string();
    input.base.kubeadm_command = join_command(&input.base.kubeadm_verbosity);
    input
        .base
        .write_files
        .extend(input.base.additional_files.iter().cloned());

    let bootstrap_user_data = input.render()?;
    node_user_data(&bootstrap_user_data, &input.base.users, config)
}

/// Patch the kube-vip manifest, naming the flow in any failure
fn patch_files(files: &[File], flow: &str) -> Result<Vec<File>, BootstrapError> {
    patch_kube_vip_file(files).map_err(|err| match err {
        BootstrapError::Manifest { path, message } => BootstrapError::manifest(
            path,
            format!("{} user-data: failed to patch kube-vip manifest file: {}", flow, message),
        ),
        other => other,
    })
}

/// Host settings embedding an already rendered bootstrap cloud-config
pub fn node_user_data(
    bootstrap_user_data: &[u8],
    users: &[User],
    config: &BootstrapConfig,
) -> Result<Vec<u8>, BootstrapError> {
    let templates = SettingsTemplates::new()?;
    let input = SettingsInput::build(bootstrap_user_data, users, config, &templates)?;
    let document = templates.render_document(&input)?;

    debug!(
        "Rendered {} byte settings document around {} byte bootstrap user-data",
        document.len(),
        bootstrap_user_data.len()
    );
    Ok(document.into_bytes())
}

/// Render the user-data for a request loaded from disk
pub fn render_request(request: &mut BootstrapRequest) -> Result<Vec<u8>, BootstrapError> {
    debug!("Rendering request for flow: {}", request.node.flow());

    match &mut request.node {
        NodeRequest::InitControlPlane(input) => new_init_control_plane(input, &request.config),
        NodeRequest::JoinControlPlane(input) => new_join_control_plane(input, &request.config),
        NodeRequest::Worker(input) => new_node(input, &request.config),
    }
}

/// The kubeadm join invocation for a given verbosity flag
pub fn join_command(verbosity: &str) -> String {
    format!("{} {}", STANDARD_JOIN_COMMAND, verbosity)
}
