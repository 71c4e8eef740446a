//! kube-vip static pod manifest patching
//!
//! kube-vip reads the cluster admin kubeconfig from a hostPath volume. On
//! Bottlerocket kubeadm writes it to `/var/lib/kubeadm/admin.conf`, so the
//! generated manifest is rewritten to mount that file before it is embedded
//! in the bootstrap container user-data.

use crate::BootstrapError;
use crate::cloudinit::File;
use serde_yaml::Value;
use tracing::debug;

/// Manifest rewritten by [`patch_kube_vip_file`]
pub const KUBE_VIP_MANIFEST_PATH: &str = "/etc/kubernetes/manifests/kube-vip.yaml";

/// Admin kubeconfig location on Bottlerocket
pub const KUBEADM_ADMIN_CONF_PATH: &str = "/var/lib/kubeadm/admin.conf";

const HOST_PATH_TYPE: &str = "File";

/// One step of the walk down to the volume's `hostPath`
#[derive(Debug, Clone, Copy)]
enum Segment {
    Key(&'static str),
    Index(usize),
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

const HOST_PATH_SEGMENTS: [Segment; 4] = [
    Segment::Key("spec"),
    Segment::Key("volumes"),
    Segment::Index(0),
    Segment::Key("hostPath"),
];

/// Return a copy of `files` with the kube-vip manifest patched
///
/// Files other than [`KUBE_VIP_MANIFEST_PATH`] are passed through unchanged
/// and in order. A missing manifest is not an error; a manifest that is not
/// shaped like a pod with a hostPath volume is.
pub fn patch_kube_vip_file(files: &[File]) -> Result<Vec<File>, BootstrapError> {
    files
        .iter()
        .map(|file| {
            if file.path != KUBE_VIP_MANIFEST_PATH {
                return Ok(file.clone());
            }

            debug!("Patching kube-vip manifest at {}", file.path);
            Ok(File {
                content: patch_manifest(&file.path, &file.content)?,
                ..file.clone()
            })
        })
        .collect()
}

/// Rewrite the first volume's hostPath of a pod manifest
pub fn patch_manifest(path: &str, content: &str) -> Result<String, BootstrapError> {
    let mut manifest: Value = serde_yaml::from_str(content).map_err(|e| {
        BootstrapError::manifest(path, format!("error unmarshalling yaml content: {}", e))
    })?;

    let host_path = host_path_mut(&mut manifest)
        .map_err(|walked| BootstrapError::manifest(path, format!("missing or invalid {}", walked)))?;

    host_path.insert(Value::from("type"), Value::from(HOST_PATH_TYPE));
    host_path.insert(Value::from("path"), Value::from(KUBEADM_ADMIN_CONF_PATH));

    serde_yaml::to_string(&manifest).map_err(|e| {
        BootstrapError::manifest(path, format!("error marshalling patched yaml: {}", e))
    })
}

/// Walk to the hostPath mapping; on failure return the path walked so far
fn host_path_mut(manifest: &mut Value) -> Result<&mut serde_yaml::Mapping, String> {
    let mut current = manifest;
    let mut walked = String::new();

    for segment in HOST_PATH_SEGMENTS {
        if matches!(segment, Segment::Key(_)) && !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(&segment.to_string());

        let next = match segment {
            Segment::Key(key) => current.as_mapping_mut().and_then(|m| m.get_mut(key)),
            Segment::Index(index) => current.as_sequence_mut().and_then(|s| s.get_mut(index)),
        };
        current = next.ok_or_else(|| walked.clone())?;
    }

    current.as_mapping_mut().ok_or(walked)
}
