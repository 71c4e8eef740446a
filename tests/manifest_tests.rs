//! Tests for the kube-vip manifest patch

use bottlerocket_userdata::BootstrapError;
use bottlerocket_userdata::cloudinit::File;
use bottlerocket_userdata::manifest::{
    KUBE_VIP_MANIFEST_PATH, KUBEADM_ADMIN_CONF_PATH, patch_kube_vip_file,
};
use serde_yaml::Value;

fn manifest_file(host_path: &str) -> File {
    File {
        path: KUBE_VIP_MANIFEST_PATH.to_string(),
        owner: "root:root".to_string(),
        permissions: "0640".to_string(),
        content: format!(
            "apiVersion: v1\nkind: Pod\nspec:\n  volumes:\n  - name: kubeconfig\n    hostPath:\n{}\n",
            host_path
        ),
        ..Default::default()
    }
}

fn decoded_host_path(file: &File) -> (Option<String>, Option<String>) {
    let doc: Value = serde_yaml::from_str(&file.content).unwrap();
    let host_path = &doc["spec"]["volumes"][0]["hostPath"];
    (
        host_path["type"].as_str().map(str::to_string),
        host_path["path"].as_str().map(str::to_string),
    )
}

#[test]
fn test_patch_is_idempotent() {
    let originals = [
        "      path: /etc/kubernetes/admin.conf\n      type: FileOrCreate",
        "      path: /somewhere/else",
        "      type: Directory",
    ];

    for original in originals {
        let files = vec![manifest_file(original)];
        let once = patch_kube_vip_file(&files).unwrap();
        let twice = patch_kube_vip_file(&once).unwrap();

        let expected = (
            Some("File".to_string()),
            Some(KUBEADM_ADMIN_CONF_PATH.to_string()),
        );
        assert_eq!(decoded_host_path(&once[0]), expected);
        assert_eq!(decoded_host_path(&twice[0]), expected);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_patch_keeps_file_metadata() {
    let files = vec![manifest_file("      path: /etc/kubernetes/admin.conf")];
    let patched = patch_kube_vip_file(&files).unwrap();

    assert_eq!(patched[0].path, files[0].path);
    assert_eq!(patched[0].owner, "root:root");
    assert_eq!(patched[0].permissions, "0640");
}

#[test]
fn test_patch_structural_error() {
    let files = vec![
        File {
            path: "/etc/first".to_string(),
            content: "first".to_string(),
            ..Default::default()
        },
        File {
            path: KUBE_VIP_MANIFEST_PATH.to_string(),
            content: "apiVersion: v1\nkind: Pod\nspec:\n  volumes: none\n".to_string(),
            ..Default::default()
        },
    ];

    let err = patch_kube_vip_file(&files).unwrap_err();
    match err {
        BootstrapError::Manifest { path, message } => {
            assert_eq!(path, KUBE_VIP_MANIFEST_PATH);
            assert!(message.contains("spec.volumes[0]"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_patch_non_yaml_content() {
    let files = vec![File {
        path: KUBE_VIP_MANIFEST_PATH.to_string(),
        content: "\t{ not yaml".to_string(),
        ..Default::default()
    }];

    let err = patch_kube_vip_file(&files).unwrap_err();
    assert!(matches!(err, BootstrapError::Manifest { .. }));
}
