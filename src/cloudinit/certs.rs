//! Cluster certificates written to control plane nodes

use super::File;
use serde::{Deserialize, Serialize};

const PKI_DIR: &str = "/etc/kubernetes/pki";
const CERT_PERMISSIONS: &str = "0640";
const KEY_PERMISSIONS: &str = "0600";
const ROOT_OWNER: &str = "root:root";

/// Role a certificate plays in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificatePurpose {
    /// Cluster CA
    #[serde(rename = "ca")]
    ClusterCa,
    /// etcd CA
    #[serde(rename = "etcd")]
    EtcdCa,
    /// Front proxy CA
    #[serde(rename = "proxy")]
    FrontProxyCa,
    /// Service account signing key pair
    #[serde(rename = "sa")]
    ServiceAccount,
    /// Client certificate the API server uses to reach etcd
    #[serde(rename = "apiserver-etcd-client")]
    ApiServerEtcdClient,
}

impl CertificatePurpose {
    /// Paths of the certificate and key files, in that order
    pub fn paths(self) -> (String, String) {
        let (cert, key) = match self {
            CertificatePurpose::ClusterCa => ("ca.crt", "ca.key"),
            CertificatePurpose::EtcdCa => ("etcd/ca.crt", "etcd/ca.key"),
            CertificatePurpose::FrontProxyCa => ("front-proxy-ca.crt", "front-proxy-ca.key"),
            CertificatePurpose::ServiceAccount => ("sa.pub", "sa.key"),
            CertificatePurpose::ApiServerEtcdClient => {
                ("apiserver-etcd-client.crt", "apiserver-etcd-client.key")
            }
        };
        (format!("{PKI_DIR}/{cert}"), format!("{PKI_DIR}/{key}"))
    }
}

/// PEM encoded certificate and private key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub purpose: CertificatePurpose,
    #[serde(default)]
    pub cert: String,
    #[serde(default)]
    pub key: String,
}

impl Certificate {
    /// Files for this certificate; empty when there is no certificate data
    pub fn as_files(&self) -> Vec<File> {
        if self.cert.is_empty() {
            return Vec::new();
        }

        let (cert_path, key_path) = self.purpose.paths();
        let mut files = vec![File {
            path: cert_path,
            owner: ROOT_OWNER.to_string(),
            permissions: CERT_PERMISSIONS.to_string(),
            content: self.cert.clone(),
            certificate: Some(self.purpose),
            ..Default::default()
        }];

        // External etcd CAs are distributed without their key
        if !self.key.is_empty() {
            files.push(File {
                path: key_path,
                owner: ROOT_OWNER.to_string(),
                permissions: KEY_PERMISSIONS.to_string(),
                content: self.key.clone(),
                certificate: Some(self.purpose),
                ..Default::default()
            });
        }

        files
    }
}

/// Ordered set of cluster certificates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certificates(pub Vec<Certificate>);

impl Certificates {
    /// Flatten every certificate into files, preserving order
    pub fn as_files(&self) -> Vec<File> {
        self.0.iter().flat_map(Certificate::as_files).collect()
    }
}
