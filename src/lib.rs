//! bottlerocket-userdata library
//!
//! Generates the TOML user-data a Bottlerocket node reads at first boot when
//! it is bootstrapped with kubeadm.
//!
//! # Layout of the generated document
//!
//! - host settings (TOML), one section per concern, optional sections only
//!   when their driving value is set
//! - the `kubeadm-bootstrap` host container, whose user-data is a base64
//!   cloud-config carrying certificates, extra files and kubeadm configuration
//! - the `admin` host container, whose user-data is base64 JSON with the SSH
//!   authorized keys
//!
//! Rendering is pure and synchronous; every call builds its own template
//! environment.

pub mod cloudinit;
pub mod config;
pub mod manifest;
pub mod settings;
pub mod template;
pub mod userdata;

mod error;

pub use config::{BootstrapConfig, BootstrapRequest, NodeRequest};
pub use error::BootstrapError;
pub use userdata::{new_init_control_plane, new_join_control_plane, new_node, render_request};
