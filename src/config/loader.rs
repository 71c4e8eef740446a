//! Bootstrap request loader
//!
//! Reads a [`BootstrapRequest`] from a YAML or JSON document on disk.

use super::BootstrapRequest;
use crate::BootstrapError;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Load a request from a file
pub async fn load_request(path: impl AsRef<Path>) -> Result<BootstrapRequest, BootstrapError> {
    let path = path.as_ref();
    debug!("Reading bootstrap request from {}", path.display());

    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Err(BootstrapError::Config(format!(
            "request file {} is empty",
            path.display()
        )));
    }

    let request = parse_request(&content)?;
    info!(
        "Loaded {} request from {}",
        request.node.flow(),
        path.display()
    );
    Ok(request)
}

/// Parse a request document; JSON is accepted as YAML
pub fn parse_request(content: &str) -> Result<BootstrapRequest, BootstrapError> {
    Ok(serde_yaml::from_str(content)?)
}
