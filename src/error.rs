//! Error types for bottlerocket-userdata

use thiserror::Error;

/// Main error type for user-data generation
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("failed to parse {template} template: {source}")]
    TemplateParse {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to generate {template} template: {source}")]
    TemplateRender {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to patch manifest '{path}': {message}")]
    Manifest { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BootstrapError {
    /// Create a template parse error
    pub fn template_parse(template: impl Into<String>, source: minijinja::Error) -> Self {
        Self::TemplateParse {
            template: template.into(),
            source,
        }
    }

    /// Create a template render error
    pub fn template_render(template: impl Into<String>, source: minijinja::Error) -> Self {
        Self::TemplateRender {
            template: template.into(),
            source,
        }
    }

    /// Create a manifest patch error
    pub fn manifest(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Name of the template that failed, if this is a template error
    pub fn template_name(&self) -> Option<&str> {
        match self {
            Self::TemplateParse { template, .. } | Self::TemplateRender { template, .. } => {
                Some(template)
            }
            _ => None,
        }
    }
}
