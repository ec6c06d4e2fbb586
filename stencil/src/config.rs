//! Engine configuration, deserializable from an application's config file.
//!
//! ```yaml
//! root: ./views
//! extension: .html
//! layout: content   # optional, default "body"
//! reload: true      # optional, default false
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Default name of the variable a layout embeds its body through.
pub const DEFAULT_LAYOUT_KEY: &str = "body";

fn default_layout() -> String {
    DEFAULT_LAYOUT_KEY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory templates are loaded from.
    pub root: PathBuf,
    /// Template file extension, including its leading `.`.
    pub extension: String,
    /// Layout-hook name.
    #[serde(default = "default_layout")]
    pub layout: String,
    /// Recompile every template before each render.
    #[serde(default)]
    pub reload: bool,
}

impl EngineConfig {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            layout: default_layout(),
            reload: false,
        }
    }

    /// Rejects an extension without its leading `.`.
    pub fn validate(&self) -> Result<(), RenderError> {
        check_extension(&self.extension)
    }
}

pub(crate) fn check_extension(extension: &str) -> Result<(), RenderError> {
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(RenderError::InvalidExtension(extension.to_string()));
    }
    Ok(())
}
