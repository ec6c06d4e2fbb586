//! Error types for stencil.

use std::path::PathBuf;

use thiserror::Error;

use stencil_source::SourceError;

/// All errors that can arise from loading or rendering templates.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template root or a template file could not be accessed.
    #[error("template source error: {0}")]
    Source(#[from] SourceError),

    /// A template file is not valid UTF-8.
    #[error("template {path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// A template body failed to parse; the Tera message names the file.
    #[error("failed to compile templates under {root}: {source}")]
    Compile {
        root: PathBuf,
        #[source]
        source: tera::Error,
    },

    /// Runtime failure while executing a template (missing variable,
    /// function error, write failure).
    #[error("failed to execute template {name}: {source}")]
    Execution {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("render: template not found: {0}")]
    TemplateNotFound(String),

    #[error("render: layout not found: {0}")]
    LayoutNotFound(String),

    /// The layout-hook function was called outside of a layout render.
    #[error("{hook} called unexpectedly while rendering {name}")]
    UnexpectedHook { hook: String, name: String },

    /// Render data serialized to something other than an object or null.
    #[error("render data must be an object or null, got {0}")]
    InvalidData(&'static str),

    /// Render data could not be serialized.
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configured extension lacks its leading `.`.
    #[error("invalid template extension {0:?}: must start with '.'")]
    InvalidExtension(String),

    /// Layout-hook name collides with a built-in function.
    #[error("layout key {0:?} is reserved for a built-in function")]
    ReservedLayoutKey(String),
}

/// `err` followed by every underlying cause, joined with `": "`.
///
/// Levels whose message the accumulated text already ends with are skipped,
/// since most variants print their immediate source.
pub(crate) fn chain_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        let msg = e.to_string();
        if !msg.is_empty() && !out.ends_with(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        current = e.source();
    }
    out
}

/// True if any error in `err`'s chain is a failed call to function `func`.
pub(crate) fn calls_function(err: &tera::Error, func: &str) -> bool {
    let mut current = Some(err as &(dyn std::error::Error + 'static));
    while let Some(e) = current {
        if let Some(tera_err) = e.downcast_ref::<tera::Error>() {
            if matches!(&tera_err.kind, tera::ErrorKind::CallFunction(name) if name == func) {
                return true;
            }
        }
        current = e.source();
    }
    false
}
