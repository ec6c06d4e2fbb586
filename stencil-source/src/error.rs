//! Error types for stencil-source.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while reading a template tree.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The path does not exist in the source.
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    /// Any other I/O failure (permission denied, not a directory, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    /// Path the failing operation was addressed to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            SourceError::NotFound { path } | SourceError::Io { path, .. } => path,
        }
    }
}

/// Maps an [`std::io::Error`] onto [`SourceError`], splitting out `NotFound`.
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SourceError {
    let path = path.into();
    if source.kind() == std::io::ErrorKind::NotFound {
        SourceError::NotFound { path }
    } else {
        SourceError::Io { path, source }
    }
}
