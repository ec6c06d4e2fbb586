//! # stencil-source
//!
//! File-system abstraction the template engine loads from.
//!
//! - [`FileSource`] — `stat` / `list_entries` / `read_all` contract
//! - [`OsSource`] — the real file system
//! - [`MemorySource`] — in-memory tree, typically filled from `include_str!`
//! - [`walk_files`] — recursive, deterministic file listing under a root

pub mod error;
pub mod memory;
pub mod os;
pub mod walk;

pub use error::SourceError;
pub use memory::MemorySource;
pub use os::OsSource;
pub use walk::walk_files;

use std::path::Path;

/// Metadata for a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub is_dir: bool,
    /// Size in bytes; `0` for directories.
    pub len: u64,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only view of a tree of files.
///
/// Implementations must be shareable across threads: one source backs every
/// (re)load of an engine, and loads may run from any request thread.
pub trait FileSource: Send + Sync {
    /// Metadata for `path`, or [`SourceError::NotFound`].
    fn stat(&self, path: &Path) -> Result<EntryMeta, SourceError>;

    /// Immediate children of the directory at `path`.
    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, SourceError>;

    /// Full contents of the file at `path`.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, SourceError>;
}
