//! In-memory [`FileSource`].
//!
//! Useful for templates baked into the binary:
//!
//! ```rust
//! use stencil_source::MemorySource;
//!
//! let source = MemorySource::new()
//!     .with_file("index.html", "<h1>{{ title }}</h1>")
//!     .with_file("layouts/app.html", "<html>{{ body }}</html>");
//! assert_eq!(source.len(), 2);
//! ```
//!
//! Paths are rooted at `/`; `"layouts/app.html"` and `"/layouts/app.html"`
//! address the same file. Directories exist implicitly as ancestors of files.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::SourceError;
use crate::{DirEntry, EntryMeta, FileSource};

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

/// `/` followed by the normal components of `path`; `.`/`..`/prefixes dropped.
fn key(path: &Path) -> PathBuf {
    let mut k = PathBuf::from("/");
    for component in path.components() {
        if let Component::Normal(part) = component {
            k.push(part);
        }
    }
    k
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the file at `path`.
    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.files.insert(key(path.as_ref()), contents.into());
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Removes the file at `path`, returning its contents.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.remove(&key(path.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn is_dir(&self, k: &Path) -> bool {
        k.parent().is_none() || self.files.keys().any(|f| f != k && f.starts_with(k))
    }
}

impl<P: AsRef<Path>, C: Into<Vec<u8>>> FromIterator<(P, C)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut source = MemorySource::new();
        for (path, contents) in iter {
            source.insert(path, contents);
        }
        source
    }
}

impl FileSource for MemorySource {
    fn stat(&self, path: &Path) -> Result<EntryMeta, SourceError> {
        let k = key(path);
        if let Some(contents) = self.files.get(&k) {
            return Ok(EntryMeta { is_dir: false, len: contents.len() as u64 });
        }
        if self.is_dir(&k) {
            return Ok(EntryMeta { is_dir: true, len: 0 });
        }
        Err(SourceError::NotFound { path: path.to_path_buf() })
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, SourceError> {
        let dir = key(path);
        if self.files.contains_key(&dir) {
            return Err(SourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("not a directory"),
            });
        }
        if !self.is_dir(&dir) {
            return Err(SourceError::NotFound { path: path.to_path_buf() });
        }

        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        for file in self.files.keys() {
            let Ok(rel) = file.strip_prefix(&dir) else { continue };
            let mut parts = rel.components();
            let Some(first) = parts.next() else { continue };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let nested = parts.next().is_some();
            *children.entry(name).or_insert(false) |= nested;
        }
        Ok(children
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, SourceError> {
        self.files
            .get(&key(path))
            .cloned()
            .ok_or_else(|| SourceError::NotFound { path: path.to_path_buf() })
    }
}
