//! [`FileSource`] backed by `std::fs`.

use std::path::Path;

use crate::error::{io_err, SourceError};
use crate::{DirEntry, EntryMeta, FileSource};

/// The operating system's file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSource;

impl FileSource for OsSource {
    fn stat(&self, path: &Path) -> Result<EntryMeta, SourceError> {
        let meta = std::fs::metadata(path).map_err(|e| io_err(path, e))?;
        Ok(EntryMeta {
            is_dir: meta.is_dir(),
            len: if meta.is_dir() { 0 } else { meta.len() },
        })
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, SourceError> {
        let entries = std::fs::read_dir(path).map_err(|e| io_err(path, e))?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(path, e))?;
            // Follow symlinks the same way `stat` does; broken links are
            // reported as files and skipped later when `stat` fails.
            let is_dir = std::fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false);
            out.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        Ok(out)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, SourceError> {
        std::fs::read(path).map_err(|e| io_err(path, e))
    }
}
