//! Recursive listing of every file under a root.

use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::FileSource;

/// Collects every file reachable from `root`, recursing into subdirectories.
///
/// Entries are visited in name order so the result is stable across runs and
/// sources. Fails if `root` itself cannot be accessed; children whose metadata
/// cannot be retrieved (e.g. dangling symlinks) are skipped.
pub fn walk_files(source: &dyn FileSource, root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let meta = source.stat(root)?;
    let mut out = Vec::new();
    if meta.is_dir {
        collect(source, root, &mut out)?;
    } else {
        out.push(root.to_path_buf());
    }
    Ok(out)
}

fn collect(source: &dyn FileSource, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SourceError> {
    let mut entries = source.list_entries(dir)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    for entry in entries {
        let path = dir.join(&entry.name);
        let meta = match source.stat(&path) {
            Ok(meta) => meta,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "skipping entry without metadata");
                continue;
            }
        };
        if meta.is_dir {
            collect(source, &path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
