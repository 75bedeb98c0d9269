//! Mapping user-supplied filesystem paths to index paths.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::GitError;

/// Resolve `path` (relative to the current directory, or absolute) to the
/// `/`-separated form git stores in the index, relative to `workdir`.
///
/// `workdir` must already be canonical. The file itself need not exist: on
/// the side that deleted it there is nothing on disk.
pub(crate) fn repo_relative(workdir: &Path, path: &Path) -> Result<String, GitError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let absolute = canonicalize_lenient(&absolute)?;

    let outside = || GitError::OutsideWorkdir {
        path: path.to_path_buf(),
        workdir: workdir.to_path_buf(),
    };
    let relative = absolute.strip_prefix(workdir).map_err(|_| outside())?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return Err(outside());
    }
    Ok(parts.join("/"))
}

/// Canonicalize `path`, tolerating a missing final component (or several).
pub(crate) fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return Err(e);
            };
            Ok(canonicalize_lenient(parent)?.join(name))
        }
        Err(e) => Err(e),
    }
}
