use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path is outside the source root: {0}")]
    OutsideRoot(PathBuf),
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8(PathBuf),
    #[error("path contains unsupported component: {0}")]
    UnsupportedComponent(PathBuf),
}

/// Converts `path` (below `root`) into a forward-slash relative path with no
/// leading or trailing slash.
pub fn relative_path(root: &Path, path: &Path) -> Result<String, PathError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| PathError::OutsideRoot(path.to_path_buf()))?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| PathError::NonUtf8(path.to_path_buf()))?;
                parts.push(part);
            }
            Component::CurDir => continue,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::UnsupportedComponent(path.to_path_buf()));
            }
        }
    }
    Ok(parts.join("/"))
}

/// Joins a remote directory key with a relative path. Slashes around the
/// seam collapse; `.` and `..` segments are left as they are.
pub fn join_key(base: &str, relative: &str) -> String {
    let base = base.trim_matches('/');
    let relative = relative.trim_matches('/');
    match (base.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{relative}"),
    }
}

/// Proper ancestors of a relative path, nearest first.
pub fn ancestors(relative: &str) -> impl Iterator<Item = &str> {
    relative
        .match_indices('/')
        .rev()
        .map(move |(idx, _)| &relative[..idx])
        .filter(|ancestor| !ancestor.is_empty())
}
