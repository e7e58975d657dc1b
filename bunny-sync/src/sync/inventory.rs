use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use super::paths::{PathError, ancestors, relative_path};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("source {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot read source {path}: {source}")]
    Root { path: PathBuf, source: io::Error },
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("path error: {0}")]
    Path(#[from] PathError),
    #[error("inventory task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Every file below a source root, plus every directory that holds one.
///
/// Paths are relative to the root, use `/` separators and carry no leading
/// or trailing slash. For every file, all of its proper ancestors are in
/// `dirs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl LocalInventory {
    /// Walks `root` on the blocking pool. Symlinks are followed. Any
    /// unreadable entry fails the whole scan.
    pub async fn scan(root: &Path) -> Result<Self, InventoryError> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::walk(&root)).await?
    }

    fn walk(root: &Path) -> Result<Self, InventoryError> {
        let metadata = std::fs::metadata(root).map_err(|source| InventoryError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(InventoryError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(relative_path(root, entry.path())?);
            }
        }

        let inventory = Self::from_files(files);
        debug!(
            root = %root.display(),
            files = inventory.files.len(),
            dirs = inventory.dirs.len(),
            "scanned source tree"
        );
        Ok(inventory)
    }

    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inventory = Self::default();
        for file in files {
            let file = file
                .as_ref()
                .split('/')
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("/");
            if file.is_empty() {
                continue;
            }
            for dir in ancestors(&file) {
                // Ancestors of a known dir are already present.
                if !inventory.dirs.insert(dir.to_string()) {
                    break;
                }
            }
            inventory.files.insert(file);
        }
        inventory
    }

    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    pub fn dirs(&self) -> &BTreeSet<String> {
        &self.dirs
    }

    pub fn contains_file(&self, relative: &str) -> bool {
        self.files.contains(relative)
    }

    pub fn contains_dir(&self, relative: &str) -> bool {
        self.dirs.contains(relative)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn scan_collects_files_and_ancestor_dirs() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", b"a");
        write(dir.path(), "b/c.txt", b"c");
        write(dir.path(), "b/d/e/f.txt", b"f");
        write(dir.path(), ".well-known/security.txt", b"s");
        std::fs::create_dir_all(dir.path().join("empty/inner")).unwrap();

        let inventory = LocalInventory::scan(dir.path()).await.unwrap();

        let files: Vec<_> = inventory.files().iter().map(String::as_str).collect();
        assert_eq!(
            files,
            vec![".well-known/security.txt", "a.txt", "b/c.txt", "b/d/e/f.txt"]
        );
        let dirs: Vec<_> = inventory.dirs().iter().map(String::as_str).collect();
        assert_eq!(dirs, vec![".well-known", "b", "b/d", "b/d/e"]);
    }

    #[tokio::test]
    async fn every_ancestor_of_every_file_is_a_dir() {
        let dir = tempdir().unwrap();
        for rel in ["x/y/z/1.bin", "x/2.bin", "q/r/3.bin", "4.bin"] {
            write(dir.path(), rel, b"data");
        }

        let inventory = LocalInventory::scan(dir.path()).await.unwrap();

        assert_eq!(inventory.len(), 4);
        for file in inventory.files() {
            for dir in ancestors(file) {
                assert!(inventory.contains_dir(dir), "missing {dir} for {file}");
            }
        }
    }

    #[tokio::test]
    async fn missing_root_fails() {
        let dir = tempdir().unwrap();
        let err = LocalInventory::scan(&dir.path().join("nope"))
            .await
            .expect_err("expected missing root error");
        assert!(matches!(err, InventoryError::Root { .. }));
    }

    #[tokio::test]
    async fn file_root_is_rejected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "plain.txt", b"x");
        let err = LocalInventory::scan(&dir.path().join("plain.txt"))
            .await
            .expect_err("expected not-a-directory error");
        assert!(matches!(err, InventoryError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn follows_symlinked_directories() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        write(outside.path(), "shared/logo.svg", b"<svg/>");
        write(dir.path(), "index.html", b"<html/>");
        std::os::unix::fs::symlink(outside.path().join("shared"), dir.path().join("img")).unwrap();

        let inventory = LocalInventory::scan(dir.path()).await.unwrap();

        assert!(inventory.contains_file("img/logo.svg"));
        assert!(inventory.contains_dir("img"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_fails_the_scan() {
        let dir = tempdir().unwrap();
        write(dir.path(), "index.html", b"<html/>");
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("broken")).unwrap();

        let err = LocalInventory::scan(dir.path())
            .await
            .expect_err("expected walk error");
        assert!(matches!(err, InventoryError::Walk(_)));
    }

    #[test]
    fn from_files_normalizes_slashes() {
        let inventory = LocalInventory::from_files(["/a/b.txt", "c.txt", ""]);
        assert!(inventory.contains_file("a/b.txt"));
        assert!(inventory.contains_file("c.txt"));
        assert!(inventory.contains_dir("a"));
        assert_eq!(inventory.len(), 2);
    }

    #[test]
    fn from_files_collapses_inner_slashes() {
        let inventory = LocalInventory::from_files(["a//b.txt", "x///y//z.txt/", "//"]);
        let files: Vec<_> = inventory.files().iter().map(String::as_str).collect();
        assert_eq!(files, vec!["a/b.txt", "x/y/z.txt"]);
        let dirs: Vec<_> = inventory.dirs().iter().map(String::as_str).collect();
        assert_eq!(dirs, vec!["a", "x", "x/y"]);
    }
}
