//! The transient on-disk object database.
//!
//! A [`TransientStore`] is a uniquely named directory that exists for exactly
//! as long as the value does. Dropping it removes the directory; `close`
//! does the same but reports failures.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::git::error::GitResult;

const PREFIX: &str = "gitshadow-";
const SUFFIX: &str = ".git";

/// An exclusively owned temporary directory.
#[derive(Debug)]
pub struct TransientStore {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl TransientStore {
    /// Allocate a fresh directory under `parent` (system temp root if None).
    ///
    /// The directory is created exclusively: if something already sits at a
    /// candidate name another name is drawn, so stale content is never
    /// reused.
    pub fn allocate(parent: Option<&Path>) -> GitResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX).suffix(SUFFIX);

        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "allocated transient store");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// get the store path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now, reporting any error.
    pub fn close(mut self) -> GitResult<()> {
        if let Some(dir) = self.dir.take() {
            dir.close()?;
            debug!(path = %self.path.display(), "removed transient store");
        }
        Ok(())
    }
}

impl Drop for TransientStore {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(path = %self.path.display(), error = %e, "failed to remove transient store");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_in_parent() {
        let parent = TempDir::new().unwrap();
        let store = TransientStore::allocate(Some(parent.path())).unwrap();

        assert!(store.path().is_dir());
        assert!(store.path().starts_with(parent.path()));

        let name = store.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(PREFIX));
        assert!(name.ends_with(SUFFIX));
    }

    #[test]
    fn test_paths_are_unique() {
        let parent = TempDir::new().unwrap();
        let a = TransientStore::allocate(Some(parent.path())).unwrap();
        let b = TransientStore::allocate(Some(parent.path())).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_drop_removes_directory() {
        let parent = TempDir::new().unwrap();
        let store = TransientStore::allocate(Some(parent.path())).unwrap();
        let path = store.path().to_path_buf();
        std::fs::write(path.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        drop(store);
        assert!(!path.exists());
    }

    #[test]
    fn test_close_removes_directory() {
        let store = TransientStore::allocate(None).unwrap();
        let path = store.path().to_path_buf();
        std::fs::create_dir_all(path.join("objects/pack")).unwrap();

        store.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_parent_fails() {
        let parent = TempDir::new().unwrap();
        let missing = parent.path().join("does-not-exist");
        assert!(TransientStore::allocate(Some(&missing)).is_err());
    }
}
