//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use azkit_core::{
    application::{ApplicationError, ports::Filesystem},
    error::AzkitResult,
};
use parking_lot::RwLock;

/// In-memory filesystem for testing. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
}

impl MemoryFilesystemInner {
    fn add_dirs(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories (testing helper).
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        let mut inner = self.inner.write();
        if let Some(parent) = path.parent() {
            inner.add_dirs(parent);
        }
        inner.files.insert(path.to_path_buf(), content.into());
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.inner.read().files.get(path.as_ref()).cloned()
    }

    /// Every file, sorted.
    pub fn all_files(&self) -> Vec<PathBuf> {
        self.inner.read().files.keys().cloned().collect()
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> AzkitResult<()> {
        self.inner.write().add_dirs(path);
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> AzkitResult<()> {
        let mut inner = self.inner.write();

        let orphaned = path
            .parent()
            .is_some_and(|p| !p.as_os_str().is_empty() && !inner.directories.contains(p));
        if orphaned {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Parent directory does not exist".into(),
            }
            .into());
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> AzkitResult<String> {
        self.read_file(path).ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file".into(),
            }
            .into()
        })
    }

    fn copy_file(&self, from: &Path, to: &Path) -> AzkitResult<()> {
        let content = self.read_to_string(from)?;
        self.write_file(to, &content)
    }

    fn exists(&self, path: &Path) -> bool {
        let inner = self.inner.read();
        inner.files.contains_key(path) || inner.directories.contains(path)
    }

    fn clean_dir(&self, path: &Path) -> AzkitResult<()> {
        let mut inner = self.inner.write();
        inner.files.retain(|p, _| !p.starts_with(path));
        inner
            .directories
            .retain(|p| p == path || !p.starts_with(path));
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> AzkitResult<Vec<PathBuf>> {
        Ok(self
            .inner
            .read()
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}
