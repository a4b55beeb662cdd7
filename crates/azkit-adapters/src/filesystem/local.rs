//! Local filesystem adapter using std::fs.

use std::io;
use std::path::{Path, PathBuf};

use azkit_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{AzkitError, AzkitResult},
};
use tracing::debug;

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> AzkitResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> AzkitResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_to_string(&self, path: &Path) -> AzkitResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> AzkitResult<()> {
        std::fs::copy(from, to)
            .map(|bytes| debug!(from = %from.display(), to = %to.display(), bytes, "Copied file"))
            .map_err(|e| map_io_error(from, e, "copy file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn clean_dir(&self, path: &Path) -> AzkitResult<()> {
        let entries = std::fs::read_dir(path).map_err(|e| map_io_error(path, e, "read directory"))?;
        for entry in entries {
            let entry = entry.map_err(|e| map_io_error(path, e, "read directory"))?;
            let child = entry.path();
            let removed = if child.is_dir() {
                std::fs::remove_dir_all(&child)
            } else {
                std::fs::remove_file(&child)
            };
            removed.map_err(|e| map_io_error(&child, e, "remove"))?;
        }
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> AzkitResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| map_io_error(dir, e, "read directory"))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| map_io_error(dir, e, "read directory"))?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> AzkitError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {operation}: {e}"),
    }
    .into()
}
