//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `azkit-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::domain::{Binding, BindingTemplate, FunctionTemplate};
use crate::error::AzkitResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `azkit_adapters::filesystem::LocalFilesystem` (production)
/// - `azkit_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> AzkitResult<()>;

    /// Write content to a file, replacing it if present.
    fn write_file(&self, path: &Path, content: &str) -> AzkitResult<()>;

    /// Read a whole UTF-8 file.
    fn read_to_string(&self, path: &Path) -> AzkitResult<String>;

    /// Copy one file to `to`, creating nothing but the file itself.
    fn copy_file(&self, from: &Path, to: &Path) -> AzkitResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Remove everything inside a directory but keep the directory.
    fn clean_dir(&self, path: &Path) -> AzkitResult<()>;

    /// Regular files directly inside `dir`, sorted by path.
    fn list_files(&self, dir: &Path) -> AzkitResult<Vec<PathBuf>>;
}

/// Port for the function template catalogue.
#[cfg_attr(test, mockall::automock)]
pub trait FunctionTemplateStore: Send + Sync {
    /// All known function templates.
    fn list(&self) -> AzkitResult<Vec<FunctionTemplate>>;

    /// Prompt metadata for a binding type such as `httpTrigger`.
    fn binding_template(&self, binding_type: &str) -> AzkitResult<Option<BindingTemplate>>;
}

/// Port for line-oriented user interaction.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    /// Show a line of text.
    fn message(&self, text: &str) -> AzkitResult<()>;

    /// Show `prompt` and read one line. `None` means input is closed.
    fn read_line(&self, prompt: &str) -> AzkitResult<Option<String>>;
}

/// Severity of a user-facing progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for user-facing progress messages.
pub trait Messager: Send + Sync {
    fn show(&self, level: MessageLevel, message: &str);

    fn info(&self, message: &str) {
        self.show(MessageLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.show(MessageLevel::Success, message);
    }

    fn warning(&self, message: &str) {
        self.show(MessageLevel::Warning, message);
    }
}

/// A method carrying `@FunctionName`, with the bindings found on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFunction {
    pub name: String,
    /// `package.Class.method`
    pub entry_point: String,
    pub bindings: Vec<Binding>,
    /// Whether the method returns a value (and so can feed `$return`).
    pub returns_value: bool,
}

/// Port for discovering function entry points in a project.
#[cfg_attr(test, mockall::automock)]
pub trait FunctionScanner: Send + Sync {
    fn find_functions(&self, root: &Path) -> AzkitResult<Vec<AnnotatedFunction>>;
}

/// Port for installing binding extensions into a staging directory.
#[cfg_attr(test, mockall::automock)]
pub trait ExtensionInstaller: Send + Sync {
    fn install(&self, staging_dir: &Path, base_dir: &Path) -> AzkitResult<()>;
}
