//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while running a build goal.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A generated file would overwrite an existing one.
    #[error("Function already exists at {}. Please specify a different function name.", path.display())]
    FunctionExists { path: PathBuf },

    /// The build artifact to stage is missing.
    #[error("Cannot find the build artifact at {}, please build the project first.", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// A descriptor could not be (de)serialized.
    #[error("Cannot process {file}: {reason}")]
    Serialization { file: String, reason: String },

    /// Source scanning failed.
    #[error("Cannot scan {}: {reason}", path.display())]
    ScanFailed { path: PathBuf, reason: String },

    /// The user closed standard input while a value was still required.
    #[error("Input closed before '{field}' was provided")]
    InputClosed { field: String },

    /// An external tool is not installed.
    #[error("Required command '{command}' was not found on PATH")]
    CommandNotFound { command: String },

    /// An external tool exited unsuccessfully.
    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::FunctionExists { path } => vec![
                format!("A class already exists at {}", path.display()),
                "Choose a different function name with --function-name".into(),
            ],
            Self::ArtifactNotFound { .. } => vec![
                "Build the project jar first (e.g. mvn package)".into(),
                "Or pass --final-name matching the built jar name".into(),
            ],
            Self::InputClosed { field } => vec![
                format!("Provide '{}' on the command line", field),
                "Or run with --batch to avoid prompts".into(),
            ],
            Self::CommandNotFound { command } => vec![
                format!("Install '{}' and make sure it is on your PATH", command),
                "Or pass --skip-install-extensions".into(),
            ],
            Self::CommandFailed { .. } => {
                vec!["Check the command output above for details".into()]
            }
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FunctionExists { .. } | Self::InputClosed { .. } => ErrorCategory::Validation,
            Self::ArtifactNotFound { .. } => ErrorCategory::NotFound,
            Self::CommandNotFound { .. } => ErrorCategory::Configuration,
            Self::FilesystemError { .. }
            | Self::Serialization { .. }
            | Self::ScanFailed { .. }
            | Self::CommandFailed { .. } => ErrorCategory::Internal,
        }
    }
}
